//! OpenAI chat-completions client.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::request::CompletionRequest;
use crate::LanguageModel;

/// The default OpenAI API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "OpenAI";

/// A [`LanguageModel`] backed by the OpenAI `/chat/completions` endpoint.
///
/// The model identifier comes from each [`CompletionRequest`], so one client
/// serves both the text-only and the image-capable model. Images are sent as
/// `data:image/png;base64,...` URLs in the user message.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_model::OpenAIClient;
///
/// let client = OpenAIClient::new("sk-...")?;
/// // or, for an OpenAI-compatible server:
/// let local = OpenAIClient::new("unused")?.with_base_url("http://localhost:11434/v1");
/// ```
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a client with the given API key against the public OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ModelError::ConfigError("API key must not be empty".into()));
        }
        Ok(Self { client: reqwest::Client::new(), api_key, base_url: OPENAI_API_BASE.into() })
    }

    /// Create a client using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ModelError::ConfigError("OPENAI_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key)
    }

    /// Point the client at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// The human-readable message of an OpenAI error body, or the raw body when
/// it is not the usual `{"error": {"message": ...}}` shape.
pub fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

fn build_body(request: &CompletionRequest) -> ChatRequest<'_> {
    let mut parts = vec![ContentPart::Text { text: &request.user_text }];
    parts.extend(request.images.iter().map(|encoded| ContentPart::ImageUrl {
        image_url: ImageUrl { url: format!("data:image/png;base64,{encoded}") },
    }));

    ChatRequest {
        model: &request.model,
        messages: vec![
            ChatMessage { role: "system", content: MessageContent::Text(&request.system_prompt) },
            ChatMessage { role: "user", content: MessageContent::Parts(parts) },
        ],
        temperature: request.temperature,
    }
}

fn invocation_error(message: String) -> ModelError {
    ModelError::InvocationError { provider: PROVIDER.into(), message }
}

// ── LanguageModel implementation ───────────────────────────────────

#[async_trait]
impl LanguageModel for OpenAIClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        debug!(
            provider = PROVIDER,
            model = %request.model,
            image_count = request.images.len(),
            "requesting chat completion"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&build_body(&request))
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                invocation_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "API error");
            return Err(invocation_error(format!(
                "API returned {status}: {}",
                error_detail(body)
            )));
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            invocation_error(format!("failed to parse response: {e}"))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ModelError::EmptyResponse { provider: PROVIDER.into() })
    }
}
