//! OpenAI embeddings, behind the `openai` feature.
//!
//! Large batches are sent in slices of at most [`MAX_INPUTS_PER_REQUEST`]
//! texts, and the returned vectors are put back in input order using the
//! `index` field of each result.

use async_trait::async_trait;
use docqa_model::openai::{OPENAI_API_BASE, error_detail};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The model used unless [`OpenAIEmbeddingProvider::with_model`] says otherwise.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// The embeddings endpoint accepts at most this many inputs per call.
pub const MAX_INPUTS_PER_REQUEST: usize = 2048;

const PROVIDER: &str = "OpenAI";

/// Native vector size of the published OpenAI embedding models.
fn native_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// An [`EmbeddingProvider`] for the OpenAI embeddings API.
///
/// ```rust,ignore
/// let provider = OpenAIEmbeddingProvider::from_env()?.with_model("text-embedding-3-large");
/// let index = InMemoryIndex::new(Arc::new(provider));
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    /// Requested output size; `None` keeps the model's native size.
    truncate_to: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider for [`DEFAULT_EMBEDDING_MODEL`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(embedding_error("API key must not be empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            truncate_to: None,
        })
    }

    /// Create a provider from the `OPENAI_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| embedding_error("OPENAI_API_KEY environment variable not set".into()))?;
        Self::new(api_key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Ask the API for shorter vectors (`text-embedding-3-*` only).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.truncate_to = Some(dims);
        self
    }

    /// Point the provider at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body =
            EmbeddingRequest { model: &self.model, input: texts, dimensions: self.truncate_to };
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "embedding request failed");
                embedding_error(format!("request failed: {e}"))
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            error!(provider = PROVIDER, %status, "embedding API error");
            return Err(embedding_error(format!("API returned {status}: {}", error_detail(text))));
        }
        parse_embeddings(&text, texts.len())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

fn embedding_error(message: String) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.into(), message }
}

/// Decode a response body into exactly `expected` vectors in input order.
fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut response: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| embedding_error(format!("failed to parse response: {e}")))?;
    if response.data.len() != expected {
        return Err(embedding_error(format!(
            "expected {expected} embeddings, got {}",
            response.data.len()
        )));
    }
    response.data.sort_by_key(|d| d.index);
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text]).await?;
        vectors.pop().ok_or_else(|| embedding_error("API returned no embedding".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for slice in texts.chunks(MAX_INPUTS_PER_REQUEST) {
            debug!(
                provider = PROVIDER,
                model = %self.model,
                batch_size = slice.len(),
                "embedding batch"
            );
            vectors.extend(self.request(slice).await?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.truncate_to.unwrap_or_else(|| native_dimensions(&self.model))
    }
}
