//! Scripted language model for tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{ModelError, Result};
use crate::request::CompletionRequest;
use crate::LanguageModel;

#[derive(Debug, Clone)]
enum Behavior {
    Reply(String),
    Fail(String),
}

/// A [`LanguageModel`] that returns a fixed reply (or a fixed failure) and
/// records every request it receives.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_model::{LanguageModel, MockLlm};
///
/// let llm = MockLlm::new("42");
/// let reply = llm.complete(request).await?;
/// assert_eq!(llm.call_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockLlm {
    behavior: Behavior,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    /// A model that always answers `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self { behavior: Behavior::Reply(reply.into()), calls: Mutex::new(Vec::new()) }
    }

    /// A model whose every call fails with [`ModelError::InvocationError`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self { behavior: Behavior::Fail(message.into()), calls: Mutex::new(Vec::new()) }
    }

    /// Requests received so far, oldest first.
    pub async fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().await.clone()
    }

    /// Number of requests received so far.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl LanguageModel for MockLlm {
    fn provider(&self) -> &str {
        "Mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.calls.lock().await.push(request);
        match &self.behavior {
            Behavior::Reply(reply) if reply.trim().is_empty() => {
                Err(ModelError::EmptyResponse { provider: "Mock".into() })
            }
            Behavior::Reply(reply) => Ok(reply.clone()),
            Behavior::Fail(message) => Err(ModelError::InvocationError {
                provider: "Mock".into(),
                message: message.clone(),
            }),
        }
    }
}
