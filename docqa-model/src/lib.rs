//! # docqa-model
//!
//! Language model integrations for DocQA.
//!
//! ## Overview
//!
//! The rest of the workspace only sees the [`LanguageModel`] trait: a single
//! `complete` call that takes a system prompt, user text, optional inline
//! images and a temperature, and returns the model's text. Implementations:
//!
//! - [`OpenAIClient`] - OpenAI chat completions (and OpenAI-compatible APIs)
//! - [`MockLlm`] - scripted model for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docqa_model::{CompletionRequest, LanguageModel, OpenAIClient};
//!
//! let client = OpenAIClient::from_env()?;
//! let request = CompletionRequest::new("gpt-4o", "You are helpful.", "Describe this chart.")
//!     .with_images(vec![encoded_png])
//!     .with_temperature(0.2);
//! let answer = client.complete(request).await?;
//! ```

pub mod error;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod request;

use async_trait::async_trait;

pub use error::{ModelError, Result};
pub use mock::MockLlm;
#[cfg(feature = "openai")]
pub use openai::OpenAIClient;
pub use request::CompletionRequest;

/// A chat model that turns one prompt into one text reply.
///
/// Images travel inline as base64 payloads; a backend that cannot accept
/// images should fail with [`ModelError::InvocationError`] rather than drop
/// them.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short provider label used in logs and errors.
    fn provider(&self) -> &str;

    /// Run one completion and return the reply text.
    ///
    /// Implementations return [`ModelError::EmptyResponse`] when the backend
    /// answers without any content.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
