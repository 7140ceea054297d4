//! Error types for the `docqa-model` crate.

use thiserror::Error;

/// Errors raised by a [`LanguageModel`](crate::LanguageModel) backend.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The backend call failed (transport, HTTP status, or decoding).
    #[error("Model invocation error ({provider}): {message}")]
    InvocationError {
        /// The provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The backend replied but the reply carried no text.
    #[error("Model returned an empty response ({provider})")]
    EmptyResponse {
        /// The provider that produced the empty reply.
        provider: String,
    },

    /// The client could not be constructed from the given settings.
    #[error("Model configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
