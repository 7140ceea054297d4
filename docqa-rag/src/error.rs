//! Error types for the `docqa-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// A caller-supplied argument was empty or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A file or resource does not exist.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A format extractor failed to read a file.
    #[error("Extraction error ({format}): {message}")]
    ExtractionError {
        /// The extractor that produced the error.
        format: String,
        /// A description of the failure.
        message: String,
    },

    /// No extractor is registered for the file's extension.
    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Reading or writing a local file failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the index backend.
    #[error("Index error ({backend}): {message}")]
    IndexError {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A model identifier matches neither configured model.
    #[error("Invalid model name: {0}")]
    InvalidModel(String),

    /// The language model call failed or returned nothing usable.
    #[error(transparent)]
    ModelInvocationError(#[from] docqa_model::ModelError),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
