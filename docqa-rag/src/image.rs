//! Image codec: turn an extracted image on disk into an inline payload.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::error::{RagError, Result};

/// Encodes image files into the portable form sent to the language model.
#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Read the image at `path` and return it base64-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if the file does not exist and
    /// [`RagError::IoError`] if it cannot be read.
    async fn encode(&self, path: &Path) -> Result<String>;
}

/// Standard-alphabet base64 encoding of the raw file bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64ImageCodec;

impl Base64ImageCodec {
    /// Encode bytes already in memory.
    pub fn encode_bytes(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }
}

#[async_trait]
impl ImageCodec for Base64ImageCodec {
    async fn encode(&self, path: &Path) -> Result<String> {
        if !tokio::fs::try_exists(path).await? {
            return Err(RagError::NotFound(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path).await?;
        debug!(image = %path.display(), bytes = bytes.len(), "encoded image");
        Ok(Self::encode_bytes(&bytes))
    }
}
