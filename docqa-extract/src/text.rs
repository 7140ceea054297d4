//! Plain-text files.

use std::path::Path;

use async_trait::async_trait;
use docqa_rag::{ExtractedDocument, ExtractedPage, Extractor, Result};
use tracing::debug;

use crate::{ensure_file, extraction_error, flatten_lines};

/// Reads a UTF-8 text file as a single page.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

#[async_trait]
impl Extractor for TextExtractor {
    fn name(&self) -> &str {
        "text"
    }

    fn extensions(&self) -> &[&str] {
        &["txt"]
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        ensure_file(path)?;
        let bytes = tokio::fs::read(path).await?;
        let content = String::from_utf8(bytes).map_err(|e| extraction_error(self.name(), e))?;
        debug!(file = %path.display(), chars = content.chars().count(), "read text file");
        Ok(ExtractedDocument { pages: vec![ExtractedPage::text(1, flatten_lines(&content))] })
    }
}
