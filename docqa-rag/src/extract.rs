//! Extractor capability: per-format text and image extraction.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// An image found inside a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Encoded image bytes (JPEG, PNG, ...).
    pub data: Vec<u8>,
    /// File extension matching `data`, without the dot.
    pub extension: String,
}

/// Text and images from one page (or row) of a source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// 1-based page or row index.
    pub number: u32,
    /// Extracted text; empty when the page has none.
    pub text: String,
    /// Images embedded on this page.
    pub images: Vec<ExtractedImage>,
}

impl ExtractedPage {
    /// A text-only page.
    pub fn text(number: u32, text: impl Into<String>) -> Self {
        Self { number, text: text.into(), images: Vec::new() }
    }
}

/// Everything extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Pages in document order.
    pub pages: Vec<ExtractedPage>,
}

impl ExtractedDocument {
    /// Total number of images across all pages.
    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|page| page.images.len()).sum()
    }
}

/// Reads one file format.
///
/// The ingestion pipeline picks the extractor whose
/// [`extensions`](Extractor::extensions) contain the file's lower-cased
/// extension.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short format label used in logs and errors.
    fn name(&self) -> &str;

    /// Lower-case file extensions (without the dot) this extractor handles.
    fn extensions(&self) -> &[&str];

    /// Extract text per page/row and embedded images.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`](crate::RagError::NotFound) if the file is
    /// missing, [`RagError::ExtractionError`](crate::RagError::ExtractionError)
    /// otherwise.
    async fn extract(&self, path: &Path) -> Result<ExtractedDocument>;

    /// Whether this extractor handles `path`, judged by extension.
    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions().contains(&ext.as_str()))
    }
}
