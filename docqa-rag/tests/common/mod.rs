#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_rag::{
    EmbeddingProvider, ExtractedDocument, ExtractedPage, Extractor, Index, RagError, Record,
    ExtractedImage, RecordKind, RecordMetadata, Result, SearchMode,
};
use tokio::sync::Mutex;

pub const TEXT_MODEL: &str = "text-model";
pub const IMAGE_MODEL: &str = "vision-model";

pub fn text_record(content: &str, source: &str, page: u32) -> Record {
    Record {
        content: content.to_string(),
        metadata: RecordMetadata { source: source.into(), page, kind: RecordKind::Text },
    }
}

pub fn image_record(content: &str, source: &str, page: u32, path: impl Into<PathBuf>) -> Record {
    Record {
        content: content.to_string(),
        metadata: RecordMetadata {
            source: source.into(),
            page,
            kind: RecordKind::Image { image_path: path.into() },
        },
    }
}

/// Embeds text as keyword counts over a tiny fixed vocabulary.
pub struct KeywordEmbedder;

pub const VOCABULARY: [&str; 4] = ["cat", "dog", "car", "tree"];

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(VOCABULARY.iter().map(|word| lower.matches(word).count() as f32).collect())
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }
}

/// Stores added records and answers every retrieval with a fixed list.
#[derive(Default)]
pub struct RecordingIndex {
    pub added: Mutex<Vec<Record>>,
    pub canned: Vec<Record>,
    pub retrieve_calls: AtomicUsize,
    pub fail_retrieve: bool,
    /// Records whose content contains this marker are rejected by `add`.
    pub reject_marker: Option<&'static str>,
}

impl RecordingIndex {
    pub fn returning(canned: Vec<Record>) -> Self {
        Self { canned, ..Default::default() }
    }

    pub fn failing() -> Self {
        Self { fail_retrieve: true, ..Default::default() }
    }

    pub fn rejecting(marker: &'static str) -> Self {
        Self { reject_marker: Some(marker), ..Default::default() }
    }

    pub async fn added(&self) -> Vec<Record> {
        self.added.lock().await.clone()
    }

    pub fn retrieve_count(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Index for RecordingIndex {
    async fn add(&self, record: Record) -> Result<()> {
        if self.reject_marker.is_some_and(|marker| record.content.contains(marker)) {
            return Err(RagError::IndexError {
                backend: "Recording".into(),
                message: "write rejected".into(),
            });
        }
        self.added.lock().await.push(record);
        Ok(())
    }

    async fn retrieve(&self, _query: &str, top_k: usize, _mode: SearchMode) -> Result<Vec<Record>> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_retrieve {
            return Err(RagError::IndexError {
                backend: "Recording".into(),
                message: "connection refused".into(),
            });
        }
        Ok(self.canned.iter().take(top_k).cloned().collect())
    }
}

/// Reads `.txt`-like files as one page; files named `broken.*` fail.
pub struct PlainExtractor;

#[async_trait]
impl Extractor for PlainExtractor {
    fn name(&self) -> &str {
        "plain"
    }

    fn extensions(&self) -> &[&str] {
        &["txt"]
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        if path.file_stem().is_some_and(|stem| stem == "broken") {
            return Err(RagError::ExtractionError {
                format: "plain".into(),
                message: "corrupt file".into(),
            });
        }
        let text = tokio::fs::read_to_string(path).await?;
        Ok(ExtractedDocument { pages: vec![ExtractedPage::text(1, text)] })
    }
}

/// Returns a fixed document for any `.doc` file.
pub struct FixedExtractor(pub ExtractedDocument);

#[async_trait]
impl Extractor for FixedExtractor {
    fn name(&self) -> &str {
        "fixed"
    }

    fn extensions(&self) -> &[&str] {
        &["doc"]
    }

    async fn extract(&self, _path: &Path) -> Result<ExtractedDocument> {
        Ok(self.0.clone())
    }
}

/// Returns one image-only page whose image bytes are the file's contents.
pub struct EchoImageExtractor;

#[async_trait]
impl Extractor for EchoImageExtractor {
    fn name(&self) -> &str {
        "echo"
    }

    fn extensions(&self) -> &[&str] {
        &["doc"]
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let data = tokio::fs::read(path).await?;
        let image = ExtractedImage { data, extension: "png".into() };
        Ok(ExtractedDocument {
            pages: vec![ExtractedPage { number: 1, text: String::new(), images: vec![image] }],
        })
    }
}
