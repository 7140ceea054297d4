//! Ingestion pipeline orchestrator.
//!
//! The [`IngestionPipeline`] turns files into indexed records: extract per
//! page → chunk → build records → add to the [`Index`]. Images found in a
//! document are saved to disk, summarised by the image-capable model, and
//! indexed as image records pointing at the saved file. Saved images are
//! named after the file's path relative to the ingested folder, so
//! same-named files in different subfolders keep separate images.
//!
//! A failure on one page, image or file is logged with the file name and
//! ingestion moves on; a batch always visits every file.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{IngestionPipeline, RagConfig};
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(RagConfig::default())
//!     .index(index.clone())
//!     .extractors(docqa_extract::default_extractors())
//!     .image_summarizer(Arc::new(OpenAIClient::from_env()?))
//!     .image_dir("extracted_images")
//!     .build()?;
//!
//! let summary = pipeline.ingest_directory("input").await?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_model::{CompletionRequest, LanguageModel};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::extract::{ExtractedImage, Extractor};
use crate::image::Base64ImageCodec;
use crate::index::Index;
use crate::record::{build_image_records, build_text_records};

/// System instruction used to summarise extracted images.
pub const IMAGE_SUMMARY_PROMPT: &str = "You are an expert image analyst. Your task is to analyze \
the provided image and generate a detailed summary.The summary should include key elements such \
as the main subjects, actions, context, and notable features of the image.This summary should be \
concise yet informative, making it suitable for retrieval when answering user questions related \
to the image.";

const IMAGE_SUMMARY_REQUEST: &str = "Here is an image for you to summarize:";

/// Default folder for images extracted during ingestion.
pub const DEFAULT_IMAGE_DIR: &str = "extracted_images";

/// Counts reported after a batch, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Files that were extracted and processed.
    pub files_ingested: usize,
    /// Files skipped because no extractor handles them.
    pub files_skipped: usize,
    /// Files whose extraction failed.
    pub files_failed: usize,
    /// Records added to the index.
    pub records_indexed: usize,
}

/// Files → extracted pages → chunks → records → index.
///
/// Construct one via [`IngestionPipeline::builder()`].
pub struct IngestionPipeline {
    config: RagConfig,
    index: Arc<dyn Index>,
    extractors: Vec<Arc<dyn Extractor>>,
    chunker: Arc<dyn Chunker>,
    summarizer: Option<Arc<dyn LanguageModel>>,
    image_dir: PathBuf,
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    fn extractor_for(&self, path: &Path) -> Option<&Arc<dyn Extractor>> {
        self.extractors.iter().find(|extractor| extractor.handles(path))
    }

    /// Ingest every file under `dir`, in file-name order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if `dir` does not exist. Per-file
    /// failures are logged and counted, never returned.
    pub async fn ingest_directory(&self, dir: impl AsRef<Path>) -> Result<IngestSummary> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            error!(folder = %dir.display(), "data folder does not exist");
            return Err(RagError::NotFound(dir.to_path_buf()));
        }

        let mut summary = IngestSummary::default();
        info!(folder = %dir.display(), "processing files");

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            match self.ingest_as(path, &image_stem(dir, path)).await {
                Ok(count) => {
                    summary.files_ingested += 1;
                    summary.records_indexed += count;
                }
                Err(RagError::UnsupportedFormat(_)) => {
                    warn!(file = %file_name(path), "unsupported file type");
                    summary.files_skipped += 1;
                }
                Err(e) => {
                    error!(file = %file_name(path), error = %e, "error processing file");
                    summary.files_failed += 1;
                }
            }
        }

        info!(
            files_ingested = summary.files_ingested,
            files_skipped = summary.files_skipped,
            files_failed = summary.files_failed,
            records_indexed = summary.records_indexed,
            "all files processed"
        );
        Ok(summary)
    }

    /// Ingest one file and return how many records were indexed.
    ///
    /// Pages and images that fail are logged and skipped.
    ///
    /// # Errors
    ///
    /// - [`RagError::NotFound`] if the file does not exist.
    /// - [`RagError::UnsupportedFormat`] if no extractor handles its extension.
    /// - Any extraction error from the extractor.
    pub async fn ingest_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        self.ingest_as(path, &file_name(path)).await
    }

    /// Ingest `path`, naming its saved images after `stem`.
    async fn ingest_as(&self, path: &Path, stem: &str) -> Result<usize> {
        if !path.is_file() {
            return Err(RagError::NotFound(path.to_path_buf()));
        }
        let extractor = self
            .extractor_for(path)
            .ok_or_else(|| RagError::UnsupportedFormat(path.to_path_buf()))?;

        let source = file_name(path);
        info!(file = %source, extractor = extractor.name(), "processing file");
        let document = extractor.extract(path).await?;

        let image_count = document.image_count();
        if image_count > 0 && self.summarizer.is_none() {
            warn!(file = %source, image_count, "no image summarizer configured, skipping images");
        }

        let mut indexed = 0;
        for page in &document.pages {
            if !page.text.trim().is_empty() {
                match self.index_text(&source, page.number, &page.text).await {
                    Ok(count) => indexed += count,
                    Err(e) => {
                        error!(
                            file = %source,
                            page = page.number,
                            error = %e,
                            "failed to index page text"
                        );
                    }
                }
            }

            let Some(summarizer) = &self.summarizer else {
                continue;
            };
            for (position, image) in page.images.iter().enumerate() {
                let indexed_image = self
                    .index_image(
                        summarizer.as_ref(),
                        &source,
                        stem,
                        page.number,
                        position + 1,
                        image,
                    )
                    .await;
                match indexed_image {
                    Ok(count) => indexed += count,
                    Err(e) => {
                        error!(
                            file = %source,
                            page = page.number,
                            image = position + 1,
                            error = %e,
                            "failed to index image"
                        );
                    }
                }
            }
        }

        info!(file = %source, pages = document.pages.len(), records = indexed, "file ingested");
        Ok(indexed)
    }

    async fn index_text(&self, source: &str, page: u32, text: &str) -> Result<usize> {
        let chunks = self.chunker.split(text)?;
        let records = build_text_records(&chunks, source, page)?;
        self.index.add_batch(&records).await?;
        debug!(file = source, page, records = records.len(), "indexed page text");
        Ok(records.len())
    }

    async fn index_image(
        &self,
        summarizer: &dyn LanguageModel,
        source: &str,
        stem: &str,
        page: u32,
        position: usize,
        image: &ExtractedImage,
    ) -> Result<usize> {
        tokio::fs::create_dir_all(&self.image_dir).await?;
        let image_path = self
            .image_dir
            .join(format!("{stem}_page_{page}_image_{position}.{}", image.extension));
        tokio::fs::write(&image_path, &image.data).await?;
        info!(image = %image_path.display(), "saved image");

        let request = CompletionRequest::new(
            &self.config.image_model,
            IMAGE_SUMMARY_PROMPT,
            IMAGE_SUMMARY_REQUEST,
        )
        .with_images(vec![Base64ImageCodec::encode_bytes(&image.data)])
        .with_temperature(self.config.temperature);
        let summary = summarizer.complete(request).await?;

        let chunks = self.chunker.split(&summary)?;
        let records = build_image_records(&chunks, &image_path, source, page)?;
        self.index.add_batch(&records).await?;
        debug!(image = %image_path.display(), records = records.len(), "indexed image summary");
        Ok(records.len())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `nested/deck.pdf` under `dir` becomes `nested_deck.pdf`.
fn image_stem(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    let parts: Vec<_> =
        relative.components().map(|part| part.as_os_str().to_string_lossy()).collect();
    if parts.is_empty() { file_name(path) } else { parts.join("_") }
}

/// Builder for constructing an [`IngestionPipeline`].
///
/// `config` and `index` are required. Without an explicit chunker, a
/// [`FixedSizeChunker`] is used when `chunk_overlap > 0` and a
/// [`RecursiveChunker`] otherwise. Without an image summarizer, extracted
/// images are skipped.
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    config: Option<RagConfig>,
    index: Option<Arc<dyn Index>>,
    extractors: Vec<Arc<dyn Extractor>>,
    chunker: Option<Arc<dyn Chunker>>,
    summarizer: Option<Arc<dyn LanguageModel>>,
    image_dir: Option<PathBuf>,
}

impl IngestionPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the index records are added to.
    pub fn index(mut self, index: Arc<dyn Index>) -> Self {
        self.index = Some(index);
        self
    }

    /// Register one extractor. Earlier registrations win on shared extensions.
    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Register several extractors.
    pub fn extractors(mut self, extractors: impl IntoIterator<Item = Arc<dyn Extractor>>) -> Self {
        self.extractors.extend(extractors);
        self
    }

    /// Override the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the model used to summarise extracted images.
    pub fn image_summarizer(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.summarizer = Some(model);
        self
    }

    /// Set the folder extracted images are written to.
    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }

    /// Build the [`IngestionPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `config` or `index` is missing,
    /// no extractor is registered, or the configuration is inconsistent.
    pub fn build(self) -> Result<IngestionPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::InvalidConfig("config is required".to_string()))?;
        config.validate()?;
        let index =
            self.index.ok_or_else(|| RagError::InvalidConfig("index is required".to_string()))?;
        if self.extractors.is_empty() {
            return Err(RagError::InvalidConfig("at least one extractor is required".to_string()));
        }
        let chunker = self.chunker.unwrap_or_else(|| -> Arc<dyn Chunker> {
            if config.chunk_overlap > 0 {
                Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap))
            } else {
                Arc::new(RecursiveChunker::new(config.chunk_size))
            }
        });

        Ok(IngestionPipeline {
            config,
            index,
            extractors: self.extractors,
            chunker,
            summarizer: self.summarizer,
            image_dir: self.image_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR)),
        })
    }
}
