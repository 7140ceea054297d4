//! # docqa-rag
//!
//! Retrieval-augmented question answering over ingested documents.
//!
//! ## Overview
//!
//! Ingestion turns files into [`Record`]s: an [`Extractor`] yields text and
//! images per page, a [`Chunker`] splits the text into bounded fragments,
//! [`build_text_records`] / [`build_image_records`] attach `{source, page,
//! type}` metadata, and the records are added to an [`Index`].
//!
//! Answering runs the other way: the [`QueryPipeline`] retrieves ranked
//! records, the [`ContextAssembler`] builds prompt text, attaches up to
//! `max_images` distinct images and picks the text-only or image-capable
//! model, the [`AnswerGenerator`] calls the [`LanguageModel`], and
//! [`format_references`] renders one text citation and one image citation.
//!
//! ## Feature flags
//!
//! - `openai` (default): [`OpenAIEmbeddingProvider`](openai::OpenAIEmbeddingProvider)
//!
//! [`LanguageModel`]: docqa_model::LanguageModel

pub mod answer;
pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod image;
pub mod index;
pub mod ingest;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod record;
pub mod references;

pub use answer::{ANSWER_SYSTEM_PROMPT, AnswerGenerator, NO_RELEVANT_ANSWER};
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, split};
pub use config::{ModelSettings, RagConfig, RagConfigBuilder};
pub use context::ContextAssembler;
pub use document::{
    Answer, AnswerContext, Record, RecordKind, RecordMetadata, ReferenceSet, SourceRef,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extract::{ExtractedDocument, ExtractedImage, ExtractedPage, Extractor};
pub use image::{Base64ImageCodec, ImageCodec};
pub use index::{Index, SearchMode};
pub use ingest::{
    DEFAULT_IMAGE_DIR, IMAGE_SUMMARY_PROMPT, IngestSummary, IngestionPipeline,
    IngestionPipelineBuilder,
};
pub use inmemory::InMemoryIndex;
#[cfg(feature = "openai")]
pub use openai::{DEFAULT_EMBEDDING_MODEL, OpenAIEmbeddingProvider};
pub use pipeline::{QueryPipeline, QueryPipelineBuilder};
pub use record::{build_image_records, build_text_records};
pub use references::format_references;
