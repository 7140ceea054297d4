//! `config.json` handling.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docqa_rag::{DEFAULT_EMBEDDING_MODEL, DEFAULT_IMAGE_DIR, RagConfig, SearchMode};
use serde::{Deserialize, Serialize};

/// File read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub openai: OpenAiSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub chunking: ChunkingSettings,
}

/// Folder locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Folder scanned by `docqa ingest`.
    #[serde(default = "default_input_folder")]
    pub input_folder: PathBuf,
    /// Folder extracted images are written to.
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,
    /// Index snapshot written by `ingest` and read by `ask` and `chat`.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_folder: default_input_folder(),
            output_folder: default_output_folder(),
            index_path: default_index_path(),
        }
    }
}

fn default_input_folder() -> PathBuf {
    PathBuf::from("input_files")
}

fn default_output_folder() -> PathBuf {
    PathBuf::from(DEFAULT_IMAGE_DIR)
}

fn default_index_path() -> PathBuf {
    PathBuf::from("vector_db/index.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default = "default_text_model")]
    pub openai_only_text_model: String,
    #[serde(default = "default_image_model")]
    pub openai_text_image_model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Shorter vectors for `text-embedding-3-*`; unset keeps the model's size.
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            openai_only_text_model: default_text_model(),
            openai_text_image_model: default_image_model(),
            temperature: 0.0,
            embedding_model: default_embedding_model(),
            embedding_dimensions: None,
        }
    }
}

fn default_text_model() -> String {
    RagConfig::default().text_model
}

fn default_image_model() -> String {
    RagConfig::default().image_model
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// `similarity`, `similarity_score_threshold` or `mmr`.
    #[serde(default = "default_search_type")]
    pub search_type: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub score_threshold: f32,
    #[serde(default = "default_max_images")]
    pub max_images: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            search_type: default_search_type(),
            top_k: default_top_k(),
            score_threshold: 0.0,
            max_images: default_max_images(),
        }
    }
}

fn default_search_type() -> String {
    SearchMode::default().to_string()
}

fn default_top_k() -> usize {
    RagConfig::default().top_k
}

fn default_max_images() -> usize {
    RagConfig::default().max_images
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: default_chunk_size(), chunk_overlap: 0 }
    }
}

fn default_chunk_size() -> usize {
    RagConfig::default().chunk_size
}

impl AppConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_PATH`] when `path` is
    /// `None`. A missing default file yields the built-in defaults; a
    /// missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !explicit && !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// The validated pipeline configuration these settings describe.
    pub fn rag_config(&self) -> Result<RagConfig> {
        let search_mode: SearchMode = self.retrieval.search_type.parse()?;
        let config = RagConfig::builder()
            .chunk_size(self.chunking.chunk_size)
            .chunk_overlap(self.chunking.chunk_overlap)
            .top_k(self.retrieval.top_k)
            .search_mode(search_mode)
            .similarity_threshold(self.retrieval.score_threshold)
            .max_images(self.retrieval.max_images)
            .text_model(&self.openai.openai_only_text_model)
            .image_model(&self.openai.openai_text_image_model)
            .temperature(self.openai.temperature)
            .build()?;
        Ok(config)
    }
}
