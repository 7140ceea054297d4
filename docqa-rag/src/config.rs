//! Configuration for ingestion and question answering.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::index::SearchMode;

/// Configuration parameters shared by the ingestion and query pipelines.
///
/// Components copy the values they need at construction time; nothing reads
/// configuration from global state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of records requested from the index per question.
    pub top_k: usize,
    /// How the index ranks candidate records.
    pub search_mode: SearchMode,
    /// Minimum similarity score used by [`SearchMode::SimilarityScoreThreshold`].
    pub similarity_threshold: f32,
    /// Maximum number of images attached to one answer.
    pub max_images: usize,
    /// Model used when the prompt carries no images.
    pub text_model: String,
    /// Model used as soon as any image is included.
    pub image_model: String,
    /// Sampling temperature for answers and image summaries.
    pub temperature: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 0,
            top_k: 5,
            search_mode: SearchMode::Similarity,
            similarity_threshold: 0.0,
            max_images: 3,
            text_model: "gpt-3.5-turbo".to_string(),
            image_model: "gpt-4o".to_string(),
            temperature: 0.0,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// The model pair and temperature used by answer generation.
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            text_model: self.text_model.clone(),
            image_model: self.image_model.clone(),
            temperature: self.temperature,
        }
    }

    /// Check that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - either model identifier is empty, or both are the same
    /// - `temperature` is outside `0.0..=2.0`
    /// - `similarity_threshold` is outside `0.0..=1.0`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidConfig("chunk_size must be greater than zero".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::InvalidConfig("top_k must be greater than zero".to_string()));
        }
        if self.text_model.trim().is_empty() || self.image_model.trim().is_empty() {
            return Err(RagError::InvalidConfig("model identifiers must not be empty".into()));
        }
        if self.text_model == self.image_model {
            return Err(RagError::InvalidConfig(format!(
                "text_model and image_model must differ (both are '{}')",
                self.text_model
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::InvalidConfig(format!(
                "temperature ({}) must be within 0.0..=2.0",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RagError::InvalidConfig(format!(
                "similarity_threshold ({}) must be within 0.0..=1.0",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// Model identifiers and temperature handed to the answer generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSettings {
    /// Model used when the prompt carries no images.
    pub text_model: String,
    /// Model used when the prompt carries images.
    pub image_model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of records retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the retrieval strategy.
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.config.search_mode = mode;
        self
    }

    /// Set the minimum similarity threshold for thresholded search.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the maximum number of images per answer.
    pub fn max_images(mut self, max_images: usize) -> Self {
        self.config.max_images = max_images;
        self
    }

    /// Set the text-only model identifier.
    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_model = model.into();
        self
    }

    /// Set the image-capable model identifier.
    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RagConfig::default().validate().is_ok());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::InvalidConfig(_)));
    }

    #[test]
    fn identical_models_are_rejected() {
        let err = RagConfig::builder().text_model("gpt-4o").image_model("gpt-4o").build();
        assert!(matches!(err, Err(RagError::InvalidConfig(_))));
    }

    #[test]
    fn temperature_out_of_range_is_rejected() {
        assert!(RagConfig::builder().temperature(2.5).build().is_err());
        assert!(RagConfig::builder().temperature(1.0).build().is_ok());
    }

    #[test]
    fn model_settings_mirror_config() {
        let config = RagConfig::builder()
            .text_model("small")
            .image_model("vision")
            .temperature(0.7)
            .build()
            .unwrap();
        let settings = config.model_settings();
        assert_eq!(settings.text_model, "small");
        assert_eq!(settings.image_model, "vision");
        assert!((settings.temperature - 0.7).abs() < f32::EPSILON);
    }
}
