//! Query pipeline orchestrator.
//!
//! The [`QueryPipeline`] answers one question at a time by composing an
//! [`Index`], a [`ContextAssembler`] and an [`AnswerGenerator`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{QueryPipeline, RagConfig};
//!
//! let pipeline = QueryPipeline::builder()
//!     .config(RagConfig::default())
//!     .index(index.clone())
//!     .model(Arc::new(OpenAIClient::from_env()?))
//!     .build()?;
//!
//! let answer = pipeline.answer_question("What does figure 3 show?", 2).await?;
//! println!("{}\n\n{}", answer.answer, answer.references);
//! ```

use std::sync::Arc;

use docqa_model::LanguageModel;
use tracing::{error, info};

use crate::answer::AnswerGenerator;
use crate::config::RagConfig;
use crate::context::ContextAssembler;
use crate::document::Answer;
use crate::error::{RagError, Result};
use crate::image::{Base64ImageCodec, ImageCodec};
use crate::index::Index;
use crate::references::format_references;

/// Retrieval → context assembly → answer generation → reference formatting.
///
/// Construct one via [`QueryPipeline::builder()`].
pub struct QueryPipeline {
    config: RagConfig,
    index: Arc<dyn Index>,
    assembler: ContextAssembler,
    generator: AnswerGenerator,
}

impl QueryPipeline {
    /// Create a new [`QueryPipelineBuilder`].
    pub fn builder() -> QueryPipelineBuilder {
        QueryPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Answer `question` with at most `max_images` images in the prompt.
    ///
    /// A failing index is logged and treated as "nothing retrieved", which
    /// yields the no-relevant-answer sentinel.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if `question` is empty; the index is not called.
    /// - [`RagError::InvalidModel`] / [`RagError::ModelInvocationError`] from
    ///   answer generation.
    pub async fn answer_question(&self, question: &str, max_images: usize) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(RagError::InvalidInput("the question must be a non-empty string".into()));
        }

        let records = match self
            .index
            .retrieve(question, self.config.top_k, self.config.search_mode)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "retrieval failed, answering without context");
                Vec::new()
            }
        };
        info!(record_count = records.len(), mode = %self.config.search_mode, "retrieved records");

        let (context, references) = self.assembler.assemble(&records, max_images).await;
        let answer = self
            .generator
            .generate(&context.context_text, &context.images, &context.model_name, question)
            .await?;

        Ok(Answer { references: format_references(&references), answer })
    }

    /// Answer `question` using the configured `max_images`.
    ///
    /// # Errors
    ///
    /// See [`answer_question`](QueryPipeline::answer_question).
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        self.answer_question(question, self.config.max_images).await
    }
}

/// Builder for constructing a [`QueryPipeline`].
///
/// `config`, `index` and `model` are required; the image codec defaults to
/// [`Base64ImageCodec`].
#[derive(Default)]
pub struct QueryPipelineBuilder {
    config: Option<RagConfig>,
    index: Option<Arc<dyn Index>>,
    model: Option<Arc<dyn LanguageModel>>,
    image_codec: Option<Arc<dyn ImageCodec>>,
}

impl QueryPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the index to retrieve from.
    pub fn index(mut self, index: Arc<dyn Index>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the language model used for answers.
    pub fn model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Override the image codec.
    pub fn image_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.image_codec = Some(codec);
        self
    }

    /// Build the [`QueryPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if any required field is missing or
    /// the configuration is inconsistent.
    pub fn build(self) -> Result<QueryPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::InvalidConfig("config is required".to_string()))?;
        config.validate()?;
        let index =
            self.index.ok_or_else(|| RagError::InvalidConfig("index is required".to_string()))?;
        let model =
            self.model.ok_or_else(|| RagError::InvalidConfig("model is required".to_string()))?;
        let codec = self.image_codec.unwrap_or_else(|| Arc::new(Base64ImageCodec));

        Ok(QueryPipeline {
            assembler: ContextAssembler::new(config.model_settings(), codec),
            generator: AnswerGenerator::new(model, config.model_settings()),
            config,
            index,
        })
    }
}
