//! Answer generation: one model call per question, with a no-content short circuit.

use std::sync::Arc;

use docqa_model::{CompletionRequest, LanguageModel, ModelError};
use tracing::{error, info};

use crate::config::ModelSettings;
use crate::error::{RagError, Result};

/// Returned without calling the model when retrieval produced no text and no images.
pub const NO_RELEVANT_ANSWER: &str = "Your question found no relevant answers from the document";

/// System instruction for every answer.
pub const ANSWER_SYSTEM_PROMPT: &str = "You are an advanced AI assistant designed to provide \
accurate, concise, and contextually relevant answers to user questions. Your responses should be \
clear, informative, and formatted in Markdown. Guidelines: Context Utilization: Use the provided \
context to answer the question at the end. Ensure your response is relevant and integrates the \
context effectively. Highlight key points from the context to support your answer. Response \
Clarity: Structure your answers to enhance readability. Use headings, bullet points, and lists \
where appropriate. Ensure that your language is straightforward and avoids jargon unless \
necessary. Honesty in Responses: If you do not know the answer to a question, clearly state that \
you do not know, without attempting to fabricate a response. Avoid guesswork and provide only \
verified information. Integration of Visuals: When images or additional context are provided, \
incorporate this information into your answers to enhance understanding. Reference visuals when \
necessary to clarify your points. User Engagement: Aim to engage users with a friendly and \
professional tone. Encourage follow-up questions or clarifications to ensure user satisfaction. \
Formatting Standards: Use appropriate Markdown formatting for headings, lists, and emphasis \
(bold/italics) to improve the presentation of your answers";

/// Turns assembled context into an answer via a [`LanguageModel`].
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    settings: ModelSettings,
}

impl AnswerGenerator {
    /// Create a generator that accepts `settings.text_model` and
    /// `settings.image_model` as model names.
    pub fn new(model: Arc<dyn LanguageModel>, settings: ModelSettings) -> Self {
        Self { model, settings }
    }

    /// Answer `question` from `context_text` and `images` using `model_name`.
    ///
    /// Images are attached only when `model_name` is the image-capable model.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidModel`] if `model_name` is neither configured model.
    /// - [`RagError::ModelInvocationError`] if the model call fails or returns
    ///   no text.
    pub async fn generate(
        &self,
        context_text: &str,
        images: &[String],
        model_name: &str,
        question: &str,
    ) -> Result<String> {
        if context_text.is_empty() && images.is_empty() {
            info!("no relevant content retrieved, skipping model call");
            return Ok(NO_RELEVANT_ANSWER.to_string());
        }

        let attach_images = if model_name == self.settings.image_model {
            true
        } else if model_name == self.settings.text_model {
            false
        } else {
            return Err(RagError::InvalidModel(model_name.to_string()));
        };

        let user_text = build_user_prompt(question, context_text);
        let mut request = CompletionRequest::new(model_name, ANSWER_SYSTEM_PROMPT, user_text)
            .with_temperature(self.settings.temperature);
        if attach_images {
            request = request.with_images(images.to_vec());
        }

        let answer = self.model.complete(request).await.map_err(|e| {
            error!(
                provider = self.model.provider(),
                model = model_name,
                error = %e,
                "answer generation failed"
            );
            RagError::from(e)
        })?;
        if answer.trim().is_empty() {
            let provider = self.model.provider().to_string();
            return Err(ModelError::EmptyResponse { provider }.into());
        }

        info!(model = model_name, attached_images = attach_images, "generated answer");
        Ok(answer)
    }
}

/// The user turn: the question followed by the retrieved context.
pub fn build_user_prompt(question: &str, context_text: &str) -> String {
    format!("**Question:** {question} \n**Context:** {context_text}\n\n")
}
