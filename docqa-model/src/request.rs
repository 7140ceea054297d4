//! Provider-neutral completion request.

use serde::{Deserialize, Serialize};

/// One system prompt plus one user turn, optionally carrying images.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier sent to the backend.
    pub model: String,
    /// Fixed instruction placed in the system role.
    pub system_prompt: String,
    /// The user's text content.
    pub user_text: String,
    /// Base64-encoded images appended after the user text, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Sampling temperature.
    pub temperature: f32,
}

impl CompletionRequest {
    /// Create a text-only request with temperature `0.0`.
    pub fn new(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        user_text: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            user_text: user_text.into(),
            images: Vec::new(),
            temperature: 0.0,
        }
    }

    /// Attach base64-encoded images.
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Whether the request carries any image payloads.
    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}
