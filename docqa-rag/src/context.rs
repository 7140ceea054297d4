//! Context assembly: ranked records → prompt text, images, model choice, citations.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ModelSettings;
use crate::document::{AnswerContext, Record, RecordKind, ReferenceSet};
use crate::image::ImageCodec;

/// Builds the [`AnswerContext`] and [`ReferenceSet`] for one question.
///
/// Records are consumed in retrieval order in a single pass:
///
/// - text records append their content (plus a newline) to the context, and
///   the first one fills the text citation;
/// - image records are encoded and attached while fewer than `max_images`
///   are attached and their path has not been attached yet; the first
///   attached image fills the image citation and switches the model to the
///   image-capable one for the rest of the question.
///
/// An image that fails to encode is logged and skipped.
pub struct ContextAssembler {
    models: ModelSettings,
    codec: Arc<dyn ImageCodec>,
}

impl ContextAssembler {
    /// Create an assembler choosing between `models.text_model` and
    /// `models.image_model`.
    pub fn new(models: ModelSettings, codec: Arc<dyn ImageCodec>) -> Self {
        Self { models, codec }
    }

    /// Assemble context from `records`, attaching at most `max_images` images.
    pub async fn assemble(
        &self,
        records: &[Record],
        max_images: usize,
    ) -> (AnswerContext, ReferenceSet) {
        let mut seen_paths: HashSet<&Path> = HashSet::new();
        let mut images = Vec::new();
        let mut context = String::new();
        let mut model_name = &self.models.text_model;
        let mut references = ReferenceSet::default();

        for record in records {
            match &record.metadata.kind {
                RecordKind::Image { image_path } => {
                    if images.len() >= max_images || seen_paths.contains(image_path.as_path()) {
                        continue;
                    }
                    match self.codec.encode(image_path).await {
                        Ok(encoded) => {
                            images.push(encoded);
                            seen_paths.insert(image_path.as_path());
                            if references.image.is_none() {
                                references.image = Some(record.source_ref());
                            }
                            model_name = &self.models.image_model;
                        }
                        Err(e) => {
                            warn!(
                                image = %image_path.display(),
                                source = %record.metadata.source,
                                page = record.metadata.page,
                                error = %e,
                                "skipping image that could not be encoded"
                            );
                        }
                    }
                }
                RecordKind::Text => {
                    context.push_str(&record.content);
                    context.push('\n');
                    if references.text.is_none() {
                        references.text = Some(record.source_ref());
                    }
                }
            }
        }

        debug!(
            record_count = records.len(),
            image_count = images.len(),
            model = %model_name,
            "assembled answer context"
        );

        let answer_context = AnswerContext {
            context_text: context.trim().to_string(),
            images,
            model_name: model_name.clone(),
        };
        (answer_context, references)
    }
}
