//! Data types for indexed records, answer context, and citations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What a [`Record`]'s content stands for.
///
/// Image records always carry the path of the extracted image on disk, so an
/// image record without a path cannot be constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RecordKind {
    /// A chunk of document text.
    Text,
    /// A chunk of a generated image summary.
    Image {
        /// Where the extracted image was written.
        image_path: PathBuf,
    },
}

/// Source-location metadata stored alongside every record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordMetadata {
    /// Base name of the original file.
    pub source: String,
    /// 1-based page (or row) index within the source.
    pub page: u32,
    /// Text or image, with the image path for the latter.
    #[serde(flatten)]
    pub kind: RecordKind,
}

/// The atomic unit stored in an [`Index`](crate::index::Index).
///
/// Built by [`build_text_records`](crate::record::build_text_records) and
/// [`build_image_records`](crate::record::build_image_records), immutable
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// The chunk text, or a chunk of an image summary.
    pub content: String,
    /// Where the content came from.
    pub metadata: RecordMetadata,
}

impl Record {
    /// Whether this record describes an image.
    pub fn is_image(&self) -> bool {
        matches!(self.metadata.kind, RecordKind::Image { .. })
    }

    /// The extracted image path, for image records.
    pub fn image_path(&self) -> Option<&Path> {
        match &self.metadata.kind {
            RecordKind::Image { image_path } => Some(image_path),
            RecordKind::Text => None,
        }
    }

    /// The `{source, page}` pair used for citations.
    pub fn source_ref(&self) -> SourceRef {
        SourceRef { source: self.metadata.source.clone(), page: self.metadata.page }
    }
}

/// A `{source, page}` citation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceRef {
    /// Base name of the cited file.
    pub source: String,
    /// Cited page or row.
    pub page: u32,
}

/// One representative text citation and one representative image citation.
///
/// Each slot holds the first contributing record in retrieval order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceSet {
    /// First text record that contributed context.
    pub text: Option<SourceRef>,
    /// First image that was attached to the prompt.
    pub image: Option<SourceRef>,
}

impl ReferenceSet {
    /// Whether neither slot is filled.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image.is_none()
    }
}

/// Everything the answer generator needs for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerContext {
    /// Concatenated text of the text records, trimmed.
    pub context_text: String,
    /// Base64-encoded images in retrieval order.
    pub images: Vec<String>,
    /// The model chosen for this question.
    pub model_name: String,
}

/// An answer together with the references that support it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    /// Formatted citation block.
    pub references: String,
    /// The model's answer, or the no-relevant-content sentinel.
    pub answer: String,
}
