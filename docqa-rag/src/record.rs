//! Record construction for text chunks and image-summary chunks.
//!
//! The two entry points keep the metadata contract explicit per modality:
//! text records never carry an image path, image records always do.

use std::path::Path;

use crate::document::{Record, RecordKind, RecordMetadata};
use crate::error::{RagError, Result};

/// Wrap text chunks from one page of `source` into text records.
///
/// `source` may be a path; only its base name is stored.
///
/// # Errors
///
/// Returns [`RagError::InvalidInput`] if `chunks` is empty, any chunk is
/// empty, or `page < 1`.
pub fn build_text_records<S: AsRef<str>>(
    chunks: &[S],
    source: &str,
    page: u32,
) -> Result<Vec<Record>> {
    build_records(chunks, source, page, || RecordKind::Text)
}

/// Wrap chunks of an image summary into image records pointing at `image_path`.
///
/// # Errors
///
/// Returns [`RagError::InvalidInput`] if `chunks` is empty, any chunk is
/// empty, or `page < 1`.
pub fn build_image_records<S: AsRef<str>>(
    chunks: &[S],
    image_path: &Path,
    source: &str,
    page: u32,
) -> Result<Vec<Record>> {
    build_records(chunks, source, page, || RecordKind::Image {
        image_path: image_path.to_path_buf(),
    })
}

fn build_records<S: AsRef<str>>(
    chunks: &[S],
    source: &str,
    page: u32,
    kind: impl Fn() -> RecordKind,
) -> Result<Vec<Record>> {
    if chunks.is_empty() {
        return Err(RagError::InvalidInput("the chunk list cannot be empty".to_string()));
    }
    if page < 1 {
        return Err(RagError::InvalidInput("page number must be a positive integer".to_string()));
    }
    let source = base_name(source);
    if source.is_empty() {
        return Err(RagError::InvalidInput("source name cannot be empty".to_string()));
    }

    chunks
        .iter()
        .map(|chunk| {
            let content = chunk.as_ref();
            if content.is_empty() {
                return Err(RagError::InvalidInput(format!(
                    "empty chunk for '{source}' page {page}"
                )));
            }
            Ok(Record {
                content: content.to_string(),
                metadata: RecordMetadata { source: source.clone(), page, kind: kind() },
            })
        })
        .collect()
}

fn base_name(source: &str) -> String {
    Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn one_text_record_per_chunk() {
        let records = build_text_records(&["alpha", "beta"], "docs/report.pdf", 3).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].content, "beta");
        for record in &records {
            assert_eq!(record.metadata.source, "report.pdf");
            assert_eq!(record.metadata.page, 3);
            assert_eq!(record.metadata.kind, RecordKind::Text);
            assert!(record.image_path().is_none());
        }
    }

    #[test]
    fn image_records_carry_the_path() {
        let path = PathBuf::from("out/report.pdf_page_1_image_1.png");
        let records = build_image_records(&["a chart"], &path, "report.pdf", 1).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_image());
        assert_eq!(records[0].image_path(), Some(path.as_path()));
    }

    #[test]
    fn empty_chunks_are_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            build_text_records(&empty, "a.txt", 1),
            Err(RagError::InvalidInput(_))
        ));
        assert!(matches!(
            build_image_records(&empty, Path::new("x.png"), "a.pdf", 1),
            Err(RagError::InvalidInput(_))
        ));
        assert!(build_text_records(&["ok", ""], "a.txt", 1).is_err());
    }

    #[test]
    fn page_zero_is_rejected() {
        assert!(matches!(build_text_records(&["x"], "a.txt", 0), Err(RagError::InvalidInput(_))));
    }

    #[test]
    fn image_metadata_serializes_flat() {
        let records = build_image_records(&["s"], Path::new("img1.png"), "a.pdf", 2).unwrap();
        let json = serde_json::to_value(&records[0].metadata).unwrap();
        assert_eq!(json["type"], "Image");
        assert_eq!(json["image_path"], "img1.png");
        assert_eq!(json["page"], 2);

        let text = build_text_records(&["s"], "a.pdf", 2).unwrap();
        let json = serde_json::to_value(&text[0].metadata).unwrap();
        assert_eq!(json["type"], "Text");
        assert!(json.get("image_path").is_none());
    }
}
