//! Human-readable citation block.

use crate::document::{ReferenceSet, SourceRef};

const UNKNOWN_SOURCE: &str = "Unknown Source";
const UNKNOWN_PAGE: &str = "Unknown Page";

/// Format a [`ReferenceSet`] as a `Text:` section and an `Images:` section,
/// separated by a blank line. Empty slots are omitted; an empty set formats
/// to an empty string.
///
/// ```
/// use docqa_rag::{format_references, ReferenceSet, SourceRef};
///
/// let refs = ReferenceSet {
///     text: Some(SourceRef { source: "a.pdf".into(), page: 2 }),
///     image: None,
/// };
/// assert_eq!(format_references(&refs), "Text:\n   Source: a.pdf  Page: 2");
/// ```
pub fn format_references(references: &ReferenceSet) -> String {
    let mut lines = Vec::new();

    if let Some(text) = &references.text {
        lines.push("Text:".to_string());
        lines.push(format_entry(text));
    }

    if let Some(image) = &references.image {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Images:".to_string());
        lines.push(format_entry(image));
    }

    lines.join("\n")
}

fn format_entry(entry: &SourceRef) -> String {
    let source = match entry.source.trim() {
        "" => UNKNOWN_SOURCE,
        name => name,
    };
    let page = if entry.page == 0 { UNKNOWN_PAGE.to_string() } else { entry.page.to_string() };
    format!("   Source: {source}  Page: {page}")
}
