//! Word documents (`.docx`): a ZIP archive whose body lives in
//! `word/document.xml`.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docqa_rag::{ExtractedDocument, ExtractedPage, Extractor, Result};

use crate::{extraction_error, flatten_lines, parse_blocking};

const FORMAT: &str = "docx";
const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the text runs of a Word document as a single page.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

#[async_trait]
impl Extractor for DocxExtractor {
    fn name(&self) -> &str {
        FORMAT
    }

    fn extensions(&self) -> &[&str] {
        &["docx"]
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let text = parse_blocking(FORMAT, path, read_document_text).await?;
        Ok(ExtractedDocument { pages: vec![ExtractedPage::text(1, flatten_lines(&text))] })
    }
}

fn read_document_text(path: PathBuf) -> Result<String> {
    let file = std::fs::File::open(&path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| extraction_error(FORMAT, format!("invalid archive: {e}")))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| extraction_error(FORMAT, format!("{DOCUMENT_PART} not found")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| extraction_error(FORMAT, format!("unreadable {DOCUMENT_PART}: {e}")))?;
    Ok(text_from_document_xml(&xml))
}

/// Pull the visible text out of WordprocessingML.
///
/// Text inside `<w:t>` runs is kept, each paragraph ends a line, and tabs
/// and breaks become whitespace.
pub(crate) fn text_from_document_xml(xml: &str) -> String {
    let mut result = String::new();
    let mut in_text = false;
    let mut chars = xml.chars();

    while let Some(c) = chars.next() {
        if c != '<' {
            if in_text {
                result.push(c);
            }
            continue;
        }

        let mut tag = String::new();
        for tc in chars.by_ref() {
            if tc == '>' {
                break;
            }
            tag.push(tc);
        }
        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|ch: char| ch.is_whitespace() || ch == '/')
            .next()
            .unwrap_or_default();

        match name {
            "w:t" if closing => in_text = false,
            "w:t" if !self_closing => in_text = true,
            "w:p" if !closing => {
                if !result.is_empty() && !result.ends_with('\n') {
                    result.push('\n');
                }
            }
            "w:tab" => result.push('\t'),
            "w:br" | "w:cr" => result.push('\n'),
            _ => {}
        }
    }

    decode_entities(&result)
}

/// Decode XML entities in one pass, including `&#N;` and `&#xH;`.
/// Unknown or malformed references are kept as written.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let decoded = rest.find(';').and_then(|end| Some((entity(&rest[1..end])?, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
