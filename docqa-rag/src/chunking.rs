//! Text chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`]: splits by character count with configurable overlap
//! - [`RecursiveChunker`]: splits hierarchically by paragraphs, lines, sentences, then words
//!
//! Sizes are counted in characters, so multi-byte text is never cut inside a
//! code point.

use crate::error::{RagError, Result};

/// A strategy for splitting one extracted text body into bounded fragments.
///
/// Every fragment returned by [`split`](Chunker::split) is at most
/// [`max_chunk_size`](Chunker::max_chunk_size) characters long, and fragments
/// keep the order in which their text appears in the input.
pub trait Chunker: Send + Sync {
    /// Split `text` into fragments.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] if `text` is empty or only whitespace.
    fn split(&self, text: &str) -> Result<Vec<String>>;

    /// Upper bound on fragment length, in characters.
    fn max_chunk_size(&self) -> usize;
}

/// Split `text` into fragments of at most `max_chunk_size` characters using
/// [`RecursiveChunker`].
///
/// # Errors
///
/// Returns [`RagError::InvalidInput`] if `text` is empty or `max_chunk_size`
/// is zero.
pub fn split(text: &str, max_chunk_size: usize) -> Result<Vec<String>> {
    if max_chunk_size == 0 {
        return Err(RagError::InvalidInput("max_chunk_size must be greater than zero".into()));
    }
    RecursiveChunker::new(max_chunk_size).split(text)
}

fn ensure_not_empty(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(RagError::InvalidInput("the input text cannot be empty".to_string()));
    }
    Ok(())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits text into fixed-size windows by character count with configurable overlap.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(256, 32);
/// let fragments = chunker.split(&page_text)?;
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// A zero `chunk_size` is treated as one character; an overlap that is not
    /// smaller than `chunk_size` is clamped to `chunk_size - 1`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

impl Chunker for FixedSizeChunker {
    fn split(&self, text: &str) -> Result<Vec<String>> {
        ensure_not_empty(text)?;
        Ok(split_by_size(text, self.chunk_size, self.chunk_overlap))
    }

    fn max_chunk_size(&self) -> usize {
        self.chunk_size
    }
}

/// Character windows of `chunk_size`, each starting `chunk_size - chunk_overlap`
/// after the previous one. Stops once a window reaches the end of the text.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

/// Splits text hierarchically: paragraphs → lines → sentences → words.
///
/// First splits by paragraph separators (`\n\n`). Segments are merged
/// greedily while they fit in `chunk_size`; a segment that is still too long
/// is split at the next separator level, and as a last resort by character
/// count. Fragments that contain only whitespace are dropped.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(512);
/// let fragments = chunker.split(&page_text)?;
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
}

const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` producing fragments of at most
    /// `chunk_size` characters (minimum one).
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1) }
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, text: &str) -> Result<Vec<String>> {
        ensure_not_empty(text)?;
        Ok(split_and_merge(text, self.chunk_size, &SEPARATORS)
            .into_iter()
            .filter(|fragment| !fragment.trim().is_empty())
            .collect())
    }

    fn max_chunk_size(&self) -> usize {
        self.chunk_size
    }
}

/// Split text by a separator, then merge segments into chunks that respect
/// `chunk_size`. If a segment exceeds `chunk_size`, it is split further
/// using the next-level separator.
fn split_and_merge(text: &str, chunk_size: usize, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, remaining_separators)) = separators.split_first() else {
        return split_by_size(text, chunk_size, 0);
    };

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for segment in split_keeping_separator(text, separator) {
        let segment_len = char_len(segment);
        if current_len + segment_len <= chunk_size {
            current.push_str(segment);
            current_len += segment_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if segment_len > chunk_size {
            chunks.extend(split_and_merge(segment, chunk_size, remaining_separators));
            current_len = 0;
        } else {
            current.push_str(segment);
            current_len = segment_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}
