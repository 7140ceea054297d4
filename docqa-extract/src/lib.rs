//! # docqa-extract
//!
//! Per-format [`Extractor`] implementations for the DocQA ingestion
//! pipeline.
//!
//! | Extractor | Extensions | Pages |
//! |-----------|------------|-------|
//! | [`TextExtractor`] | `txt` | whole file is page 1 |
//! | [`DocxExtractor`] | `docx` | whole document is page 1 |
//! | [`CsvExtractor`] | `csv` | one page per data row |
//! | [`SpreadsheetExtractor`] | `xls`, `xlsx`, `xlsm`, `xlsb`, `ods` | one page per data row, across sheets |
//! | [`PdfExtractor`] | `pdf` | one page per PDF page, with embedded images |
//!
//! Parsing runs on the blocking thread pool. Every extractor reports a
//! missing file as [`RagError::NotFound`] and a parse failure as
//! [`RagError::ExtractionError`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use docqa_extract::default_extractors;
//! use docqa_rag::IngestionPipeline;
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(config)
//!     .index(index)
//!     .extractors(default_extractors())
//!     .build()?;
//! ```

mod delimited;
mod docx;
mod pdf;
mod spreadsheet;
mod text;

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_rag::{Extractor, RagError, Result};

pub use delimited::CsvExtractor;
pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use spreadsheet::SpreadsheetExtractor;
pub use text::TextExtractor;

/// One instance of every extractor in this crate.
pub fn default_extractors() -> Vec<Arc<dyn Extractor>> {
    vec![
        Arc::new(PdfExtractor::new()),
        Arc::new(TextExtractor),
        Arc::new(DocxExtractor),
        Arc::new(CsvExtractor),
        Arc::new(SpreadsheetExtractor),
    ]
}

pub(crate) fn extraction_error(format: &str, message: impl Display) -> RagError {
    RagError::ExtractionError { format: format.to_string(), message: message.to_string() }
}

pub(crate) fn ensure_file(path: &Path) -> Result<()> {
    if path.is_file() { Ok(()) } else { Err(RagError::NotFound(path.to_path_buf())) }
}

/// Run a synchronous parser for `path` on the blocking pool.
pub(crate) async fn parse_blocking<T, F>(format: &'static str, path: &Path, parse: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(PathBuf) -> Result<T> + Send + 'static,
{
    ensure_file(path)?;
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || parse(path))
        .await
        .map_err(|e| extraction_error(format, format!("task join error: {e}")))?
}

/// Collapse a multi-line body into one line, as the text formats index it.
pub(crate) fn flatten_lines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
