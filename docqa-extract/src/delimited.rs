//! Comma-separated files: one page per data row.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docqa_rag::{ExtractedDocument, ExtractedPage, Extractor, Result};
use tracing::{debug, warn};

use crate::{extraction_error, parse_blocking};

const FORMAT: &str = "csv";

/// Reads a CSV file with a header row; each data row becomes a page
/// numbered from 1. Rows that fail to decode are logged and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExtractor;

#[async_trait]
impl Extractor for CsvExtractor {
    fn name(&self) -> &str {
        FORMAT
    }

    fn extensions(&self) -> &[&str] {
        &["csv"]
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let pages = parse_blocking(FORMAT, path, read_rows).await?;
        debug!(file = %path.display(), rows = pages.len(), "read csv file");
        Ok(ExtractedDocument { pages })
    }
}

fn read_rows(path: PathBuf) -> Result<Vec<ExtractedPage>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&path)
        .map_err(|e| extraction_error(FORMAT, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| extraction_error(FORMAT, format!("unreadable header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut pages = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(extraction_error(FORMAT, e)),
            Err(e) => {
                warn!(
                    file = %path.display(),
                    row = row_number(row),
                    error = %e,
                    "skipping unreadable row"
                );
                continue;
            }
        };
        let text = render_row(&headers, record.iter());
        if !text.is_empty() {
            pages.push(ExtractedPage::text(row_number(row), text));
        }
    }
    Ok(pages)
}

pub(crate) fn row_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

/// Render one row as `header: value` pairs. Empty cells are skipped and
/// columns past the header are named `column_<n>`.
pub(crate) fn render_row<I, S>(headers: &[String], cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .enumerate()
        .filter_map(|(col, cell)| {
            let value = cell.as_ref().trim();
            if value.is_empty() {
                return None;
            }
            let header = match headers.get(col).map(|h| h.trim()) {
                Some(h) if !h.is_empty() => h.to_string(),
                _ => format!("column_{}", col + 1),
            };
            Some(format!("{header}: {value}"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn renders_pairs_and_skips_blank_cells() {
        let h = headers(&["name", "city", "age"]);
        assert_eq!(render_row(&h, ["Ada", "", "36"]), "name: Ada, age: 36");
    }

    #[test]
    fn extra_columns_get_positional_names() {
        let h = headers(&["name", ""]);
        assert_eq!(render_row(&h, ["Ada", "x", "y"]), "name: Ada, column_2: x, column_3: y");
    }

    #[test]
    fn blank_row_renders_empty() {
        assert_eq!(render_row(&headers(&["a"]), ["  "]), "");
    }
}
