//! Excel and OpenDocument workbooks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{Data, Reader, open_workbook_auto};
use docqa_rag::{ExtractedDocument, ExtractedPage, Extractor, Result};
use tracing::{debug, warn};

use crate::delimited::{render_row, row_number};
use crate::{extraction_error, parse_blocking};

const FORMAT: &str = "spreadsheet";

/// Reads every worksheet of a workbook.
///
/// The first row of each sheet is its header. Data rows become pages
/// numbered consecutively across the whole workbook. A sheet that cannot
/// be read is logged and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetExtractor;

#[async_trait]
impl Extractor for SpreadsheetExtractor {
    fn name(&self) -> &str {
        FORMAT
    }

    fn extensions(&self) -> &[&str] {
        &["xls", "xlsx", "xlsm", "xlsb", "ods"]
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let pages = parse_blocking(FORMAT, path, read_workbook).await?;
        debug!(file = %path.display(), rows = pages.len(), "read workbook");
        Ok(ExtractedDocument { pages })
    }
}

fn read_workbook(path: PathBuf) -> Result<Vec<ExtractedPage>> {
    let mut workbook = open_workbook_auto(&path).map_err(|e| extraction_error(FORMAT, e))?;

    let mut pages = Vec::new();
    let mut data_rows = 0;
    for sheet in workbook.sheet_names() {
        let range = match workbook.worksheet_range(&sheet) {
            Ok(range) => range,
            Err(e) => {
                warn!(
                    file = %path.display(),
                    sheet = %sheet,
                    error = %e,
                    "skipping unreadable sheet"
                );
                continue;
            }
        };

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            continue;
        };
        let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

        for row in rows {
            let text = render_row(&headers, row.iter().map(cell_to_string));
            let number = row_number(data_rows);
            data_rows += 1;
            if !text.is_empty() {
                pages.push(ExtractedPage::text(number, text));
            }
        }
    }
    Ok(pages)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::Error(e) => format!("#ERR:{e:?}"),
    }
}
