use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use rust_decimal::Decimal;

use crate::error::KolonaError;
use crate::extraction::PageRows;

/// Reads pre-segmented rows from an xlsx workbook, for the `tables` mode.
///
/// The whole sheet is treated as a single page. Empty cells are dropped, so
/// a row holds only the cells that carry a value, like a gap-segmented line.
#[derive(Debug, Clone, Default)]
pub struct XlsxRowSource {
    /// Sheet to read. Defaults to the first sheet in the workbook.
    pub sheet: Option<String>,
}

impl XlsxRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(sheet: impl Into<String>) -> Self {
        XlsxRowSource {
            sheet: Some(sheet.into()),
        }
    }

    pub fn read_rows(&self, bytes: &[u8]) -> Result<Vec<PageRows>, KolonaError> {
        let cursor = Cursor::new(bytes);
        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
            .map_err(|e| KolonaError::Extraction(format!("failed to open xlsx: {e}")))?;

        let range = match &self.sheet {
            Some(name) => workbook
                .worksheet_range(name)
                .map_err(|e| KolonaError::Extraction(format!("sheet '{name}' not found: {e}")))?,
            None => workbook
                .worksheet_range_at(0)
                .ok_or_else(|| KolonaError::Extraction("workbook has no sheets".into()))?
                .map_err(|e| KolonaError::Extraction(format!("failed to read first sheet: {e}")))?,
        };

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().filter_map(cell_text).collect::<Vec<_>>())
            .filter(|cells| !cells.is_empty())
            .collect();

        tracing::debug!(rows = rows.len(), "read xlsx rows");

        Ok(vec![PageRows {
            page_number: 1,
            rows,
        }])
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Float(f) => Some(format_float(*f)),
        Data::Int(i) => Some(i.to_string()),
        _ => Some(format!("{cell}")),
    }
}

/// Spreadsheet amounts are stored as binary floats; show whole-cent values
/// with exactly two decimals so they read like printed prices.
fn format_float(f: f64) -> String {
    let decimal = match format!("{f}").parse::<Decimal>() {
        Ok(d) => d,
        Err(_) => return f.to_string(),
    };
    if decimal.round_dp(2) == decimal {
        format!("{decimal:.2}")
    } else {
        decimal.normalize().to_string()
    }
}
