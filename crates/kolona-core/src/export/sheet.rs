use std::collections::BTreeMap;
use std::io::Write;

use csv::WriterBuilder;
use serde::Serialize;

use crate::error::KolonaError;
use crate::model::{Cell, Table};

/// Characters added to the widest value of a column.
pub const WIDTH_PADDING: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetOptions {
    /// Upper bound on the width of the named columns.
    pub width_caps: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    #[default]
    Center,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CellStyle {
    pub bold: bool,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetCell {
    pub value: String,
    pub style: CellStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetColumn {
    pub name: String,
    pub width: usize,
}

/// A styled spreadsheet view of a table. Row 0 is the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub columns: Vec<SheetColumn>,
    pub rows: Vec<Vec<SheetCell>>,
}

pub fn build_sheet(table: &Table, options: &SheetOptions) -> Sheet {
    let header: Vec<SheetCell> = table
        .columns()
        .iter()
        .map(|c| SheetCell {
            value: c.name.clone(),
            style: CellStyle {
                bold: true,
                align: Align::Center,
            },
        })
        .collect();

    let mut rows = vec![header];
    for record in table.rows() {
        rows.push(
            record
                .cells()
                .iter()
                .map(|cell| SheetCell {
                    value: cell_value(cell),
                    style: CellStyle::default(),
                })
                .collect(),
        );
    }

    let columns = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let widest = rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.value.chars().count())
                .max()
                .unwrap_or(0);
            let mut width = widest + WIDTH_PADDING;
            if let Some(cap) = options.width_caps.get(&column.name) {
                width = width.min(*cap);
            }
            SheetColumn {
                name: column.name.clone(),
                width,
            }
        })
        .collect();

    Sheet { columns, rows }
}

fn cell_value(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(v) => v.to_string(),
        Cell::Numbers(values) => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" "),
        Cell::Empty => String::new(),
    }
}

/// Write the sheet's values as CSV. Styles and widths are not representable
/// in CSV and are dropped.
pub fn write_csv<W: Write>(sheet: &Sheet, writer: W, delimiter: u8) -> Result<(), KolonaError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    for row in &sheet.rows {
        writer.write_record(row.iter().map(|c| c.value.as_str()))?;
    }
    writer.flush()?;
    Ok(())
}
