use crate::error::KolonaError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of extracted input, before any structural interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLine {
    /// A line of page text.
    Text(String),
    /// A row already split into cells by a table-aware extractor.
    Cells(Vec<String>),
}

impl RawLine {
    /// Whitespace tokens of the line. Cells are tokenized individually so a
    /// row behaves like its text rendering.
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            RawLine::Text(s) => s.split_whitespace().collect(),
            RawLine::Cells(cells) => cells.iter().flat_map(|c| c.split_whitespace()).collect(),
        }
    }

    /// Single-space joined rendering, used for diagnostics and for matchers
    /// that only understand text.
    pub fn to_text(&self) -> String {
        self.tokens().join(" ")
    }

    pub fn is_blank(&self) -> bool {
        match self {
            RawLine::Text(s) => s.trim().is_empty(),
            RawLine::Cells(cells) => cells.iter().all(|c| c.trim().is_empty()),
        }
    }
}

/// A raw line tagged with the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub page_number: usize,
    pub line: RawLine,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    Text(String),
    Number(Decimal),
    /// A run of numbers kept together, e.g. the trailing numeric fields of a line.
    Numbers(Vec<Decimal>),
    /// No value. Used wherever a computation failed for one record.
    Empty,
}

impl Cell {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Numbers(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Cell::Empty => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Number,
    NumberList,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }
}

/// Cells of one matched line, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    cells: Vec<Cell>,
}

impl Record {
    pub fn new(cells: Vec<Cell>) -> Self {
        Record { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Rectangular table: every record has exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableParts")]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Record>,
}

#[derive(Deserialize)]
struct TableParts {
    columns: Vec<Column>,
    rows: Vec<Record>,
}

impl TryFrom<TableParts> for Table {
    type Error = KolonaError;

    fn try_from(parts: TableParts) -> Result<Self, Self::Error> {
        Table::from_parts(parts.columns, parts.rows)
    }
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_parts(columns: Vec<Column>, rows: Vec<Record>) -> Result<Self, KolonaError> {
        let mut table = Table::new(columns);
        for row in rows {
            table.push(row)?;
        }
        Ok(table)
    }

    /// Append a record, rejecting it if its width differs from the schema.
    pub fn push(&mut self, record: Record) -> Result<(), KolonaError> {
        if record.len() != self.columns.len() {
            return Err(KolonaError::RaggedRecord {
                expected: self.columns.len(),
                found: record.len(),
            });
        }
        self.rows.push(record);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |r| r.get(index))
    }

    /// Copy of the table with `column` appended and `cells` as its values.
    pub(crate) fn with_appended(&self, column: Column, cells: Vec<Cell>) -> Result<Table, KolonaError> {
        if cells.len() != self.rows.len() {
            return Err(KolonaError::RaggedRecord {
                expected: self.rows.len(),
                found: cells.len(),
            });
        }
        let mut columns = self.columns.clone();
        columns.push(column);
        let rows = self
            .rows
            .iter()
            .zip(cells)
            .map(|(row, cell)| {
                let mut cells = row.cells.clone();
                cells.push(cell);
                Record::new(cells)
            })
            .collect();
        Ok(Table { columns, rows })
    }

    /// Copy of the table with the cells of column `index` swapped for `cells`.
    pub(crate) fn with_replaced(
        &self,
        index: usize,
        kind: ColumnKind,
        cells: Vec<Cell>,
    ) -> Result<Table, KolonaError> {
        if cells.len() != self.rows.len() {
            return Err(KolonaError::RaggedRecord {
                expected: self.rows.len(),
                found: cells.len(),
            });
        }
        let mut columns = self.columns.clone();
        if let Some(column) = columns.get_mut(index) {
            column.kind = kind;
        }
        let rows = self
            .rows
            .iter()
            .zip(cells)
            .map(|(row, cell)| {
                let mut cells = row.cells.clone();
                if let Some(slot) = cells.get_mut(index) {
                    *slot = cell;
                }
                Record::new(cells)
            })
            .collect();
        Ok(Table { columns, rows })
    }
}

/// A line the selected matcher did not accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub page_number: usize,
    pub text: String,
    pub reason: String,
}
