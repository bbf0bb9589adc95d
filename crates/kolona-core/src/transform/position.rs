use crate::error::KolonaError;
use crate::model::{Cell, Column, ColumnKind, Record};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// A field address counted from the right edge of a row; 1 is the last field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ColumnPosition(NonZeroUsize);

impl ColumnPosition {
    pub fn new(position: usize) -> Result<Self, KolonaError> {
        NonZeroUsize::new(position)
            .map(ColumnPosition)
            .ok_or(KolonaError::PositionOutOfRange { position, width: 0 })
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for ColumnPosition {
    type Error = KolonaError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        ColumnPosition::new(value)
    }
}

impl From<ColumnPosition> for usize {
    fn from(position: ColumnPosition) -> usize {
        position.get()
    }
}

impl FromStr for ColumnPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: usize = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid column position '{s}'"))?;
        ColumnPosition::new(n).map_err(|_| "column positions start at 1".to_string())
    }
}

impl fmt::Display for ColumnPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Absolute index of the field at `position` in a row of `row_width` fields.
pub fn resolve(row_width: usize, position: ColumnPosition) -> Result<usize, KolonaError> {
    let p = position.get();
    if p > row_width {
        return Err(KolonaError::PositionOutOfRange {
            position: p,
            width: row_width,
        });
    }
    Ok(row_width - p)
}

/// The fields a right-indexed position counts over.
///
/// Rows carrying a number run (see [`ColumnKind::NumberList`]) are addressed
/// inside that run, since its width varies per line. Otherwise the row's
/// cells are addressed directly.
#[derive(Debug, Clone, Copy)]
pub enum PositionalFields<'a> {
    Run(&'a [Decimal]),
    Cells(&'a [Cell]),
}

impl<'a> PositionalFields<'a> {
    pub fn of(columns: &[Column], record: &'a Record) -> Self {
        let run = columns
            .iter()
            .position(|c| c.kind == ColumnKind::NumberList)
            .and_then(|i| record.get(i));
        match run {
            Some(Cell::Numbers(values)) => PositionalFields::Run(values),
            _ => PositionalFields::Cells(record.cells()),
        }
    }

    pub fn width(&self) -> usize {
        match self {
            PositionalFields::Run(values) => values.len(),
            PositionalFields::Cells(cells) => cells.len(),
        }
    }

    /// Field at `position` from the right, as a cell.
    pub fn from_right(&self, position: ColumnPosition) -> Result<Cell, KolonaError> {
        let index = resolve(self.width(), position)?;
        Ok(match self {
            PositionalFields::Run(values) => Cell::Number(values[index]),
            PositionalFields::Cells(cells) => cells[index].clone(),
        })
    }
}
