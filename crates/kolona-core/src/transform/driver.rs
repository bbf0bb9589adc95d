use super::formula::{EvalFailure, Formula};
use super::position::{ColumnPosition, PositionalFields};
use crate::error::KolonaError;
use crate::matching::numeric::parse_number;
use crate::model::{Cell, Column, ColumnKind, Record, Table};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places kept in a derived cell. Midpoints round away from zero,
/// as prices are rounded on invoices.
pub const RESULT_SCALE: u32 = 2;

/// Which value of each record feeds the formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSelector {
    /// An existing column, by name.
    Column(String),
    /// A field counted from the right edge of each row.
    Position(ColumnPosition),
}

impl fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSelector::Column(name) => write!(f, "column '{name}'"),
            SourceSelector::Position(p) => write!(f, "position {p} from the right"),
        }
    }
}

/// What to do when the derived column name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    #[default]
    Reject,
    /// Overwrite the existing column's values in the returned table.
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub source: SourceSelector,
    pub formula: String,
    pub column: String,
    #[serde(default)]
    pub on_collision: CollisionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    pub table: Table,
    /// Records that received a value.
    pub computed: usize,
    /// Records whose derived cell is empty.
    pub empty: usize,
}

enum Source {
    Column(usize),
    Position(ColumnPosition),
}

/// Derive a new column from `spec.source` through `spec.formula`.
///
/// Only table-level problems are errors: a bad column name, an unknown
/// source column, a position wider than every row, or a name collision the
/// policy does not allow. Everything that goes wrong for a single record
/// (short row, non-numeric source, evaluation failure) leaves that record's
/// cell empty. A formula that does not parse empties every cell.
pub fn apply(table: &Table, spec: &TransformSpec) -> Result<TransformOutcome, KolonaError> {
    let name = spec.column.trim();
    if name.is_empty() {
        return Err(KolonaError::InvalidColumnName(
            "the new column name must not be empty".into(),
        ));
    }

    let existing = table.column_index(name);
    if existing.is_some() && spec.on_collision == CollisionPolicy::Reject {
        return Err(KolonaError::ColumnExists(name.to_string()));
    }

    let source = resolve_source(table, &spec.source)?;

    let formula = match Formula::parse(&spec.formula) {
        Ok(f) => Some(f),
        Err(e) => {
            tracing::warn!(formula = %spec.formula, error = %e, "formula rejected; derived column will be empty");
            None
        }
    };

    let cells: Vec<Cell> = table
        .rows()
        .iter()
        .map(|record| match &formula {
            Some(f) => derive_cell(table.columns(), record, &source, f),
            None => Cell::Empty,
        })
        .collect();

    let empty = cells.iter().filter(|c| c.is_empty()).count();
    let computed = cells.len() - empty;

    let derived = match existing {
        Some(index) => table.with_replaced(index, ColumnKind::Number, cells)?,
        None => table.with_appended(Column::new(name, ColumnKind::Number), cells)?,
    };

    tracing::info!(
        column = name,
        source = %spec.source,
        computed,
        empty,
        "derived column"
    );

    Ok(TransformOutcome {
        table: derived,
        computed,
        empty,
    })
}

fn resolve_source(table: &Table, selector: &SourceSelector) -> Result<Source, KolonaError> {
    match selector {
        SourceSelector::Column(name) => table
            .column_index(name)
            .map(Source::Column)
            .ok_or_else(|| KolonaError::UnknownColumn(name.clone())),
        SourceSelector::Position(position) => {
            let widest = widest_row(table);
            if position.get() > widest {
                return Err(KolonaError::PositionOutOfRange {
                    position: position.get(),
                    width: widest,
                });
            }
            Ok(Source::Position(*position))
        }
    }
}

/// Largest positional width over all records.
pub fn widest_row(table: &Table) -> usize {
    table
        .rows()
        .iter()
        .map(|r| PositionalFields::of(table.columns(), r).width())
        .max()
        .unwrap_or(0)
}

fn derive_cell(columns: &[Column], record: &Record, source: &Source, formula: &Formula) -> Cell {
    match compute(columns, record, source, formula) {
        Ok(value) => Cell::Number(value),
        Err(reason) => {
            tracing::trace!(%reason, "derived cell left empty");
            Cell::Empty
        }
    }
}

fn compute(
    columns: &[Column],
    record: &Record,
    source: &Source,
    formula: &Formula,
) -> Result<Decimal, CellFailure> {
    let cell = match source {
        Source::Column(index) => record.get(*index).cloned().unwrap_or(Cell::Empty),
        Source::Position(position) => PositionalFields::of(columns, record)
            .from_right(*position)
            .map_err(|_| CellFailure::RowTooShort)?,
    };
    let x = numeric_value(&cell).ok_or(CellFailure::NotANumber)?;
    let value = formula.evaluate(x).map_err(CellFailure::Eval)?;
    Ok(value.round_dp_with_strategy(RESULT_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

fn numeric_value(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Number(v) => Some(*v),
        Cell::Text(s) => parse_number(s),
        Cell::Numbers(_) | Cell::Empty => None,
    }
}

#[derive(Debug)]
enum CellFailure {
    RowTooShort,
    NotANumber,
    Eval(EvalFailure),
}

impl fmt::Display for CellFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellFailure::RowTooShort => write!(f, "row is too short for the position"),
            CellFailure::NotANumber => write!(f, "source value is not a number"),
            CellFailure::Eval(e) => write!(f, "{e}"),
        }
    }
}
