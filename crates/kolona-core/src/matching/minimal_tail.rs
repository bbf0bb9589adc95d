use super::numeric::parse_number;
use super::{columns, LineMatcher, MatchFailure};
use crate::model::{Cell, Column, ColumnKind, RawLine, Record};
use regex::Regex;
use std::sync::LazyLock;

static HAS_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+[.,]\d{2}").expect("valid decimal pattern"));

/// Loosest strategy: any line holding a two-place decimal is a candidate,
/// and the last four tokens are read positionally as quantity, two price
/// fields and a total.
///
/// Nothing checks that the tail really is quantity/price/total, so lines
/// with a different trailing layout parse into the wrong columns. Only
/// meant for documents where no pre-segmented rows are available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinimalTailMatcher;

const TAIL: usize = 4;

impl LineMatcher for MinimalTailMatcher {
    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new(columns::LABEL, ColumnKind::Text),
            Column::new(columns::QUANTITY, ColumnKind::Number),
            Column::new(columns::UNIT_PRICE, ColumnKind::Number),
            Column::new(columns::PRICE, ColumnKind::Number),
            Column::new(columns::TOTAL, ColumnKind::Number),
        ]
    }

    fn test(&self, line: &RawLine) -> bool {
        HAS_DECIMAL.is_match(&line.to_text())
    }

    fn parse(&self, line: &RawLine) -> Result<Record, MatchFailure> {
        let tokens = line.tokens();
        if tokens.len() <= TAIL {
            return Err(MatchFailure::new(format!(
                "{} token(s), need a label and {TAIL} trailing fields",
                tokens.len()
            )));
        }

        let split = tokens.len() - TAIL;
        let mut cells = vec![Cell::Text(tokens[..split].join(" "))];
        for token in &tokens[split..] {
            let value = parse_number(token)
                .ok_or_else(|| MatchFailure::new(format!("'{token}' is not a number")))?;
            cells.push(Cell::Number(value));
        }

        Ok(Record::new(cells))
    }

    fn name(&self) -> &'static str {
        "minimal-tail"
    }
}
