use super::numeric::{classify, parse_number};
use super::{columns, LineMatcher, MatchFailure};
use crate::model::{Cell, Column, ColumnKind, RawLine, Record};
use regex::Regex;
use std::sync::LazyLock;

const FIELD_COUNT: usize = 6;

static FIXED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    let num = r"(-?\d+(?:[.,]\d+)?)";
    Regex::new(&format!(
        r"^(.+?)\s+{num}\s+{num}\s+{num}\s+{num}\s+{num}\s+{num}$"
    ))
    .expect("valid fixed-arity pattern")
});

/// Matches the rigid price-list layout: a label followed by exactly six
/// numeric fields (quantity, price incl. tax, price excl. tax, average,
/// markup, total).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedArityMatcher;

impl FixedArityMatcher {
    const FIELDS: [&'static str; FIELD_COUNT] = [
        columns::QUANTITY,
        columns::PRICE_INCL_TAX,
        columns::PRICE_EXCL_TAX,
        columns::AVERAGE,
        columns::MARKUP,
        columns::TOTAL,
    ];
}

impl LineMatcher for FixedArityMatcher {
    fn columns(&self) -> Vec<Column> {
        let mut cols = vec![Column::new(columns::LABEL, ColumnKind::Text)];
        cols.extend(
            Self::FIELDS
                .iter()
                .map(|name| Column::new(*name, ColumnKind::Number)),
        );
        cols
    }

    fn test(&self, line: &RawLine) -> bool {
        match line {
            RawLine::Text(text) => FIXED_LINE.is_match(text.trim()),
            RawLine::Cells(cells) => {
                cells.len() == FIELD_COUNT + 1
                    && cells[1..].iter().all(|c| parse_number(c).is_some())
            }
        }
    }

    fn parse(&self, line: &RawLine) -> Result<Record, MatchFailure> {
        let (label, fields): (String, Vec<&str>) = match line {
            RawLine::Text(text) => {
                let caps = FIXED_LINE
                    .captures(text.trim())
                    .ok_or_else(|| MatchFailure::new("not a label followed by six numbers"))?;
                let label = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
                let fields = (2..=FIELD_COUNT + 1)
                    .filter_map(|i| caps.get(i).map(|m| m.as_str()))
                    .collect();
                (label.to_string(), fields)
            }
            RawLine::Cells(cells) => {
                if cells.len() != FIELD_COUNT + 1 {
                    return Err(MatchFailure::new(format!(
                        "row has {} cell(s), expected {}",
                        cells.len(),
                        FIELD_COUNT + 1
                    )));
                }
                (
                    cells[0].trim().to_string(),
                    cells[1..].iter().map(|c| c.trim()).collect(),
                )
            }
        };

        // A numeric last word means the line carried extra fields that the
        // lazy label swallowed.
        if let Some(last) = label.split_whitespace().last() {
            if classify(last).is_numeric() {
                return Err(MatchFailure::new("more than six numeric fields"));
            }
        }
        if label.is_empty() {
            return Err(MatchFailure::new("missing label"));
        }

        let mut cells = vec![Cell::Text(label)];
        for field in fields {
            let value = parse_number(field)
                .ok_or_else(|| MatchFailure::new(format!("'{field}' is not a number")))?;
            cells.push(Cell::Number(value));
        }
        if cells.len() != FIELD_COUNT + 1 {
            return Err(MatchFailure::new("expected exactly six numeric fields"));
        }

        Ok(Record::new(cells))
    }

    fn name(&self) -> &'static str {
        "fixed-arity"
    }
}
