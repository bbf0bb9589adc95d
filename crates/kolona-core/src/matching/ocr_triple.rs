use super::numeric::parse_number;
use super::{columns, LineMatcher, MatchFailure};
use crate::model::{Cell, Column, ColumnKind, RawLine, Record};
use regex::Regex;
use std::sync::LazyLock;

/// Three numeric-looking groups closing the line. Groups accept any mix of
/// digits, "." and "," since OCR renders separators inconsistently. The
/// first group starts a word, so digits inside a product code stay in the
/// description.
static OCR_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)([\d.,]+)\s+([\d.,]+)\s+([\d.,]+)$").expect("valid OCR tail pattern")
});

/// Matches OCR lines ending in quantity, price and total. Everything left of
/// the three groups is the description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OcrTripleMatcher;

impl LineMatcher for OcrTripleMatcher {
    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new(columns::DESCRIPTION, ColumnKind::Text),
            Column::new(columns::QUANTITY, ColumnKind::Number),
            Column::new(columns::PRICE, ColumnKind::Number),
            Column::new(columns::TOTAL, ColumnKind::Number),
        ]
    }

    fn test(&self, line: &RawLine) -> bool {
        OCR_TAIL.is_match(line.to_text().trim())
    }

    fn parse(&self, line: &RawLine) -> Result<Record, MatchFailure> {
        let text = line.to_text();
        let text = text.trim();
        let caps = OCR_TAIL
            .captures(text)
            .ok_or_else(|| MatchFailure::new("no quantity/price/total at line end"))?;

        let start = caps.get(1).map(|m| m.start()).unwrap_or_default();
        let mut cells = vec![Cell::Text(text[..start].trim().to_string())];
        for i in 1..=3 {
            let group = caps.get(i).map(|m| m.as_str()).unwrap_or_default();
            let value = parse_number(group)
                .ok_or_else(|| MatchFailure::new(format!("'{group}' is not a number")))?;
            cells.push(Cell::Number(value));
        }

        Ok(Record::new(cells))
    }

    fn name(&self) -> &'static str {
        "ocr-triple"
    }
}
