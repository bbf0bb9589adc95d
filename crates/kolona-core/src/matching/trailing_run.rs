use super::numeric::{classify, is_two_place_decimal};
use super::{columns, LineMatcher, MatchFailure};
use crate::model::{Cell, Column, ColumnKind, RawLine, Record};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;

/// Minimum length of the trailing run of numbers.
pub const MIN_TRAILING_NUMBERS: usize = 6;

/// Six or more two-place decimals separated by whitespace, ending the line.
static TRAILING_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+[.,]\d{2}\s+){5,}\d+[.,]\d{2}$").expect("valid trailing-run pattern")
});

/// Matches price-list lines that end in a run of at least six numbers.
///
/// The run is split off right to left, so a label like "Widget A" keeps
/// every word up to the first number of the tail. A label that itself ends
/// in a number is absorbed into the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrailingRunMatcher;

impl LineMatcher for TrailingRunMatcher {
    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new(columns::LABEL, ColumnKind::Text),
            Column::new(columns::NUMBERS, ColumnKind::NumberList),
        ]
    }

    fn test(&self, line: &RawLine) -> bool {
        match line {
            RawLine::Text(text) => TRAILING_RUN.is_match(text.trim()),
            RawLine::Cells(cells) => {
                let (_, run) = split_trailing_cells(cells, is_two_place_decimal);
                run.len() >= MIN_TRAILING_NUMBERS
            }
        }
    }

    fn parse(&self, line: &RawLine) -> Result<Record, MatchFailure> {
        let (label, numbers) = match line {
            RawLine::Text(text) => {
                let pieces: Vec<&str> = text.split_whitespace().collect();
                split_trailing_numbers(&pieces)
            }
            RawLine::Cells(cells) => {
                let (label, run) =
                    split_trailing_cells(cells, |t| classify(t).as_number().is_some());
                let numbers = run.iter().filter_map(|t| classify(t).as_number()).collect();
                (label, numbers)
            }
        };
        if numbers.len() < MIN_TRAILING_NUMBERS {
            return Err(MatchFailure::new(format!(
                "only {} trailing number(s), need at least {MIN_TRAILING_NUMBERS}",
                numbers.len()
            )));
        }

        Ok(Record::new(vec![
            Cell::Text(label.join(" ")),
            Cell::Numbers(numbers),
        ]))
    }

    fn name(&self) -> &'static str {
        "trailing-run"
    }
}

/// Scan right to left, collecting numbers until the first non-numeric piece.
/// Returns the leading pieces and the numbers in their original order.
fn split_trailing_numbers<'a>(pieces: &[&'a str]) -> (Vec<&'a str>, Vec<Decimal>) {
    let mut numbers = Vec::new();
    let mut boundary = pieces.len();

    for (i, piece) in pieces.iter().enumerate().rev() {
        match classify(piece).as_number() {
            Some(v) => {
                numbers.push(v);
                boundary = i;
            }
            None => break,
        }
    }

    numbers.reverse();
    (pieces[..boundary].to_vec(), numbers)
}

/// Segmented rows keep single-spaced numbers together in one cell, so the
/// run is collected from the whitespace tokens of the trailing cells. A cell
/// holding anything but numbers ends the run and stays whole in the label.
fn split_trailing_cells<'a>(
    cells: &'a [String],
    is_number: impl Fn(&str) -> bool,
) -> (Vec<&'a str>, Vec<&'a str>) {
    let filled: Vec<&str> = cells
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();

    let mut run = Vec::new();
    let mut boundary = filled.len();
    for (i, cell) in filled.iter().copied().enumerate().rev() {
        let mut tokens: Vec<&str> = cell.split_whitespace().collect();
        if !tokens.iter().all(|t| is_number(t)) {
            break;
        }
        tokens.append(&mut run);
        run = tokens;
        boundary = i;
    }

    (filled[..boundary].to_vec(), run)
}
