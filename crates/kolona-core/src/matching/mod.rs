pub mod assemble;
pub mod fixed_arity;
pub mod minimal_tail;
pub mod numeric;
pub mod ocr_triple;
pub mod trailing_run;

use crate::model::{Column, RawLine, Record};
use fixed_arity::FixedArityMatcher;
use minimal_tail::MinimalTailMatcher;
use ocr_triple::OcrTripleMatcher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trailing_run::TrailingRunMatcher;

/// Column names produced by the matchers.
pub mod columns {
    pub const LABEL: &str = "Наименование";
    pub const DESCRIPTION: &str = "Описание";
    pub const NUMBERS: &str = "Числа";
    pub const QUANTITY: &str = "Количество";
    pub const PRICE_INCL_TAX: &str = "Цена с ДДС";
    pub const PRICE_EXCL_TAX: &str = "Цена без ДДС";
    pub const AVERAGE: &str = "Средна цена";
    pub const MARKUP: &str = "Надценка";
    pub const UNIT_PRICE: &str = "Единична цена";
    pub const PRICE: &str = "Цена";
    pub const TOTAL: &str = "Сума";
}

/// Why a line was not turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct MatchFailure {
    pub reason: String,
}

impl MatchFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        MatchFailure {
            reason: reason.into(),
        }
    }
}

/// A strategy that recognizes one line shape and parses it into a record.
pub trait LineMatcher {
    /// Schema of every record this matcher produces.
    fn columns(&self) -> Vec<Column>;

    /// Cheap shape check.
    fn test(&self, line: &RawLine) -> bool;

    /// Parse a line into a record with exactly `columns().len()` cells.
    fn parse(&self, line: &RawLine) -> Result<Record, MatchFailure>;

    /// Name of this strategy (for diagnostics).
    fn name(&self) -> &'static str;
}

/// The closed set of matching strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    TrailingRun(TrailingRunMatcher),
    FixedArity(FixedArityMatcher),
    MinimalTail(MinimalTailMatcher),
    OcrTriple(OcrTripleMatcher),
}

impl Matcher {
    fn inner(&self) -> &dyn LineMatcher {
        match self {
            Matcher::TrailingRun(m) => m,
            Matcher::FixedArity(m) => m,
            Matcher::MinimalTail(m) => m,
            Matcher::OcrTriple(m) => m,
        }
    }
}

impl LineMatcher for Matcher {
    fn columns(&self) -> Vec<Column> {
        self.inner().columns()
    }

    fn test(&self, line: &RawLine) -> bool {
        self.inner().test(line)
    }

    fn parse(&self, line: &RawLine) -> Result<Record, MatchFailure> {
        self.inner().parse(line)
    }

    fn name(&self) -> &'static str {
        self.inner().name()
    }
}

/// Where the lines of a run come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSource {
    /// Page text, one line at a time.
    Text,
    /// Rows pre-segmented into cells.
    Rows,
    /// Text recognized from rendered page images.
    Ocr,
}

/// Extraction mode chosen by the user. Fixes both the line source and the
/// single matcher applied to every line of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Native text, lines ending in a run of six or more prices.
    #[default]
    Text,
    /// Native text with the rigid label + six fields layout.
    Columns,
    /// Pre-segmented table rows ending in a run of six or more prices.
    Tables,
    /// Native text, loosest tail heuristic.
    Loose,
    /// Scanned pages through OCR, description + quantity/price/total.
    Ocr,
}

impl ExtractionMode {
    pub const ALL: [ExtractionMode; 5] = [
        ExtractionMode::Text,
        ExtractionMode::Columns,
        ExtractionMode::Tables,
        ExtractionMode::Loose,
        ExtractionMode::Ocr,
    ];

    pub fn matcher(self) -> Matcher {
        match self {
            ExtractionMode::Text | ExtractionMode::Tables => {
                Matcher::TrailingRun(TrailingRunMatcher)
            }
            ExtractionMode::Columns => Matcher::FixedArity(FixedArityMatcher),
            ExtractionMode::Loose => Matcher::MinimalTail(MinimalTailMatcher),
            ExtractionMode::Ocr => Matcher::OcrTriple(OcrTripleMatcher),
        }
    }

    pub fn source(self) -> LineSource {
        match self {
            ExtractionMode::Text | ExtractionMode::Columns | ExtractionMode::Loose => {
                LineSource::Text
            }
            ExtractionMode::Tables => LineSource::Rows,
            ExtractionMode::Ocr => LineSource::Ocr,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMode::Text => "text",
            ExtractionMode::Columns => "columns",
            ExtractionMode::Tables => "tables",
            ExtractionMode::Loose => "loose",
            ExtractionMode::Ocr => "ocr",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ExtractionMode::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = ExtractionMode::ALL.iter().map(|m| m.as_str()).collect();
                format!("unknown extraction mode '{s}'. Available: {}", names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selects_one_matcher() {
        assert_eq!(ExtractionMode::Text.matcher().name(), "trailing-run");
        assert_eq!(ExtractionMode::Tables.matcher().name(), "trailing-run");
        assert_eq!(ExtractionMode::Columns.matcher().name(), "fixed-arity");
        assert_eq!(ExtractionMode::Loose.matcher().name(), "minimal-tail");
        assert_eq!(ExtractionMode::Ocr.matcher().name(), "ocr-triple");
    }

    #[test]
    fn test_mode_sources() {
        assert_eq!(ExtractionMode::Tables.source(), LineSource::Rows);
        assert_eq!(ExtractionMode::Ocr.source(), LineSource::Ocr);
        assert_eq!(ExtractionMode::Loose.source(), LineSource::Text);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("OCR".parse::<ExtractionMode>(), Ok(ExtractionMode::Ocr));
        assert!("pdfplumber".parse::<ExtractionMode>().is_err());
    }

    #[test]
    fn test_every_schema_starts_with_text() {
        for mode in ExtractionMode::ALL {
            let cols = mode.matcher().columns();
            assert_eq!(cols[0].kind, crate::model::ColumnKind::Text, "{mode}");
        }
    }
}
