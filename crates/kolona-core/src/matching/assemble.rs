use super::LineMatcher;
use crate::error::KolonaError;
use crate::model::{SkippedLine, SourceLine, Table};

/// Result of running one matcher over every line of a document.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub table: Table,
    /// Non-blank lines the matcher rejected, in input order.
    pub skipped: Vec<SkippedLine>,
}

/// Build a table by applying `matcher` to each line in order.
///
/// Lines that fail `test` or `parse` are dropped from the table and listed
/// in `skipped`; they are never an error on their own. The schema comes
/// from the matcher, so every record has the same columns.
pub fn assemble(lines: &[SourceLine], matcher: &dyn LineMatcher) -> Result<Assembled, KolonaError> {
    let mut table = Table::new(matcher.columns());
    let mut skipped = Vec::new();

    for source in lines {
        if source.line.is_blank() {
            continue;
        }

        if !matcher.test(&source.line) {
            tracing::debug!(
                page = source.page_number,
                line = %source.line.to_text(),
                "line does not have the {} shape",
                matcher.name()
            );
            skipped.push(SkippedLine {
                page_number: source.page_number,
                text: source.line.to_text(),
                reason: format!("does not have the {} shape", matcher.name()),
            });
            continue;
        }

        match matcher.parse(&source.line) {
            Ok(record) => table.push(record)?,
            Err(failure) => {
                tracing::debug!(
                    page = source.page_number,
                    line = %source.line.to_text(),
                    reason = %failure,
                    "line rejected by {}",
                    matcher.name()
                );
                skipped.push(SkippedLine {
                    page_number: source.page_number,
                    text: source.line.to_text(),
                    reason: failure.reason,
                });
            }
        }
    }

    if table.is_empty() {
        return Err(KolonaError::EmptyTable {
            matcher: matcher.name().to_string(),
        });
    }

    tracing::debug!(
        matcher = matcher.name(),
        rows = table.len(),
        skipped = skipped.len(),
        "assembled table"
    );

    Ok(Assembled { table, skipped })
}
