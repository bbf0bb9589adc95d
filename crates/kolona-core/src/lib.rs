pub mod error;
pub mod export;
pub mod extraction;
pub mod matching;
pub mod model;
pub mod transform;

use error::KolonaError;
use extraction::ocr::OcrPipeline;
use extraction::{PageContent, PageRows, PdfExtractor};
use matching::assemble::assemble;
use matching::{ExtractionMode, LineSource};
use model::{RawLine, SkippedLine, SourceLine, Table};
use serde::Serialize;
use transform::{TransformOutcome, TransformSpec};

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub mode: ExtractionMode,
    /// Drop the first non-blank line (or row) of every page before matching.
    pub skip_header: bool,
}

/// A recovered table plus the lines that did not make it in.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub mode: ExtractionMode,
    pub table: Table,
    pub skipped: Vec<SkippedLine>,
    pub pages: usize,
}

/// Main API entry point: recover a line-item table from a PDF.
///
/// The mode picks both where lines come from (layout text, segmented rows
/// or OCR) and which matcher shapes them into records. `ocr` is only
/// consulted in [`ExtractionMode::Ocr`].
pub fn extract_table(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    ocr: Option<&OcrPipeline>,
    options: &ExtractOptions,
) -> Result<Extraction, KolonaError> {
    let (pages, lines, backend) = match options.mode.source() {
        LineSource::Text => {
            let pages = extractor.extract_pages(pdf_bytes)?;
            let lines = text_lines(&pages, options.skip_header);
            (pages.len(), lines, extractor.backend_name())
        }
        LineSource::Rows => {
            let rows = extractor.extract_rows(pdf_bytes)?;
            (rows.len(), row_lines(rows, options.skip_header), extractor.backend_name())
        }
        LineSource::Ocr => {
            let pipeline = ocr.ok_or_else(|| {
                KolonaError::Extraction("the ocr mode needs an OCR renderer and engine".into())
            })?;
            let pages = pipeline.extract_pages(pdf_bytes)?;
            let lines = text_lines(&pages, options.skip_header);
            (pages.len(), lines, pipeline.engine_name())
        }
    };

    tracing::info!(
        mode = %options.mode,
        backend,
        pages,
        lines = lines.len(),
        "extracted lines"
    );

    build_extraction(options.mode, pages, &lines)
}

/// Build a table from rows a caller already segmented, e.g. an xlsx sheet.
pub fn extract_rows_table(
    rows: Vec<PageRows>,
    options: &ExtractOptions,
) -> Result<Extraction, KolonaError> {
    let pages = rows.len();
    let lines = row_lines(rows, options.skip_header);
    build_extraction(options.mode, pages, &lines)
}

/// Derive a new column; see [`transform::apply`].
pub fn apply_transform(table: &Table, spec: &TransformSpec) -> Result<TransformOutcome, KolonaError> {
    transform::apply(table, spec)
}

fn build_extraction(
    mode: ExtractionMode,
    pages: usize,
    lines: &[SourceLine],
) -> Result<Extraction, KolonaError> {
    if lines.iter().all(|l| l.line.is_blank()) {
        return Err(KolonaError::EmptyExtraction);
    }

    let matcher = mode.matcher();
    let assembled = assemble(lines, &matcher)?;

    tracing::info!(
        mode = %mode,
        rows = assembled.table.len(),
        skipped = assembled.skipped.len(),
        "assembled table"
    );

    Ok(Extraction {
        mode,
        table: assembled.table,
        skipped: assembled.skipped,
        pages,
    })
}

fn text_lines(pages: &[PageContent], skip_header: bool) -> Vec<SourceLine> {
    let mut out = Vec::new();
    for page in pages {
        let lines = page.lines.iter().map(|l| RawLine::Text(l.clone())).collect();
        push_page(&mut out, page.page_number, lines, skip_header);
    }
    out
}

fn row_lines(pages: Vec<PageRows>, skip_header: bool) -> Vec<SourceLine> {
    let mut out = Vec::new();
    for page in pages {
        let lines = page.rows.into_iter().map(RawLine::Cells).collect();
        push_page(&mut out, page.page_number, lines, skip_header);
    }
    out
}

fn push_page(out: &mut Vec<SourceLine>, page_number: usize, lines: Vec<RawLine>, skip_header: bool) {
    let mut header_pending = skip_header;
    for line in lines {
        if header_pending && !line.is_blank() {
            header_pending = false;
            tracing::debug!(page = page_number, line = %line.to_text(), "dropped page header");
            continue;
        }
        out.push(SourceLine { page_number, line });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize, lines: &[&str]) -> PageContent {
        PageContent {
            page_number: n,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_skip_header_drops_first_non_blank_line_per_page() {
        let pages = vec![
            page(1, &["", "Header 1", "a"]),
            page(2, &["Header 2", "b"]),
        ];
        let lines = text_lines(&pages, true);
        let texts: Vec<String> = lines.iter().map(|l| l.line.to_text()).collect();
        assert_eq!(texts, vec!["", "a", "b"]);
        assert_eq!(lines[2].page_number, 2);
    }

    #[test]
    fn test_blank_document_is_empty_extraction() {
        let lines = text_lines(&[page(1, &["", "   "])], false);
        let err = build_extraction(ExtractionMode::Text, 1, &lines).unwrap_err();
        assert!(matches!(err, KolonaError::EmptyExtraction));
    }

    #[test]
    fn test_rows_table_from_cells() {
        let rows = vec![PageRows {
            page_number: 1,
            rows: vec![
                vec!["Артикул".into(), "Цени".into()],
                vec![
                    "Widget A".into(),
                    "1.00".into(),
                    "2.50".into(),
                    "2.30".into(),
                    "2.40".into(),
                    "0.10".into(),
                    "2.50".into(),
                ],
            ],
        }];
        let options = ExtractOptions {
            mode: ExtractionMode::Tables,
            skip_header: false,
        };
        let extraction = extract_rows_table(rows, &options).unwrap();
        assert_eq!(extraction.table.len(), 1);
        assert_eq!(extraction.skipped.len(), 1);
        assert_eq!(extraction.pages, 1);
    }
}
