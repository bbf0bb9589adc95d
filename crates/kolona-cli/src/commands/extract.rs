use kolona_core::error::KolonaError;
use kolona_core::extraction::ocr::OcrPipeline;
use kolona_core::extraction::pdftotext::PdftotextExtractor;
use kolona_core::extraction::xlsx::XlsxRowSource;
use kolona_core::extraction::PageRange;
use kolona_core::matching::ExtractionMode;
use kolona_core::ExtractOptions;
use std::path::{Path, PathBuf};

use crate::commands::transform;
use crate::output;
use crate::{OutputArgs, TransformArgs};

pub struct ExtractArgs {
    pub input_file: PathBuf,
    pub mode: ExtractionMode,
    pub skip_header: bool,
    pub ocr_lang: String,
    pub dpi: u32,
    pub first_page: Option<usize>,
    pub last_page: Option<usize>,
    pub sheet: Option<String>,
    pub transform: TransformArgs,
    pub output: OutputArgs,
}

pub fn run(args: ExtractArgs) -> Result<(), KolonaError> {
    // Reject bad transform flags before spending time on extraction.
    let spec = transform::resolve_spec(&args.transform)?;

    let bytes = std::fs::read(&args.input_file)?;
    let options = ExtractOptions {
        mode: args.mode,
        skip_header: args.skip_header,
    };

    let extraction = if is_xlsx(&args.input_file) {
        if args.mode == ExtractionMode::Ocr {
            return Err(KolonaError::Extraction(
                "the ocr mode needs a PDF input".into(),
            ));
        }
        let rows = row_source(args.sheet).read_rows(&bytes)?;
        kolona_core::extract_rows_table(rows, &options)?
    } else {
        let pages = PageRange::new(args.first_page, args.last_page)?;
        let extractor = PdftotextExtractor::with_pages(pages);
        let ocr = (args.mode == ExtractionMode::Ocr)
            .then(|| OcrPipeline::poppler_tesseract(args.dpi, pages, &args.ocr_lang));
        kolona_core::extract_table(&bytes, &extractor, ocr.as_ref(), &options)?
    };

    eprintln!(
        "Extracted {} row(s) from {} page(s) in {} mode",
        extraction.table.len(),
        extraction.pages,
        extraction.mode
    );
    if !extraction.skipped.is_empty() {
        eprintln!(
            "  {} line(s) did not match and were skipped (run with -vv to list them)",
            extraction.skipped.len()
        );
    }

    let table = match spec {
        Some(spec) => {
            let outcome = kolona_core::apply_transform(&extraction.table, &spec)?;
            transform::report(&spec, &outcome);
            outcome.table
        }
        None => extraction.table,
    };

    output::emit(&table, &args.output)
}

fn row_source(sheet: Option<String>) -> XlsxRowSource {
    match sheet {
        Some(name) => XlsxRowSource::with_sheet(name),
        None => XlsxRowSource::new(),
    }
}

fn is_xlsx(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_xlsx_by_extension() {
        assert!(is_xlsx(Path::new("prices.XLSX")));
        assert!(!is_xlsx(Path::new("invoice.pdf")));
        assert!(!is_xlsx(Path::new("xlsx")));
    }

    #[test]
    fn test_row_source_sheet_selection() {
        assert_eq!(row_source(None).sheet, None);
        assert_eq!(row_source(Some("Цени".into())).sheet.as_deref(), Some("Цени"));
    }
}
