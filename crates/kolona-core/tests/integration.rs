//! Integration tests for the extract -> transform -> export pipeline.
//!
//! Uses a MockExtractor that returns pre-built PageContent without
//! invoking pdftotext, and a mock renderer/engine pair for the OCR path,
//! so these tests run without poppler-utils or tesseract.

use kolona_core::error::KolonaError;
use kolona_core::export::{export_to_path, ExportFormat, ExportOptions};
use kolona_core::extraction::ocr::{OcrEngine, OcrPipeline, PageImage, PageRenderer};
use kolona_core::extraction::{PageContent, PdfExtractor};
use kolona_core::matching::ExtractionMode;
use kolona_core::model::Cell;
use kolona_core::transform::presets::load_preset;
use kolona_core::transform::{CollisionPolicy, ColumnPosition, SourceSelector, TransformSpec};
use kolona_core::{apply_transform, extract_table, ExtractOptions};
use rust_decimal_macros::dec;

struct MockExtractor {
    pages: Vec<PageContent>,
}

impl PdfExtractor for MockExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageContent>, KolonaError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

fn page(number: usize, lines: &[&str]) -> PageContent {
    PageContent {
        page_number: number,
        lines: lines.iter().map(|s| s.to_string()).collect(),
    }
}

fn options(mode: ExtractionMode) -> ExtractOptions {
    ExtractOptions {
        mode,
        skip_header: false,
    }
}

fn invoice() -> MockExtractor {
    MockExtractor {
        pages: vec![
            page(
                1,
                &[
                    "ФАКТУРА № 0000123                 Дата: 01.03.2024",
                    "Доставчик: Примерна ЕООД",
                    "",
                    "Widget A  1,00 2,50 2,30 2,40 0,10 2,50",
                    "Widget B  2,00 3,50 3,30 3,40 0,20 7,00",
                ],
            ),
            page(
                2,
                &[
                    "Продължение",
                    "Болт М8х40  10,00 0,25 0,21 0,24 0,01 2,50",
                    "Общо:  12,00",
                ],
            ),
        ],
    }
}

fn by_position(position: usize, formula: &str, column: &str) -> TransformSpec {
    TransformSpec {
        source: SourceSelector::Position(ColumnPosition::new(position).unwrap()),
        formula: formula.into(),
        column: column.into(),
        on_collision: CollisionPolicy::Reject,
    }
}

// ---------------------------------------------------------------------------
// Extraction in text mode: trailing numeric runs across pages
// ---------------------------------------------------------------------------
#[test]
fn text_mode_extracts_trailing_runs_in_order() {
    let extraction =
        extract_table(&[], &invoice(), None, &options(ExtractionMode::Text)).unwrap();

    assert_eq!(extraction.pages, 2);
    assert_eq!(extraction.table.column_names(), vec!["Наименование", "Числа"]);
    assert_eq!(extraction.table.len(), 3);

    let first = &extraction.table.rows()[0];
    assert_eq!(first.get(0), Some(&Cell::Text("Widget A".into())));
    assert_eq!(
        first.get(1),
        Some(&Cell::Numbers(vec![
            dec!(1.00),
            dec!(2.50),
            dec!(2.30),
            dec!(2.40),
            dec!(0.10),
            dec!(2.50)
        ]))
    );
    assert_eq!(
        extraction.table.rows()[2].get(0),
        Some(&Cell::Text("Болт М8х40".into()))
    );

    // Header, supplier, "Продължение" and the total line.
    assert_eq!(extraction.skipped.len(), 4);
    assert!(extraction.skipped.iter().any(|s| s.page_number == 2));
}

// ---------------------------------------------------------------------------
// Extraction followed by the default euro conversion
// ---------------------------------------------------------------------------
#[test]
fn extract_then_convert_to_euro() {
    let extraction =
        extract_table(&[], &invoice(), None, &options(ExtractionMode::Text)).unwrap();
    let spec = load_preset("bgn-eur")
        .unwrap()
        .to_spec(CollisionPolicy::Reject)
        .unwrap();

    let outcome = apply_transform(&extraction.table, &spec).unwrap();
    assert_eq!(outcome.computed, 3);
    assert_eq!(outcome.empty, 0);

    let euro: Vec<&Cell> = outcome.table.column_values(2).collect();
    assert_eq!(euro[0], &Cell::Number(dec!(1.23)));
    assert_eq!(euro[1], &Cell::Number(dec!(1.74)));
    assert_eq!(euro[2], &Cell::Number(dec!(0.12)));

    // The extracted table is untouched.
    assert_eq!(extraction.table.columns().len(), 2);
}

// ---------------------------------------------------------------------------
// Nothing matches: no table, no transform, no export
// ---------------------------------------------------------------------------
#[test]
fn no_matching_lines_is_empty_table() {
    let extractor = MockExtractor {
        pages: vec![page(1, &["ФАКТУРА № 0000123", "Общо: 12,00"])],
    };
    let err = extract_table(&[], &extractor, None, &options(ExtractionMode::Text)).unwrap_err();
    assert!(matches!(err, KolonaError::EmptyTable { .. }));
}

#[test]
fn blank_document_is_empty_extraction() {
    let extractor = MockExtractor {
        pages: vec![page(1, &[]), page(2, &["   "])],
    };
    let err = extract_table(&[], &extractor, None, &options(ExtractionMode::Text)).unwrap_err();
    assert!(matches!(err, KolonaError::EmptyExtraction));
}

// ---------------------------------------------------------------------------
// Hostile formula: every derived cell empty, never an error
// ---------------------------------------------------------------------------
#[test]
fn hostile_formula_yields_empty_column() {
    let extraction =
        extract_table(&[], &invoice(), None, &options(ExtractionMode::Text)).unwrap();
    let outcome = apply_transform(
        &extraction.table,
        &by_position(3, "__import__('os')", "Цена в евро"),
    )
    .unwrap();

    assert_eq!(outcome.computed, 0);
    assert!(outcome.table.column_values(2).all(Cell::is_empty));
}

// ---------------------------------------------------------------------------
// Tables mode: default gap segmentation of layout lines
// ---------------------------------------------------------------------------
#[test]
fn tables_mode_uses_segmented_rows() {
    let extractor = MockExtractor {
        pages: vec![page(
            1,
            &[
                "Артикул              Кол.   Цени",
                "Кабел ПВ-А1 2.5      1.00   2.50   2.30   2.40   0.10   2.50",
            ],
        )],
    };
    let extraction =
        extract_table(&[], &extractor, None, &options(ExtractionMode::Tables)).unwrap();
    assert_eq!(extraction.table.len(), 1);
    assert_eq!(
        extraction.table.rows()[0].get(0),
        Some(&Cell::Text("Кабел ПВ-А1 2.5".into()))
    );
}

#[test]
fn tables_mode_reads_single_spaced_number_run() {
    let extraction =
        extract_table(&[], &invoice(), None, &options(ExtractionMode::Tables)).unwrap();
    assert_eq!(extraction.table.len(), 3);

    let first = &extraction.table.rows()[0];
    assert_eq!(first.get(0), Some(&Cell::Text("Widget A".into())));
    assert_eq!(
        first.get(1),
        Some(&Cell::Numbers(vec![
            dec!(1.00),
            dec!(2.50),
            dec!(2.30),
            dec!(2.40),
            dec!(0.10),
            dec!(2.50)
        ]))
    );
    assert_eq!(
        extraction.table.rows()[2].get(0),
        Some(&Cell::Text("Болт М8х40".into()))
    );
}

// ---------------------------------------------------------------------------
// Columns mode with skip_header dropping repeated page headings
// ---------------------------------------------------------------------------
#[test]
fn columns_mode_with_skip_header() {
    let extractor = MockExtractor {
        pages: vec![
            page(
                1,
                &[
                    "Артикул 1 2 3 4 5 6",
                    "Болт М8 10 0,30 0,25 0,28 20 3,00",
                ],
            ),
            page(
                2,
                &[
                    "Артикул 1 2 3 4 5 6",
                    "Шайба М8 100 0,05 0,04 0,05 25 5,00",
                ],
            ),
        ],
    };

    let with_headers =
        extract_table(&[], &extractor, None, &options(ExtractionMode::Columns)).unwrap();
    assert_eq!(with_headers.table.len(), 4);

    let opts = ExtractOptions {
        mode: ExtractionMode::Columns,
        skip_header: true,
    };
    let extraction = extract_table(&[], &extractor, None, &opts).unwrap();
    assert_eq!(extraction.table.len(), 2);
    assert_eq!(extraction.table.columns().len(), 7);
    assert_eq!(
        extraction.table.rows()[1].get(6),
        Some(&Cell::Number(dec!(5.00)))
    );
}

// ---------------------------------------------------------------------------
// OCR mode through a mock renderer and engine
// ---------------------------------------------------------------------------
struct OnePage;

impl PageRenderer for OnePage {
    fn render_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageImage>, KolonaError> {
        Ok(vec![PageImage {
            page_number: 1,
            png: Vec::new(),
        }])
    }
}

struct ScannedInvoice;

impl OcrEngine for ScannedInvoice {
    fn recognize(&self, _image: &PageImage) -> Result<Vec<String>, KolonaError> {
        Ok(vec![
            "  ФАКТУРА 0000123 ".into(),
            "".into(),
            " Болт М8 10 0,25 2,50 ".into(),
            "Шайба М8 100 0.05 5.00".into(),
        ])
    }

    fn backend_name(&self) -> &str {
        "scripted"
    }
}

#[test]
fn ocr_mode_reads_description_and_triple() {
    let pipeline = OcrPipeline::new(Box::new(OnePage), Box::new(ScannedInvoice));
    let extractor = MockExtractor { pages: vec![] };
    let extraction = extract_table(
        &[],
        &extractor,
        Some(&pipeline),
        &options(ExtractionMode::Ocr),
    )
    .unwrap();

    assert_eq!(extraction.table.len(), 2);
    let first = &extraction.table.rows()[0];
    assert_eq!(first.get(0), Some(&Cell::Text("Болт М8".into())));
    assert_eq!(first.get(3), Some(&Cell::Number(dec!(2.50))));

    // Position 1 on a schema without a number run addresses the last cell.
    let outcome = apply_transform(&extraction.table, &by_position(1, "x * 1.2", "С ДДС")).unwrap();
    assert_eq!(
        outcome.table.rows()[1].get(4),
        Some(&Cell::Number(dec!(6.00)))
    );
}

#[test]
fn ocr_mode_without_pipeline_fails() {
    let err = extract_table(&[], &invoice(), None, &options(ExtractionMode::Ocr)).unwrap_err();
    assert!(matches!(err, KolonaError::Extraction(_)));
}

// ---------------------------------------------------------------------------
// Export of the augmented table
// ---------------------------------------------------------------------------
#[test]
fn export_augmented_table_as_csv() {
    let extraction =
        extract_table(&[], &invoice(), None, &options(ExtractionMode::Text)).unwrap();
    let outcome =
        apply_transform(&extraction.table, &by_position(3, "x / 1.95583", "Цена в евро")).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invoice.csv");
    export_to_path(
        &path,
        ExportFormat::Sheet,
        &outcome.table,
        &ExportOptions::default(),
    )
    .unwrap();

    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Наименование,Числа,Цена в евро");
    assert_eq!(lines[1], "Widget A,1.00 2.50 2.30 2.40 0.10 2.50,1.23");
    assert_eq!(lines.len(), 4);
}

#[test]
fn export_layout_places_header_once() {
    let extraction =
        extract_table(&[], &invoice(), None, &options(ExtractionMode::Text)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invoice.txt");
    export_to_path(
        &path,
        ExportFormat::Layout,
        &extraction.table,
        &ExportOptions::default(),
    )
    .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("Наименование").count(), 1);
    assert!(text.contains("Widget A"));
}
