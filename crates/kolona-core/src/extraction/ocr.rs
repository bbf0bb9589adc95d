//! OCR path for scanned documents: render each page to an image, then read
//! the image back as text lines.

use crate::error::KolonaError;
use crate::extraction::{run_tool, PageContent, PageRange, POPPLER_HINT};
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// One rendered page, as PNG bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub page_number: usize,
    pub png: Vec<u8>,
}

/// Turns a PDF into one image per page, in page order.
pub trait PageRenderer: Send + Sync {
    fn render_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageImage>, KolonaError>;
}

/// Reads the text lines of a page image.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &PageImage) -> Result<Vec<String>, KolonaError>;

    fn backend_name(&self) -> &str;
}

/// Renderer using `pdftoppm -png` (from poppler-utils).
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    pub dpi: u32,
    pub pages: PageRange,
}

pub const DEFAULT_DPI: u32 = 300;

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        PdftoppmRenderer::new(DEFAULT_DPI, PageRange::default())
    }
}

impl PdftoppmRenderer {
    pub fn new(dpi: u32, pages: PageRange) -> Self {
        PdftoppmRenderer { dpi, pages }
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageImage>, KolonaError> {
        let dir = tempfile::tempdir().map_err(|e| KolonaError::Extraction(e.to_string()))?;
        let input = dir.path().join("input.pdf");
        std::fs::write(&input, pdf_bytes).map_err(|e| KolonaError::Extraction(e.to_string()))?;

        let prefix = dir.path().join("page");
        run_tool(
            Command::new("pdftoppm")
                .arg("-png")
                .arg("-r")
                .arg(self.dpi.to_string())
                .args(self.pages.poppler_args())
                .arg(&input)
                .arg(&prefix),
            "pdftoppm",
            POPPLER_HINT,
        )?;

        let mut images = Vec::new();
        for entry in std::fs::read_dir(dir.path())? {
            let path = entry?.path();
            if let Some(page_number) = rendered_page_number(&path) {
                images.push(PageImage {
                    page_number,
                    png: std::fs::read(&path)?,
                });
            }
        }
        images.sort_by_key(|img| img.page_number);

        tracing::debug!(pages = images.len(), dpi = self.dpi, "rendered pages");
        Ok(images)
    }
}

/// Page number of a `pdftoppm` output file such as `page-07.png`.
/// pdftoppm zero-pads the number to the width of the last page number.
fn rendered_page_number(path: &Path) -> Option<usize> {
    if path.extension()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("page-")?.parse().ok()
}

/// OCR engine using the `tesseract` command line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    /// Tesseract language list, e.g. `bul+eng`.
    pub lang: String,
}

pub const DEFAULT_OCR_LANG: &str = "bul+eng";

impl Default for TesseractEngine {
    fn default() -> Self {
        TesseractEngine {
            lang: DEFAULT_OCR_LANG.to_string(),
        }
    }
}

impl TesseractEngine {
    pub fn new(lang: impl Into<String>) -> Self {
        TesseractEngine { lang: lang.into() }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &PageImage) -> Result<Vec<String>, KolonaError> {
        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| KolonaError::Extraction(e.to_string()))?;
        file.write_all(&image.png)
            .map_err(|e| KolonaError::Extraction(e.to_string()))?;

        let output = run_tool(
            Command::new("tesseract")
                .arg(file.path())
                .arg("stdout")
                .arg("-l")
                .arg(&self.lang),
            "tesseract",
            "Install tesseract with the needed language data: brew install tesseract tesseract-lang (macOS) or apt install tesseract-ocr tesseract-ocr-bul (Linux)",
        )?;

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }

    fn backend_name(&self) -> &str {
        "tesseract"
    }
}

/// Renderer plus engine, producing text pages for the OCR extraction mode.
pub struct OcrPipeline {
    renderer: Box<dyn PageRenderer>,
    engine: Box<dyn OcrEngine>,
}

impl OcrPipeline {
    pub fn new(renderer: Box<dyn PageRenderer>, engine: Box<dyn OcrEngine>) -> Self {
        OcrPipeline { renderer, engine }
    }

    /// `pdftoppm` at `dpi` over `pages` feeding `tesseract` with `lang`.
    pub fn poppler_tesseract(dpi: u32, pages: PageRange, lang: &str) -> Self {
        OcrPipeline::new(
            Box::new(PdftoppmRenderer::new(dpi, pages)),
            Box::new(TesseractEngine::new(lang)),
        )
    }

    pub fn engine_name(&self) -> &str {
        self.engine.backend_name()
    }

    /// OCR every page. Lines are trimmed and blank lines dropped.
    pub fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, KolonaError> {
        let images = self.renderer.render_pages(pdf_bytes)?;
        let mut pages = Vec::with_capacity(images.len());
        for image in &images {
            let lines = self
                .engine
                .recognize(image)?
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            pages.push(PageContent {
                page_number: image.page_number,
                lines,
            });
        }
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct TwoPages;

    impl PageRenderer for TwoPages {
        fn render_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageImage>, KolonaError> {
            Ok(vec![
                PageImage {
                    page_number: 1,
                    png: b"first".to_vec(),
                },
                PageImage {
                    page_number: 2,
                    png: b"second".to_vec(),
                },
            ])
        }
    }

    struct EchoEngine;

    impl OcrEngine for EchoEngine {
        fn recognize(&self, image: &PageImage) -> Result<Vec<String>, KolonaError> {
            let text = String::from_utf8_lossy(&image.png).to_string();
            Ok(vec![
                format!("  {text} 1 2,50 2,50  "),
                "".into(),
                "   ".into(),
            ])
        }

        fn backend_name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_pipeline_trims_and_drops_blank_lines() {
        let pipeline = OcrPipeline::new(Box::new(TwoPages), Box::new(EchoEngine));
        let pages = pipeline.extract_pages(b"%PDF").unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].lines, vec!["first 1 2,50 2,50"]);
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(pages[1].lines, vec!["second 1 2,50 2,50"]);
        assert_eq!(pipeline.engine_name(), "echo");
    }

    #[test]
    fn test_rendered_page_number() {
        assert_eq!(rendered_page_number(&PathBuf::from("/t/page-1.png")), Some(1));
        assert_eq!(rendered_page_number(&PathBuf::from("/t/page-012.png")), Some(12));
        assert_eq!(rendered_page_number(&PathBuf::from("/t/input.pdf")), None);
        assert_eq!(rendered_page_number(&PathBuf::from("/t/page-x.png")), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PdftoppmRenderer::default().dpi, 300);
        assert_eq!(PdftoppmRenderer::default().pages, PageRange::default());
        assert_eq!(TesseractEngine::default().lang, "bul+eng");
    }
}
