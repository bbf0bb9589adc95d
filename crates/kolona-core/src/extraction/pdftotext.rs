use crate::error::KolonaError;
use crate::extraction::{run_tool, PageContent, PageRange, PdfExtractor, POPPLER_HINT};
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` so that table columns stay separated by runs of
/// spaces, which both the line matchers and the gap segmenter rely on.
#[derive(Debug, Clone, Default)]
pub struct PdftotextExtractor {
    pub pages: PageRange,
}

impl PdftotextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: PageRange) -> Self {
        PdftotextExtractor { pages }
    }

    fn command(&self, pdf: &Path) -> Command {
        let mut command = Command::new("pdftotext");
        command
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .args(self.pages.poppler_args())
            .arg(pdf)
            .arg("-");
        command
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, KolonaError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| KolonaError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| KolonaError::Extraction(e.to_string()))?;

        let output = run_tool(&mut self.command(tmpfile.path()), "pdftotext", POPPLER_HINT)?;
        let text = String::from_utf8_lossy(&output.stdout);

        Ok(split_pages(&text, self.pages.first_page_number()))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Split pdftotext output into pages on form feeds.
///
/// pdftotext ends the last page with a form feed too, so an empty trailing
/// chunk is dropped. The first page is always kept.
fn split_pages(text: &str, first_page_number: usize) -> Vec<PageContent> {
    text.split('\x0c')
        .enumerate()
        .map(|(i, page_text)| PageContent {
            page_number: first_page_number + i,
            lines: page_text.lines().map(|l| l.to_string()).collect(),
        })
        .filter(|p| !p.lines.is_empty() || p.page_number == first_page_number)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_on_form_feed() {
        let text = "Фактура\nWidget A  1,00\x0cWidget B  2,00\n\x0c";
        let pages = split_pages(text, 1);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].lines, vec!["Фактура", "Widget A  1,00"]);
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(pages[1].lines, vec!["Widget B  2,00"]);
    }

    #[test]
    fn test_split_pages_respects_first_page() {
        let pages = split_pages("a\x0cb", 4);
        assert_eq!(pages[0].page_number, 4);
        assert_eq!(pages[1].page_number, 5);
    }

    #[test]
    fn test_command_passes_page_range() {
        let extractor = PdftotextExtractor::with_pages(PageRange::new(Some(2), Some(3)).unwrap());
        let command = extractor.command(Path::new("in.pdf"));
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["-layout", "-enc", "UTF-8", "-f", "2", "-l", "3", "in.pdf", "-"]
        );
    }

    #[test]
    fn test_empty_output_keeps_first_page() {
        let pages = split_pages("", 1);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].lines.is_empty());
    }
}
