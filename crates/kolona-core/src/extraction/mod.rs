pub mod ocr;
pub mod pdftotext;
pub mod segment;
pub mod xlsx;

use crate::error::KolonaError;
use std::process::{Command, Output};

/// Text lines extracted from a single page of a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub page_number: usize,
    pub lines: Vec<String>,
}

/// Pre-segmented rows of a single page, one `Vec` of cell texts per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRows {
    pub page_number: usize,
    pub rows: Vec<Vec<String>>,
}

/// Inclusive page window, 1-based. Unset ends mean the first or last page
/// of the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRange {
    pub first: Option<usize>,
    pub last: Option<usize>,
}

impl PageRange {
    pub fn new(first: Option<usize>, last: Option<usize>) -> Result<Self, KolonaError> {
        if first == Some(0) || last == Some(0) {
            return Err(KolonaError::Extraction("page numbers start at 1".into()));
        }
        if let (Some(f), Some(l)) = (first, last) {
            if f > l {
                return Err(KolonaError::Extraction(format!(
                    "first page {f} is after last page {l}"
                )));
            }
        }
        Ok(PageRange { first, last })
    }

    /// Number of the first page a tool will emit.
    pub fn first_page_number(&self) -> usize {
        self.first.unwrap_or(1)
    }

    /// `-f`/`-l` arguments understood by the poppler tools.
    pub(crate) fn poppler_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(first) = self.first {
            args.extend(["-f".to_string(), first.to_string()]);
        }
        if let Some(last) = self.last {
            args.extend(["-l".to_string(), last.to_string()]);
        }
        args
    }
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from PDF bytes, returning one PageContent per page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, KolonaError>;

    /// Extract table rows. Backends without a table detector fall back to
    /// splitting each layout line on runs of two or more spaces.
    fn extract_rows(&self, pdf_bytes: &[u8]) -> Result<Vec<PageRows>, KolonaError> {
        let pages = self.extract_pages(pdf_bytes)?;
        Ok(pages.iter().map(segment::segment_page).collect())
    }

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Run an external tool, mapping a missing binary and a non-zero exit to
/// their own errors.
pub(crate) fn run_tool(
    command: &mut Command,
    tool: &'static str,
    hint: &'static str,
) -> Result<Output, KolonaError> {
    let output = command.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            KolonaError::ToolNotFound { tool, hint }
        } else {
            KolonaError::Extraction(format!("{tool} failed: {e}"))
        }
    })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(KolonaError::ToolFailed { tool, code, stderr });
    }

    Ok(output)
}

pub(crate) const POPPLER_HINT: &str =
    "Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)";
