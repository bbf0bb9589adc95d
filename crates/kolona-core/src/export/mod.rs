pub mod layout;
pub mod sheet;

use crate::error::KolonaError;
use crate::model::Table;
use layout::LayoutOptions;
use sheet::SheetOptions;
use std::io::Write;
use std::path::Path;

/// Output document kinds, chosen from the destination's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Positioned page layout rendered as fixed-width text (`.txt`).
    Layout,
    /// Styled sheet written as CSV (`.csv`).
    Sheet,
    /// The table itself as JSON (`.json`).
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, KolonaError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("txt") => Ok(ExportFormat::Layout),
            Some("csv") => Ok(ExportFormat::Sheet),
            Some("json") => Ok(ExportFormat::Json),
            _ => Err(KolonaError::Export(format!(
                "cannot tell the export format of {}; use a .txt, .csv or .json file name",
                path.display()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub layout: LayoutOptions,
    pub sheet: SheetOptions,
    pub csv_delimiter: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            layout: LayoutOptions::default(),
            sheet: SheetOptions::default(),
            csv_delimiter: b',',
        }
    }
}

/// Render `table` in `format` and write it to `path`.
///
/// The bytes are staged in a temporary file in the destination directory
/// and renamed over `path` only once everything was written, so a failure
/// never leaves a partial file behind.
pub fn export_to_path(
    path: &Path,
    format: ExportFormat,
    table: &Table,
    options: &ExportOptions,
) -> Result<(), KolonaError> {
    let bytes = render(format, table, options)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| KolonaError::Export(format!("cannot stage {}: {e}", path.display())))?;
    staged
        .write_all(&bytes)
        .and_then(|_| staged.flush())
        .map_err(|e| KolonaError::Export(format!("cannot write {}: {e}", path.display())))?;
    staged
        .persist(path)
        .map_err(|e| KolonaError::Export(format!("cannot write {}: {}", path.display(), e.error)))?;

    tracing::info!(path = %path.display(), ?format, rows = table.len(), "exported table");
    Ok(())
}

fn render(format: ExportFormat, table: &Table, options: &ExportOptions) -> Result<Vec<u8>, KolonaError> {
    match format {
        ExportFormat::Layout => {
            let pages = layout::layout_pages(table, &options.layout);
            Ok(layout::render_text(&pages).into_bytes())
        }
        ExportFormat::Sheet => {
            let built = sheet::build_sheet(table, &options.sheet);
            let mut out = Vec::new();
            sheet::write_csv(&built, &mut out, options.csv_delimiter)
                .map_err(|e| KolonaError::Export(e.to_string()))?;
            Ok(out)
        }
        ExportFormat::Json => {
            serde_json::to_vec_pretty(table).map_err(|e| KolonaError::Export(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Column, ColumnKind, Record};
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn table() -> Table {
        Table::from_parts(
            vec![
                Column::new("Наименование", ColumnKind::Text),
                Column::new("Цена в евро", ColumnKind::Number),
            ],
            vec![Record::new(vec![
                Cell::Text("Widget A".into()),
                Cell::Number(dec!(1.23)),
            ])],
        )
        .unwrap()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ExportFormat::from_path(&PathBuf::from("out.CSV")).unwrap(),
            ExportFormat::Sheet
        );
        assert_eq!(
            ExportFormat::from_path(&PathBuf::from("a/b.txt")).unwrap(),
            ExportFormat::Layout
        );
        assert!(ExportFormat::from_path(&PathBuf::from("out.pdf")).is_err());
        assert!(ExportFormat::from_path(&PathBuf::from("out")).is_err());
    }

    #[test]
    fn test_export_each_format() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["t.txt", "t.csv", "t.json"] {
            let path = dir.path().join(name);
            let format = ExportFormat::from_path(&path).unwrap();
            export_to_path(&path, format, &table(), &ExportOptions::default()).unwrap();
            let text = std::fs::read_to_string(&path).unwrap();
            assert!(text.contains("Widget A"), "{name}");
        }

        let json = std::fs::read_to_string(dir.path().join("t.json")).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table());
    }

    #[test]
    fn test_failed_export_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = export_to_path(&path, ExportFormat::Sheet, &table(), &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(err, KolonaError::Export(_)));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "old").unwrap();
        export_to_path(&path, ExportFormat::Sheet, &table(), &ExportOptions::default()).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("Наименование"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
