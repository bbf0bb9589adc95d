pub mod json;
pub mod table;

use crate::{OutputArgs, OutputFormat};
use kolona_core::error::KolonaError;
use kolona_core::export::{self, ExportFormat, ExportOptions};
use kolona_core::model::Table;

/// Print `table` on stdout and write the export file if one was asked for.
pub fn emit(table: &Table, args: &OutputArgs) -> Result<(), KolonaError> {
    match args.output {
        OutputFormat::Json => json::print(table)?,
        OutputFormat::Table => table::print(table),
    }

    if let Some(path) = &args.export {
        let format = ExportFormat::from_path(path)?;
        let delimiter = u8::try_from(args.delimiter).map_err(|_| {
            KolonaError::Export(format!("delimiter '{}' is not a single-byte character", args.delimiter))
        })?;
        let options = ExportOptions {
            csv_delimiter: delimiter,
            ..ExportOptions::default()
        };
        export::export_to_path(path, format, table, &options)?;
        eprintln!("Written {} row(s) to {}", table.len(), path.display());
    }

    Ok(())
}
