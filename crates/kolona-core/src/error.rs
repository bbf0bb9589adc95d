use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum KolonaError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("{tool} not found. {hint}")]
    ToolNotFound { tool: &'static str, hint: &'static str },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("no table found: the document produced no text lines or rows")]
    EmptyExtraction,

    #[error("no table found: no line matched the {matcher} matcher. Try a different extraction mode")]
    EmptyTable { matcher: String },

    #[error("column position {position} is out of range for a row with {width} field(s)")]
    PositionOutOfRange { position: usize, width: usize },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{0}' already exists (pass --replace to overwrite it)")]
    ColumnExists(String),

    #[error("invalid column name: {0}")]
    InvalidColumnName(String),

    #[error("record has {found} cell(s) but the table has {expected} column(s)")]
    RaggedRecord { expected: usize, found: usize },

    #[error("failed to load preset from {path}: {reason}")]
    PresetLoad { path: PathBuf, reason: String },

    #[error("invalid preset: {0}")]
    PresetInvalid(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
