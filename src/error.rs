use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Schema mismatch in {file}: {detail}")]
    SchemaMismatch {
        file: String,
        expected: Vec<String>,
        found: Vec<String>,
        detail: String,
    },

    #[error("Aborted by operator: table '{table}' already exists and was neither dropped nor appended to")]
    UserAbort { table: String },

    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    #[error("Write failure: {0}")]
    WriteFailure(String),

    #[error("Unmapped label '{label}' in {file} (row {row})")]
    UnmappedLabel {
        file: String,
        row: usize,
        label: String,
    },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error in {file}: {message}")]
    Csv { file: String, message: String },

    #[error("Malformed row {row} in {file}: expected {expected} fields, found {found}")]
    MalformedRow {
        file: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoadError {
    /// Errors scoped to a single input file. Everything else concerns the
    /// store or the run as a whole.
    pub fn is_file_scoped(&self) -> bool {
        matches!(
            self,
            LoadError::SchemaMismatch { .. }
                | LoadError::UnmappedLabel { .. }
                | LoadError::Csv { .. }
                | LoadError::MalformedRow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
