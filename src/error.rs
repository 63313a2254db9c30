use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No input files found matching {0}")]
    NoInputFiles(String),

    #[error("{file}: missing required column '{column}'")]
    MissingColumn { file: String, column: String },

    #[error("Column '{0}' would appear twice in the player table")]
    DuplicateColumn(String),

    #[error("Invalid slot label '{0}': expected a team marker followed by an integer ordinal")]
    InvalidSlot(String),

    #[error("Name dictionary not loaded; load it before enriching records")]
    DictionaryNotLoaded,

    #[error("Column '{0}' is not populated; enrich the records with display names first")]
    ColumnNotPopulated(&'static str),

    #[error("Key '{0}' is not part of this aggregation")]
    KeyNotInAggregation(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("CSV error in {file}: {message}")]
    CsvError { file: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn csv(file: &std::path::Path, err: csv::Error) -> Self {
        AppError::CsvError {
            file: file.display().to_string(),
            message: err.to_string(),
        }
    }
}
