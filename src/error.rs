use thiserror::Error;

#[derive(Error, Debug)]
pub enum BihinError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Data format error at line {line}, column '{column}': {reason} (got {value:?})")]
    DataFormat {
        line: u64,
        column: String,
        value: String,
        reason: String,
    },

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BihinError>;
