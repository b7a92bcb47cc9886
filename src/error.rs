use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("Invalid date '{value}' for {field}: expected D.M.YYYY")]
    DateParse { field: String, value: String },

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Unknown row type: {0}")]
    UnknownRowType(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlanningError>;
