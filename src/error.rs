use thiserror::Error;

#[derive(Error, Debug)]
pub enum PKError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid schedule parameters: {0}")]
    InvalidSchedule(String),

    #[error("Invalid patch record: {0}")]
    InvalidRecord(String),

    #[error("Invalid target range: {0}")]
    InvalidTarget(String),

    #[error("Parameter validation error: {0}")]
    Validation(String),
}

pub type PKResult<T> = Result<T, PKError>;
