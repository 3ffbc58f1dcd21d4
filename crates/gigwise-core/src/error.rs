//! Error types for Gigwise

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Caller supplied missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// A single prediction could not be produced
    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Model store error: {0}")]
    Store(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// True for errors caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
