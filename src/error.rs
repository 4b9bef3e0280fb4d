// Filmlog error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilmlogError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error("A database transfer is already in progress")]
    TransferBusy,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for FilmlogError {
    fn from(err: anyhow::Error) -> Self {
        FilmlogError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FilmlogError>;
