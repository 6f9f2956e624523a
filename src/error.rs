use thiserror::Error;

/// Errors raised by the persistence adapters (high score file, task log, config).
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("task log error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
