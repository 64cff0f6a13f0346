//! Storage errors.

use lp_watch_domain::UnknownProtocol;
use thiserror::Error;

/// Errors raised by capture repositories.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored capture has {0}")]
    UnknownProtocol(#[from] UnknownProtocol),
}

/// Result alias for storage operations.
pub type DataResult<T> = Result<T, DataError>;
