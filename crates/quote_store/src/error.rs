use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("write timed out after {0:?}")]
    Timeout(Duration),

    #[error("write task failed: {0}")]
    Join(String),
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
