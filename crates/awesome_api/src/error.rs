use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The exchange rate did not arrive before the deadline.
    #[error("exchange rate request timed out after {0:?}")]
    Timeout(Duration),

    #[error("exchange rate request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("exchange rate API answered with status {0}")]
    Status(reqwest::StatusCode),

    /// Body was not the JSON document the API documents.
    #[error("malformed exchange rate payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("pair {0} missing from exchange rate payload")]
    MissingPair(String),
}

impl ApiError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return ApiError::Timeout(timeout);
        }
        ApiError::Transport(err)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, ApiError::Parse(_) | ApiError::MissingPair(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
