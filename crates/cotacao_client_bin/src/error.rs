use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server did not deliver a quote before the deadline.
    #[error("Timeout: no quote from server within {0:?}")]
    Timeout(Duration),

    #[error("Request to server failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Server answered with status {0}")]
    Status(reqwest::StatusCode),

    #[error("Could not parse server response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not write quote file: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> ClientError {
        if err.is_timeout() {
            return ClientError::Timeout(timeout);
        }
        ClientError::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pass_converts_from_serde_json() {
        let err: ClientError = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(matches!(err, ClientError::Parse(_)));
        assert!(err.to_string().starts_with("Could not parse server response"));
    }

    #[test]
    fn io_pass_converts_from_io_error() {
        let err: ClientError = io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[test]
    fn timeout_pass_message_names_deadline() {
        let err = ClientError::Timeout(Duration::from_millis(300));
        assert_eq!(err.to_string(), "Timeout: no quote from server within 300ms");
    }
}
