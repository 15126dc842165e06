//! Analytics API error types.

use thiserror::Error;

/// Errors surfaced by an [`AnalyticsClient`](super::AnalyticsClient) call.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The requested job or analysis does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connect error, timeout, ...).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body was not the expected JSON shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Returns true for failures worth retrying on the next poll tick.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Http { status, .. } => *status >= 500 || *status == 429,
            ClientError::NotFound(_) | ClientError::Decode(_) | ClientError::InvalidUrl(_) => {
                false
            }
        }
    }

    /// Returns true when the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Result type for analytics API operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::Transport("timed out".into()).is_transient());
        assert!(ClientError::Http {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!ClientError::Http {
            status: 400,
            body: String::new()
        }
        .is_transient());
        assert!(!ClientError::NotFound("job-1".into()).is_transient());
        assert!(ClientError::NotFound("job-1".into()).is_not_found());
    }
}
