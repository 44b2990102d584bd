//! Error taxonomy for the refinement pipeline.
//!
//! Endpoint and store failures abort the current run. Score parse failures are
//! soft: the refinement loop logs them and carries on without a score.

use thiserror::Error;

/// Failure talking to the completion or embedding endpoint. Never retried.
#[derive(Error, Debug)]
pub enum EndpointError {
    /// The request did not complete within the transport's timeout.
    #[error("endpoint timed out: {0}")]
    Timeout(String),

    /// HTTP 429 from the endpoint.
    #[error("endpoint rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success status.
    #[error("endpoint error ({status}): {body}")]
    Server { status: u16, body: String },

    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("endpoint transport error: {0}")]
    Transport(String),

    /// The body was not the shape we expected.
    #[error("malformed endpoint response: {0}")]
    MalformedResponse(String),
}

impl EndpointError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            429 => Self::RateLimited(body),
            408 | 504 => Self::Timeout(body),
            _ => Self::Server { status, body },
        }
    }
}

impl From<reqwest::Error> for EndpointError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else if let Some(status) = e.status() {
            Self::from_status(status.as_u16(), e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// No rewritten prompt could be located in a critique (strict fallback only).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("could not extract rewritten prompt from critique text")]
    NoMarker,
}

/// A clarity line was found but no usable score came out of it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreParseError {
    #[error("clarity line has no digits: {0:?}")]
    NoDigits(String),

    #[error("clarity score {0} is outside 1-10")]
    OutOfRange(u64),

    #[error("clarity score does not fit in an integer: {0:?}")]
    Overflow(String),

    #[error("score pattern matched without a capture group: {0:?}")]
    MissingCapture(String),
}

/// Memory store failure. Aborts the current run; saves never partially commit.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("embedding has {actual} dimensions, store expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EndpointError),

    #[error("database lock poisoned")]
    LockPoisoned,
}

/// Anything that aborts a single pipeline run.
#[derive(Error, Debug)]
pub enum IrisError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, IrisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            EndpointError::from_status(429, "slow down"),
            EndpointError::RateLimited(_)
        ));
        assert!(matches!(
            EndpointError::from_status(504, ""),
            EndpointError::Timeout(_)
        ));
        assert!(matches!(
            EndpointError::from_status(500, "boom"),
            EndpointError::Server { status: 500, .. }
        ));
    }

    #[test]
    fn store_error_wraps_endpoint_error() {
        let err: StoreError = EndpointError::RateLimited("quota".into()).into();
        assert!(err.to_string().contains("rate limited"));

        let err: IrisError = err.into();
        assert!(matches!(err, IrisError::Store(StoreError::Embedding(_))));
    }
}
