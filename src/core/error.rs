use std::time::Duration;

use thiserror::Error;

/// Request-level validation failures. Raised before any source is contacted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("invalid query: keyword must not be empty")]
    InvalidQuery,
    #[error("unknown category '{given}'; valid categories are: {}", .valid.join(", "))]
    UnknownCategory { given: String, valid: Vec<&'static str> },
    #[error("no newsletters to search: the resolved source list is empty")]
    EmptySourceSet,
}

/// Failure talking to a single newsletter. The display text keeps the
/// category so it can be reported verbatim as a per-source reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream status {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl SourceError {
    /// Transient failures worth another attempt at the HTTP layer.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Network(_) | SourceError::Timeout(_) => true,
            SourceError::Status(code) => *code >= 500,
            _ => false,
        }
    }
}

impl SourceError {
    /// Classify a transport error. `timeout` is the client's configured
    /// request timeout, reported when reqwest gives up on its own.
    pub fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            SourceError::Timeout(timeout)
        } else if e.is_decode() {
            SourceError::Parse(e.to_string())
        } else if let Some(status) = e.status() {
            SourceError::Status(status.as_u16())
        } else {
            SourceError::Network(e.to_string())
        }
    }
}
