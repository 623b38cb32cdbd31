//! Error types for probes and fetchers.

use thiserror::Error;

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while fetching or classifying a monitored unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The transport (process or HTTP) failed or timed out.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The transport succeeded but the payload had the wrong shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The named unit is absent from the upstream data.
    #[error("not found: {0}")]
    NotFound(String),

    /// A severity ordinal outside 0..=3. Programming error.
    #[error("invalid severity code: {0}")]
    InvalidSeverity(u8),
}

impl From<serde_json::Error> for ProbeError {
    fn from(e: serde_json::Error) -> Self {
        ProbeError::MalformedResponse(e.to_string())
    }
}
