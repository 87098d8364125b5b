//! # Calculation Error Types
//!
//! Error types for the remote calculation service and the coordinators
//! built on it.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Calculation Error Categories                         │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Rejection     │  │   Transport     │  │     Internal            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Rejected       │  │  Transport      │  │  Line (CoreError)       │ │
//! │  │  (server said   │  │  ServiceStatus  │  │  Serialization          │ │
//! │  │   no, verbatim  │  │  EmptyResponse  │  │  ChannelClosed          │ │
//! │  │   message)      │  │  InvalidUrl     │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  The delete gate surfaces Rejected messages verbatim; every other      │
//! │  category collapses into a generic "cannot delete" denial.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for calculation operations.
pub type CalcResult<T> = Result<T, CalcError>;

/// Calculation and validation failures.
#[derive(Debug, Error)]
pub enum CalcError {
    /// The service explicitly rejected the request (validation mode) or
    /// reported a business failure. The message is the server's own and
    /// is shown to the user verbatim.
    #[error("{message}")]
    Rejected { message: String },

    /// The service answered success but carried no totals payload.
    #[error("Calculation response carried no totals")]
    EmptyResponse,

    /// Network/transport failure reaching the service.
    #[error("Calculation service unreachable: {0}")]
    Transport(String),

    /// The service answered with a non-success HTTP status.
    #[error("Calculation service returned status {status}")]
    ServiceStatus { status: u16 },

    /// Bad endpoint configuration.
    #[error("Invalid calculation service URL: {0}")]
    InvalidUrl(String),

    /// Payload (de)serialization failure.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A coordinator channel closed (engine shutting down).
    #[error("Coordinator channel closed")]
    ChannelClosed,

    /// Line collection failure (unknown key, bad undo).
    #[error(transparent)]
    Line(#[from] meridian_core::CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for CalcError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => CalcError::ServiceStatus {
                status: status.as_u16(),
            },
            None => CalcError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for CalcError {
    fn from(err: url::ParseError) -> Self {
        CalcError::InvalidUrl(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl CalcError {
    /// True when the server itself refused the request; the message is
    /// meaningful to the user. Everything else is infrastructure noise
    /// and gets a generic message instead.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CalcError::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_is_verbatim() {
        let err = CalcError::Rejected {
            message: "Remaining total below contract minimum".into(),
        };
        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "Remaining total below contract minimum");
    }

    #[test]
    fn test_transport_is_not_rejection() {
        assert!(!CalcError::Transport("connection refused".into()).is_rejection());
        assert!(!CalcError::ServiceStatus { status: 502 }.is_rejection());
    }
}
