// ABOUTME: Error types for state machine operations, one variant per failure stage of the send path
// ABOUTME: Every native failure carries the GSM_Error code and the engine's description of it

use crate::datatypes::ErrorCode;
use std::fmt;
use thiserror::Error;

/// A native status code together with its description
///
/// Two values are equal when their codes are equal; the description is only
/// for display.
#[derive(Debug, Clone, Eq)]
pub struct NativeError {
    code: ErrorCode,
    description: String,
}

impl NativeError {
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// Uses the built-in English description of `code`
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.description())
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for NativeError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description, self.code.as_raw())
    }
}

impl std::error::Error for NativeError {}

/// Error type for state machine operations
///
/// Nothing is retried at this layer. A failed long message may already be
/// partially delivered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GammuError {
    /// Configuration file missing, unreadable or invalid
    #[error("Configuration error: {0}")]
    Configuration(NativeError),

    /// Transport setup or teardown failed, or the phone is not connected
    #[error("Connection error: {0}")]
    Connection(NativeError),

    /// Connected, but the service center number could not be read
    #[error("SMSC retrieval failed: {0}")]
    SmscRetrieval(NativeError),

    /// The multi-part encoder could not split the message
    #[error("Encoding failed: {0}")]
    Encoding(NativeError),

    /// The engine refused the message at submission time
    #[error("Submission rejected: {0}")]
    SubmissionRejected(NativeError),

    /// No confirmation arrived before the timeout
    #[error("Delivery timeout: {0}")]
    DeliveryTimeout(NativeError),

    /// The confirmation reported a failure
    #[error("Delivery failed: {0}")]
    DeliveryFailed(NativeError),

    /// The state machine has already been freed
    #[error("State machine has been freed")]
    Freed,

    /// The blocking worker of the async wrapper did not finish
    #[error("Worker error: {0}")]
    Worker(String),
}

impl GammuError {
    /// The native error, if this failure came from the engine
    pub fn native(&self) -> Option<&NativeError> {
        match self {
            GammuError::Configuration(e)
            | GammuError::Connection(e)
            | GammuError::SmscRetrieval(e)
            | GammuError::Encoding(e)
            | GammuError::SubmissionRejected(e)
            | GammuError::DeliveryTimeout(e)
            | GammuError::DeliveryFailed(e) => Some(e),
            GammuError::Freed | GammuError::Worker(_) => None,
        }
    }

    /// The native status code, if any
    pub fn code(&self) -> Option<ErrorCode> {
        self.native().map(NativeError::code)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GammuError::DeliveryTimeout(_))
    }
}

/// Result type alias for state machine operations
pub type GammuResult<T> = Result<T, GammuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_error_equality_ignores_description() {
        let a = NativeError::new(ErrorCode::Timeout, "one wording");
        let b = NativeError::new(ErrorCode::Timeout, "another wording");
        assert_eq!(a, b);
        assert_ne!(a, NativeError::from_code(ErrorCode::Unknown));
    }

    #[test]
    fn test_error_display() {
        let err = GammuError::Configuration(NativeError::from_code(ErrorCode::CantOpenFile));
        assert_eq!(
            err.to_string(),
            "Configuration error: Can not open specified file. (code 28)"
        );
        assert_eq!(GammuError::Freed.to_string(), "State machine has been freed");
    }

    #[test]
    fn test_code_accessors() {
        let err = GammuError::DeliveryTimeout(NativeError::from_code(ErrorCode::Timeout));
        assert_eq!(err.code(), Some(ErrorCode::Timeout));
        assert!(err.is_timeout());
        assert_eq!(GammuError::Freed.code(), None);
        assert!(GammuError::Worker("cancelled".into()).native().is_none());
    }
}
