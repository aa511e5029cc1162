//! Custom error types for memscan

use thiserror::Error;

/// Main error type for session and engine operations.
///
/// Callers are expected to match on kind: `Validation` is raised locally
/// before any engine call, `Engine` carries the engine's message verbatim
/// and leaves the session usable, `ProcessGone` drops the attachment,
/// `Protocol` leaves the single offending request un-applied, and
/// `Transport` is fatal for the whole session.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid scan command: {0}")]
    Validation(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Target process {0} is dead")]
    ProcessGone(u32),

    #[error("Malformed engine reply: {0}")]
    Protocol(String),

    #[error("Engine transport failure: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Invalid value type: {0}")]
    InvalidValueType(String),

    #[error("Cheat list I/O failed: {0}")]
    CheatList(String),

    #[error("No process attached")]
    NoProcess,
}

/// Result type alias for session operations
pub type ScanResult<T> = Result<T, ScanError>;

impl ScanError {
    /// Creates a validation error
    pub fn validation(reason: impl Into<String>) -> Self {
        ScanError::Validation(reason.into())
    }

    /// Creates a protocol error
    pub fn protocol(reason: impl Into<String>) -> Self {
        ScanError::Protocol(reason.into())
    }

    /// True for errors that terminate the session rather than one operation
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::Transport(_))
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::Validation("Bad value: zz".to_string());
        assert_eq!(err.to_string(), "Invalid scan command: Bad value: zz");

        let err = ScanError::Engine("error parsing pid".to_string());
        assert_eq!(err.to_string(), "Engine error: error parsing pid");

        let err = ScanError::ProcessGone(1234);
        assert_eq!(err.to_string(), "Target process 1234 is dead");

        let err = ScanError::InvalidAddress("0xZZ".to_string());
        assert_eq!(err.to_string(), "Invalid memory address: 0xZZ");
    }

    #[test]
    fn test_fatal_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: ScanError = io_err.into();
        assert!(err.is_fatal());

        assert!(!ScanError::Engine("x".to_string()).is_fatal());
        assert!(!ScanError::validation("x").is_fatal());
        assert!(!ScanError::protocol("x").is_fatal());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err: ScanError = json_err.into();
        assert!(matches!(err, ScanError::Protocol(_)));
    }
}
