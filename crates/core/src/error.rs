//! Error types and recovery strategies for Pagemark
//!
//! Errors are classified into three severity tiers:
//! - **Recoverable**: the operation can simply be tried again
//! - **Degraded**: the request is rejected but the app keeps working
//! - **Fatal**: stored data is unusable until the user intervenes
//!
//! Each error carries a recovery action so the presentation layer can decide
//! what to tell the user.

use std::fmt;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Correct the input and submit again
    FixInput,
    /// Retry the operation later (e.g., lookup service temporarily unavailable)
    RetryLater,
    /// Restore the data file from its backup
    RestoreBackup,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixInput => write!(f, "Correct the input"),
            Self::RetryLater => write!(f, "Retry later"),
            Self::RestoreBackup => write!(f, "Restore from backup"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be recovered from by retrying
    Recoverable,
    /// Request rejected but app can continue
    Degraded,
    /// Critical error requiring user action
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Domain error type shared by the Pagemark crates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Book identifier (ISBN) is empty or has the wrong shape
    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// A persisted record could not be turned back into a book
    #[error("Invalid stored record {record}: {field} - {reason}")]
    InvalidRecord {
        record: String,
        field: String,
        reason: String,
    },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidIdentifier { .. } | Self::InvalidArgument { .. } => {
                ErrorSeverity::Degraded
            }
            Self::InvalidRecord { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::InvalidIdentifier { .. } | Self::InvalidArgument { .. } => {
                RecoveryAction::FixInput
            }
            Self::InvalidRecord { .. } => RecoveryAction::RestoreBackup,
        }
    }

    /// Returns a user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidIdentifier { value, .. } if value.trim().is_empty() => {
                "Please enter an ISBN.".to_string()
            }
            Self::InvalidIdentifier { .. } => {
                "Please enter a valid ISBN (10 or 13 characters).".to_string()
            }
            Self::InvalidArgument { argument, .. } => format!("Invalid {}.", argument),
            Self::InvalidRecord { .. } => {
                "Your saved reading data is damaged and could not be loaded.".to_string()
            }
        }
    }

    /// Returns true if this error should be logged at ERROR level
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Helper to create an invalid identifier error
    pub fn invalid_identifier(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Helper to create an invalid stored record error
    pub fn invalid_record(
        record: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRecord {
            record: record.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_action_display() {
        assert_eq!(RecoveryAction::FixInput.to_string(), "Correct the input");
        assert_eq!(RecoveryAction::RestoreBackup.to_string(), "Restore from backup");
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
        assert!(ErrorSeverity::Degraded < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_invalid_identifier_is_degraded() {
        let err = AppError::invalid_identifier("123", "must be 10 or 13 characters");
        assert_eq!(err.severity(), ErrorSeverity::Degraded);
        assert_eq!(err.recovery_action(), RecoveryAction::FixInput);
        assert!(!err.is_critical());
    }

    #[test]
    fn test_invalid_record_is_fatal() {
        let err = AppError::invalid_record("abc", "isbn", "wrong length");
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(err.recovery_action(), RecoveryAction::RestoreBackup);
        assert!(err.is_critical());
    }

    #[test]
    fn test_empty_identifier_message() {
        let err = AppError::invalid_identifier("  ", "identifier is empty");
        assert_eq!(err.user_message(), "Please enter an ISBN.");
    }

    #[test]
    fn test_error_display() {
        let err = AppError::invalid_identifier("123", "must be 10 or 13 characters");
        let display = err.to_string();
        assert!(display.contains("123"));
        assert!(display.contains("10 or 13"));
    }
}
