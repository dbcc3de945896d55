//! Error types for the phonebook repository.
//!
//! This module defines custom error types using `thiserror` for precise error handling.
//! Every repository operation either completes or fails before the single atomic
//! write, so none of these errors implies a partially written phonebook file.

use crate::domain::ValidationError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when operating on a phonebook.
#[derive(Error, Debug)]
pub enum PhonebookError {
    /// Input file (markup or spreadsheet) could not be parsed
    #[error("Invalid file format: {0}")]
    Format(String),

    /// A phonebook invariant would be violated
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Operation is blocked by the current phonebook state
    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    /// Referenced group or contact position does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Another writer holds the phonebook lock; safe to retry
    #[error("Phonebook {} is busy (lock not acquired within {waited_ms} ms)", .path.display())]
    Busy { path: PathBuf, waited_ms: u64 },

    /// Storage directory cannot be used
    #[error("Invalid storage path {}: {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// Unexpected filesystem failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building an export file failed
    #[error("Failed to encode spreadsheet: {0}")]
    Encode(String),

    /// Blocking task could not be joined
    #[error("Background task failed: {0}")]
    TaskJoin(String),
}

impl PhonebookError {
    /// Whether the caller may simply retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why an otherwise valid operation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// The group still has contacts and cascade was not requested.
    GroupNotEmpty { group: String, contacts: usize },
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroupNotEmpty { group, contacts } => write!(
                f,
                "group '{}' still has {} contact(s); delete with cascade to remove them",
                group, contacts
            ),
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Convenience type alias for Results with PhonebookError
pub type PhonebookResult<T> = Result<T, PhonebookError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PhonebookError::NotFound("group 'Sales'".to_string());
        assert_eq!(err.to_string(), "Not found: group 'Sales'");

        let err = PhonebookError::Validation(ValidationError::TooManyGroups);
        assert_eq!(
            err.to_string(),
            "Validation failed: too many groups (maximum 50)"
        );

        let err = ConfigError::InvalidValue {
            var: "PHONEBOOK_FILENAME".to_string(),
            reason: "Cannot be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for PHONEBOOK_FILENAME: Cannot be empty"
        );
    }

    #[test]
    fn test_conflict_display() {
        let err = PhonebookError::Conflict(ConflictReason::GroupNotEmpty {
            group: "Sales".to_string(),
            contacts: 2,
        });
        assert!(err.to_string().contains("'Sales'"));
        assert!(err.to_string().contains("2 contact(s)"));
    }

    #[test]
    fn test_only_busy_is_retryable() {
        let busy = PhonebookError::Busy {
            path: PathBuf::from("/tmp/rem.xml"),
            waited_ms: 10,
        };
        assert!(busy.is_retryable());
        assert!(busy.to_string().contains("/tmp/rem.xml"));
        assert!(!PhonebookError::Format("bad".into()).is_retryable());
    }
}
