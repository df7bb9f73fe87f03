//! src/error.rs
//! ============================================================================
//! # `ListError`: Unified Error Type for List Management
//!
//! Every fallible operation in the crate returns `ListResult<T>`. Variants are
//! grouped by concern: local validation, remote calls, logic errors raised by
//! racing completions, navigation, and the ambient config/logging layers.

use std::{io, path::PathBuf};

use compact_str::{CompactString, ToCompactString};
use thiserror::Error;

use crate::logging::LoggingError;
use crate::service::remote::RemoteError;

/// Convenient alias carrying the unified error type
pub type ListResult<T> = Result<T, ListError>;

/// Unified error type for list management operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ListError {
    // ────────────────────────────────────────────────────────────
    // Local validation
    // ────────────────────────────────────────────────────────────
    /// A payload field failed local validation.
    #[error("Invalid {field}: {message}")]
    Validation {
        field: CompactString,
        message: CompactString,
    },

    /// The operation needs a scope (e.g. a season) and none is loaded.
    #[error("No scope selected")]
    MissingScope,

    /// Bulk action requested with nothing selected.
    #[error("No records selected")]
    EmptySelection,

    // ────────────────────────────────────────────────────────────
    // Remote calls
    // ────────────────────────────────────────────────────────────
    /// Transport failure or server-side rejection.
    #[error("{operation} failed: {reason}")]
    Remote {
        operation: CompactString,
        reason: CompactString,
    },

    /// The remote call did not complete within the configured timeout.
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: CompactString,
        timeout_ms: u64,
    },

    /// In-flight work was cancelled because its context went away.
    #[error("Operation was cancelled")]
    Cancelled,

    // ────────────────────────────────────────────────────────────
    // Logic errors
    // ────────────────────────────────────────────────────────────
    /// Identifier is not present in the store.
    #[error("Record not found: {id}")]
    NotFound { id: CompactString },

    /// Identifier is already present in the store.
    #[error("Duplicate record id: {id}")]
    DuplicateId { id: CompactString },

    // ────────────────────────────────────────────────────────────
    // Navigation
    // ────────────────────────────────────────────────────────────
    #[error("Page {requested} is out of range (1..={total_pages})")]
    PageOutOfRange { requested: usize, total_pages: usize },

    // ────────────────────────────────────────────────────────────
    // Ambient layers
    // ────────────────────────────────────────────────────────────
    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// TOML config serialization error.
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Config file I/O error with path.
    #[error("Failed to access config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON (fixtures, snapshots) error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Logger bootstrap failure.
    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// Any other error, with description. Produced from `anyhow::Error` at
    /// bootstrap boundaries.
    #[error("Unexpected error: {0}")]
    Other(CompactString),
}

impl ListError {
    /// Create a validation error for `field`
    pub fn validation(field: impl Into<CompactString>, message: impl Into<CompactString>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a remote failure error for `operation`
    pub fn remote(operation: impl Into<CompactString>, reason: impl Into<CompactString>) -> Self {
        Self::Remote {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(id: &impl ToCompactString) -> Self {
        Self::NotFound {
            id: id.to_compact_string(),
        }
    }

    pub fn duplicate_id(id: &impl ToCompactString) -> Self {
        Self::DuplicateId {
            id: id.to_compact_string(),
        }
    }

    /// Wrap a [`RemoteError`] raised by `operation`.
    #[must_use]
    pub fn from_remote(operation: &str, err: &RemoteError) -> Self {
        Self::remote(operation, err.message.clone())
    }

    /// Errors raised before anything was sent to the remote service.
    #[inline]
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::MissingScope | Self::EmptySelection
        )
    }

    /// Errors that leave the list usable and only need a notification.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::MissingScope
                | Self::EmptySelection
                | Self::Remote { .. }
                | Self::Timeout { .. }
                | Self::Cancelled
                | Self::NotFound { .. }
                | Self::PageOutOfRange { .. }
        )
    }

    /// Short title used when surfacing the error as a notification.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::MissingScope | Self::EmptySelection => {
                "Validation error"
            }
            Self::Remote { .. } | Self::Timeout { .. } => "Request failed",
            Self::Cancelled => "Cancelled",
            Self::NotFound { .. } | Self::DuplicateId { .. } => "Record unavailable",
            Self::PageOutOfRange { .. } => "Invalid page",
            _ => "Unexpected error",
        }
    }
}

// Allow conversion from `anyhow::Error` at bootstrap boundaries.
impl From<anyhow::Error> for ListError {
    fn from(e: anyhow::Error) -> Self {
        Self::Other(e.to_compact_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_recoverable() {
        let err = ListError::validation("name", "is required");
        assert!(err.is_validation());
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Invalid name: is required");
        assert_eq!(err.title(), "Validation error");
    }

    #[test]
    fn remote_error_keeps_server_message() {
        let remote = RemoteError::new("email already registered");
        let err = ListError::from_remote("create", &remote);
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "create failed: email already registered");
    }

    #[test]
    fn bootstrap_errors_are_not_recoverable() {
        let err: ListError = LoggingError::AlreadyInitialized.into();
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Logger already initialized");

        let err: ListError = anyhow::anyhow!("no runtime").context("startup").into();
        assert!(matches!(&err, ListError::Other(message) if message == "startup"));
        assert_eq!(err.title(), "Unexpected error");
    }
}
