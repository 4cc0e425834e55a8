//! # Error Types
//!
//! Structured error types for bom_core. Every failure a lifecycle operation
//! can surface is a variant here, so a front end can show one combined
//! notification and still branch on [`BomError::error_code`].
//!
//! ## Example
//!
//! ```rust
//! use bom_core::errors::{BomError, BomResult};
//!
//! fn check_plan(plan: u32) -> BomResult<()> {
//!     if plan == 0 {
//!         return Err(BomError::validation(vec![
//!             "Plan quantity must be a positive whole number".to_string(),
//!         ]));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_plan(0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for bom_core operations
pub type BomResult<T> = Result<T, BomError>;

/// Structured error type for BOM operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum BomError {
    /// Submission blocked; every problem found is listed
    #[error("Validation failed: {}", .problems.join("; "))]
    Validation { problems: Vec<String> },

    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// No persisted record carries this id
    #[error("BOM not found: {id}")]
    NotFound { id: String },

    /// The stored record changed since the editor opened it
    #[error("Revision conflict on '{id}': opened at revision {expected}, store has {found}")]
    Conflict { id: String, expected: u64, found: u64 },

    /// Positional access past the end of the collection
    #[error("Row {index} out of range (collection has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BomError {
    /// Create a Validation error from collected problems
    pub fn validation(problems: Vec<String>) -> Self {
        BomError::Validation { problems }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        BomError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(id: impl Into<String>) -> Self {
        BomError::NotFound { id: id.into() }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        BomError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        BomError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        BomError::SerializationError {
            reason: reason.into(),
        }
    }

    /// True for failures coming from the persistence collaborator.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            BomError::FileError { .. }
                | BomError::FileLocked { .. }
                | BomError::SerializationError { .. }
                | BomError::VersionMismatch { .. }
                | BomError::IndexOutOfRange { .. }
        )
    }

    /// Check if this is a recoverable error (the user can resubmit)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BomError::FileLocked { .. } | BomError::Validation { .. } | BomError::Conflict { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            BomError::Validation { .. } => "VALIDATION",
            BomError::InvalidInput { .. } => "INVALID_INPUT",
            BomError::NotFound { .. } => "NOT_FOUND",
            BomError::Conflict { .. } => "CONFLICT",
            BomError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            BomError::FileError { .. } => "FILE_ERROR",
            BomError::FileLocked { .. } => "FILE_LOCKED",
            BomError::SerializationError { .. } => "SERIALIZATION_ERROR",
            BomError::VersionMismatch { .. } => "VERSION_MISMATCH",
            BomError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for BomError {
    fn from(e: serde_json::Error) -> Self {
        BomError::serialization(e.to_string())
    }
}
