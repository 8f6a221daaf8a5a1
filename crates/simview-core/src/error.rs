//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur in domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Place tag is not one of the known kinds
    #[error("Unknown place kind: {tag}")]
    UnknownPlaceKind { tag: String },

    /// Invalid field value
    #[error("Invalid {field}: {value} (expected {expected})")]
    InvalidFieldValue {
        field: String,
        value: String,
        expected: String,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
