//! Error types for docvault core.

use thiserror::Error;

/// Core errors for primitive parsing and construction.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown security flag: {0}")]
    UnknownFlag(String),

    #[error("unknown permission: {0}")]
    UnknownPermission(String),
}

/// Validation errors for document record invariants.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("confidential document {0} has no wrapped key")]
    MissingWrappedKey(String),

    #[error("integrity-flagged document {0} has no signature")]
    MissingSignature(String),

    #[error("document {0} carries a wrapped key but is not confidential")]
    UnexpectedWrappedKey(String),
}
