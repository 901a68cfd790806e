//! Error types for the permissions engine.

use thiserror::Error;

/// Errors that can occur during permission computations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The delegator holds no grant at all that could propagate the
    /// requested permission. Distinct from "holds a grant but may not
    /// propagate it", which `can_delegate` rejects earlier.
    #[error("no qualifying grant eligible to propagate the requested permission")]
    NoQualifyingGrant,
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
