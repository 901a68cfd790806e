//! Error types for the vault.
//!
//! Permission and integrity failures are values, not control flow: every
//! operation returns one of these variants and the transport boundary maps
//! them to status codes via [`VaultError::status_code`]. Nothing is
//! swallowed or degraded; a crypto failure in particular never falls back
//! to releasing raw stored bytes.

use thiserror::Error;

use docvault_core::{DocumentName, UserName, ValidationError};
use docvault_perms::PermsError;
use docvault_seal::SealError;
use docvault_store::StoreError;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No document row matches the given name.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentName),

    /// The actor is not authorized for the attempted operation.
    #[error("user lacks permission: {0}")]
    UserLacksPermission(String),

    /// The delegator holds no grant eligible to propagate the requested
    /// permission.
    #[error("no qualifying grant eligible to propagate the requested permission")]
    NoQualifyingGrant,

    /// The stored signature did not verify against the content.
    #[error("integrity verification failed for document: {0}")]
    IntegrityVerificationFailed(DocumentName),

    /// The declared uploader has no registered public key.
    #[error("no registered public key for user: {0}")]
    UnknownUser(UserName),

    /// Key unwrap or content encrypt/decrypt error. Always fatal for the
    /// request.
    #[error("cryptographic failure: {0}")]
    Crypto(SealError),

    /// Storage error, propagated without retry.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A record violated its flag invariants.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl VaultError {
    /// Fold a seal error into the vault taxonomy, attributing integrity
    /// failures to the document they occurred on.
    pub fn from_seal(name: &DocumentName, err: SealError) -> Self {
        match err {
            SealError::IntegrityVerificationFailed => {
                VaultError::IntegrityVerificationFailed(name.clone())
            }
            other => VaultError::Crypto(other),
        }
    }

    /// The transport status this error maps to at the REST boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            VaultError::DocumentNotFound(_) => 404,
            VaultError::UserLacksPermission(_) | VaultError::NoQualifyingGrant => 401,
            VaultError::IntegrityVerificationFailed(_) => 422,
            VaultError::UnknownUser(_)
            | VaultError::Crypto(_)
            | VaultError::Store(_)
            | VaultError::Validation(_) => 500,
        }
    }
}

impl From<PermsError> for VaultError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::NoQualifyingGrant => VaultError::NoQualifyingGrant,
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            VaultError::DocumentNotFound(DocumentName::new("doc")).status_code(),
            404
        );
        assert_eq!(
            VaultError::UserLacksPermission("nope".into()).status_code(),
            401
        );
        assert_eq!(VaultError::NoQualifyingGrant.status_code(), 401);
        assert_eq!(
            VaultError::IntegrityVerificationFailed(DocumentName::new("doc")).status_code(),
            422
        );
        assert_eq!(
            VaultError::Crypto(SealError::MissingWrappedKey).status_code(),
            500
        );
    }

    #[test]
    fn test_integrity_seal_error_is_not_a_crypto_failure() {
        let name = DocumentName::new("doc");
        assert!(matches!(
            VaultError::from_seal(&name, SealError::IntegrityVerificationFailed),
            VaultError::IntegrityVerificationFailed(_)
        ));
        assert!(matches!(
            VaultError::from_seal(&name, SealError::MissingWrappedKey),
            VaultError::Crypto(_)
        ));
    }
}
