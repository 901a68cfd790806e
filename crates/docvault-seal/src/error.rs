//! Error types for the seal module.

use thiserror::Error;

/// Errors that can occur while sealing or opening document content.
///
/// Every variant is fatal for the request it occurs in; content is never
/// released partially decrypted or unverified.
#[derive(Debug, Error)]
pub enum SealError {
    /// Content encryption error.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Content decryption error (corrupt ciphertext, key mismatch).
    #[error("decryption error: {0}")]
    Decryption(String),

    /// RSA key-wrap error.
    #[error("key wrap error: {0}")]
    KeyWrap(String),

    /// RSA key-unwrap error.
    #[error("key unwrap error: {0}")]
    KeyUnwrap(String),

    /// Server keypair generation failed.
    #[error("key generation error: {0}")]
    KeyGeneration(String),

    /// A stored public key could not be reconstructed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Stored signature bytes are not a well-formed RSA signature.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The stored signature does not verify against the content.
    #[error("document integrity verification failed")]
    IntegrityVerificationFailed,

    /// A confidential record arrived without its wrapped key.
    #[error("confidential document has no wrapped key")]
    MissingWrappedKey,

    /// An integrity-flagged upload arrived without a signature, or an
    /// integrity-flagged record has none stored.
    #[error("integrity-flagged document has no signature")]
    MissingSignature,

    /// Integrity verification was requested but no uploader key was
    /// supplied.
    #[error("no verification key available for the uploader")]
    MissingVerificationKey,

    /// Envelope (de)serialization error.
    #[error("envelope serialization error: {0}")]
    Serialization(String),
}

/// Result type for seal operations.
pub type Result<T> = std::result::Result<T, SealError>;
