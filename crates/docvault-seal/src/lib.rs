//! # docvault Seal
//!
//! Cryptographic envelope and security pipeline.
//!
//! ## Encryption Model
//!
//! Confidential content uses envelope encryption:
//!
//! 1. **Content key**: a fresh random AES-128 key encrypts the document body
//!    (AES-GCM, so corruption is detected at decrypt time).
//! 2. **Key wrap**: the content key is encrypted under the server's RSA
//!    public key and stored beside the ciphertext.
//!
//! Only the server's private key can unwrap content keys; neither the raw
//! key nor the plaintext is ever persisted.
//!
//! ## Integrity Model
//!
//! Integrity-flagged documents carry an uploader-computed RSA signature
//! (PKCS#1 v1.5 over SHA-256) over the original content. The server stores
//! it verbatim and verifies it on every download against the uploader's
//! registered public key, after decryption. A failed verification withholds
//! the content entirely.
//!
//! ## Key Types
//!
//! - [`ContentKey`] / [`ContentNonce`] - symmetric primitives
//! - [`SealedContent`] - the on-disk envelope (CBOR)
//! - [`ServerKeyPair`] - RSA wrap/unwrap
//! - [`SecurityPipeline`] - flag-driven transformation around upload/download

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod pipeline;

pub use crypto::{
    export_public_key, import_public_key, sign_content, verify_content, ContentKey, ContentNonce,
    ServerKeyPair, CONTENT_KEY_BYTES, SERVER_KEY_BITS,
};
pub use envelope::{SealFormat, SealedContent};
pub use error::{Result, SealError};
pub use pipeline::{SealedUpload, SecurityPipeline};
