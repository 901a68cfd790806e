//! Sealed content envelope.
//!
//! A confidential document is stored as a SealedContent envelope: the
//! AES-GCM ciphertext plus the metadata needed to open it again (assuming
//! possession of the content key, which is stored RSA-wrapped alongside).

use serde::{Deserialize, Serialize};

use crate::crypto::{ContentKey, ContentNonce};
use crate::error::{Result, SealError};

/// Format identifier for sealed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SealFormat {
    /// AES-GCM with 128-bit key.
    Aes128Gcm = 1,
}

/// An encrypted content envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedContent {
    /// Encryption algorithm used.
    pub format: SealFormat,

    /// Nonce used for encryption (unique per seal).
    pub nonce: ContentNonce,

    /// The encrypted data (includes authentication tag).
    pub ciphertext: Vec<u8>,
}

impl SealedContent {
    /// Seal plaintext with the given key.
    pub fn seal(plaintext: &[u8], key: &ContentKey) -> Result<Self> {
        let nonce = ContentNonce::generate();
        let ciphertext = key.encrypt(plaintext, &nonce)?;

        Ok(Self {
            format: SealFormat::Aes128Gcm,
            nonce,
            ciphertext,
        })
    }

    /// Open with the given key.
    pub fn open(&self, key: &ContentKey) -> Result<Vec<u8>> {
        match self.format {
            SealFormat::Aes128Gcm => key.decrypt(&self.ciphertext, &self.nonce),
        }
    }

    /// Serialize to CBOR bytes for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
        buf
    }

    /// Deserialize from stored CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| SealError::Serialization(e.to_string()))
    }

    /// Get the size of the ciphertext.
    pub fn ciphertext_len(&self) -> usize {
        self.ciphertext.len()
    }
}
