//! Cryptographic primitives for the seal module.
//!
//! AES-128-GCM content encryption, RSA key wrap/unwrap under the server
//! keypair, and RSA PKCS#1 v1.5 signatures over document content.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use rand::RngCore;
use rsa::pkcs1v15::{Signature as RsaSignature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use docvault_core::{Signature, UserPublicKey, WrappedKey};

use crate::error::{Result, SealError};

/// Content keys are 16-byte AES-128 keys.
pub const CONTENT_KEY_BYTES: usize = 16;

/// RSA modulus size for generated server keypairs.
pub const SERVER_KEY_BITS: usize = 2048;

/// A random symmetric key protecting one document revision.
///
/// Generated fresh per confidential upload, wrapped under the server's RSA
/// public key for storage, and never persisted in the clear.
#[derive(Clone)]
pub struct ContentKey([u8; CONTENT_KEY_BYTES]);

impl ContentKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; CONTENT_KEY_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; CONTENT_KEY_BYTES]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; CONTENT_KEY_BYTES] {
        &self.0
    }

    /// Encrypt data with this key.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &ContentNonce) -> Result<Vec<u8>> {
        let cipher = Aes128Gcm::new_from_slice(&self.0)
            .map_err(|e| SealError::Encryption(e.to_string()))?;

        let nonce = Nonce::from_slice(&nonce.0);
        cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| SealError::Encryption(e.to_string()))
    }

    /// Decrypt data with this key.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &ContentNonce) -> Result<Vec<u8>> {
        let cipher = Aes128Gcm::new_from_slice(&self.0)
            .map_err(|e| SealError::Decryption(e.to_string()))?;

        let nonce = Nonce::from_slice(&nonce.0);
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| SealError::Decryption(e.to_string()))
    }
}

/// A 96-bit nonce for AES-GCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNonce(pub [u8; 12]);

impl ContentNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 12];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// The server's static RSA keypair.
///
/// Wraps content keys on upload and unwraps them on download. There is one
/// keypair per server; rotation is out of scope.
pub struct ServerKeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl ServerKeyPair {
    /// Generate a fresh keypair.
    pub fn generate() -> Result<Self> {
        Self::generate_with_bits(SERVER_KEY_BITS)
    }

    /// Generate a keypair with an explicit modulus size.
    pub fn generate_with_bits(bits: usize) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| SealError::KeyGeneration(e.to_string()))?;
        let public = private.to_public_key();
        Ok(Self { private, public })
    }

    /// Build from an existing private key.
    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self { private, public }
    }

    /// The public half.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Encrypt a content key under the server public key.
    pub fn wrap_key(&self, key: &ContentKey) -> Result<WrappedKey> {
        let mut rng = rand::thread_rng();
        let wrapped = self
            .public
            .encrypt(&mut rng, Pkcs1v15Encrypt, key.as_bytes())
            .map_err(|e| SealError::KeyWrap(e.to_string()))?;
        Ok(WrappedKey::from_bytes(wrapped))
    }

    /// Recover a content key with the server private key.
    pub fn unwrap_key(&self, wrapped: &WrappedKey) -> Result<ContentKey> {
        let raw = self
            .private
            .decrypt(Pkcs1v15Encrypt, wrapped.as_bytes())
            .map_err(|e| SealError::KeyUnwrap(e.to_string()))?;

        let bytes: [u8; CONTENT_KEY_BYTES] = raw
            .try_into()
            .map_err(|_| SealError::KeyUnwrap("unexpected content key length".to_string()))?;
        Ok(ContentKey::from_bytes(bytes))
    }
}

/// Export an RSA public key into its registry record form.
pub fn export_public_key(key: &RsaPublicKey) -> UserPublicKey {
    UserPublicKey::new(key.n().to_bytes_be(), key.e().to_bytes_be())
}

/// Reconstruct an RSA public key from its registry record.
pub fn import_public_key(key: &UserPublicKey) -> Result<RsaPublicKey> {
    RsaPublicKey::new(
        BigUint::from_bytes_be(&key.modulus),
        BigUint::from_bytes_be(&key.exponent),
    )
    .map_err(|e| SealError::InvalidPublicKey(e.to_string()))
}

/// Sign content with a private key (PKCS#1 v1.5 over SHA-256).
///
/// Uploaders sign on their side; the server only ever verifies. This helper
/// exists for client code and tests.
pub fn sign_content(private: &RsaPrivateKey, content: &[u8]) -> Signature {
    let signing_key = SigningKey::<Sha256>::new(private.clone());
    let signature = signing_key.sign(content);
    Signature::from_bytes(signature.to_bytes().as_ref())
}

/// Verify an uploader signature over content.
///
/// Returns `Ok(false)` on a clean mismatch; errors are reserved for keys or
/// signatures that cannot be interpreted at all.
pub fn verify_content(key: &UserPublicKey, content: &[u8], signature: &Signature) -> Result<bool> {
    let public = import_public_key(key)?;
    let verifying_key = VerifyingKey::<Sha256>::new(public);

    let signature = RsaSignature::try_from(signature.as_bytes())
        .map_err(|e| SealError::MalformedSignature(e.to_string()))?;

    Ok(verifying_key.verify(content, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1024-bit keys: test-only, keygen cost dominates the suite otherwise.
    fn test_keypair() -> ServerKeyPair {
        ServerKeyPair::generate_with_bits(1024).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = ContentKey::generate();
        let nonce = ContentNonce::generate();
        let plaintext = b"hello, world!";

        let ciphertext = key.encrypt(plaintext, &nonce).unwrap();
        assert_ne!(ciphertext, plaintext);

        let decrypted = key.decrypt(&ciphertext, &nonce).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = ContentKey::generate();
        let key2 = ContentKey::generate();
        let nonce = ContentNonce::generate();

        let ciphertext = key1.encrypt(b"secret", &nonce).unwrap();

        assert!(key2.decrypt(&ciphertext, &nonce).is_err());
    }

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let server = test_keypair();
        let key = ContentKey::generate();

        let wrapped = server.wrap_key(&key).unwrap();
        assert_ne!(wrapped.as_bytes(), key.as_bytes());

        let unwrapped = server.unwrap_key(&wrapped).unwrap();
        assert_eq!(unwrapped.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_unwrap_with_wrong_server_fails() {
        let server1 = test_keypair();
        let server2 = test_keypair();
        let key = ContentKey::generate();

        let wrapped = server1.wrap_key(&key).unwrap();
        assert!(server2.unwrap_key(&wrapped).is_err());
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let server = test_keypair();
        let record = export_public_key(server.public_key());
        let content = b"signed document body";

        let signature = sign_content(&server.private, content);
        assert!(verify_content(&record, content, &signature).unwrap());

        // Tampered content must not verify
        assert!(!verify_content(&record, b"signed document bodY", &signature).unwrap());
    }

    #[test]
    fn test_public_key_export_import_roundtrip() {
        let server = test_keypair();
        let record = export_public_key(server.public_key());
        let rebuilt = import_public_key(&record).unwrap();
        assert_eq!(&rebuilt, server.public_key());
    }
}
