//! Strong type definitions for docvault.
//!
//! Identities, document names, and record types are newtypes to prevent
//! misuse at compile time.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// The name of a stored document. Unique key within the vault.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentName(String);

impl DocumentName {
    /// Create a new document name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentName({:?})", self.0)
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An actor identity.
///
/// Derived at the authentication boundary (client-certificate subject) and
/// threaded through every operation as an explicit parameter. There is no
/// ambient "current user" anywhere in the core.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    /// Create a new user name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserName({:?})", self.0)
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The recipient of a permission grant: a named user or every user.
///
/// Wildcard grants are stored as a reserved grantee string; the
/// authentication boundary never yields it as a real user name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grantee {
    /// A single named user.
    User(UserName),
    /// Every authenticated user.
    AllUsers,
}

/// Storage encoding of the wildcard grantee.
pub const ALL_USERS_KEY: &str = "*";

impl Grantee {
    /// Storage encoding of this grantee.
    pub fn as_key(&self) -> &str {
        match self {
            Grantee::User(name) => name.as_str(),
            Grantee::AllUsers => ALL_USERS_KEY,
        }
    }

    /// Decode a grantee from its storage encoding.
    pub fn from_key(key: &str) -> Self {
        if key == ALL_USERS_KEY {
            Grantee::AllUsers
        } else {
            Grantee::User(UserName::new(key))
        }
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantee::User(name) => write!(f, "{}", name),
            Grantee::AllUsers => write!(f, "ALL"),
        }
    }
}

impl From<UserName> for Grantee {
    fn from(name: UserName) -> Self {
        Grantee::User(name)
    }
}

/// A per-document declaration of which protections apply to its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecurityFlag {
    /// Content is stored encrypted; only the server keypair can recover it.
    Confidentiality,
    /// Content carries an uploader signature verified on every download.
    Integrity,
}

impl SecurityFlag {
    /// Storage encoding of this flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityFlag::Confidentiality => "CONFIDENTIALITY",
            SecurityFlag::Integrity => "INTEGRITY",
        }
    }

    /// Decode a flag from its storage encoding.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "CONFIDENTIALITY" => Ok(SecurityFlag::Confidentiality),
            "INTEGRITY" => Ok(SecurityFlag::Integrity),
            other => Err(CoreError::UnknownFlag(other.to_string())),
        }
    }
}

impl fmt::Display for SecurityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The set of security flags declared for a document (zero, one, or both).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityFlags {
    confidentiality: bool,
    integrity: bool,
}

impl SecurityFlags {
    /// The empty flag set.
    pub const NONE: Self = Self {
        confidentiality: false,
        integrity: false,
    };

    /// Create an empty flag set.
    pub fn new() -> Self {
        Self::NONE
    }

    /// Check whether a flag is set.
    pub fn contains(&self, flag: SecurityFlag) -> bool {
        match flag {
            SecurityFlag::Confidentiality => self.confidentiality,
            SecurityFlag::Integrity => self.integrity,
        }
    }

    /// Set a flag.
    pub fn insert(&mut self, flag: SecurityFlag) {
        match flag {
            SecurityFlag::Confidentiality => self.confidentiality = true,
            SecurityFlag::Integrity => self.integrity = true,
        }
    }

    /// Builder-style flag insertion.
    pub fn with(mut self, flag: SecurityFlag) -> Self {
        self.insert(flag);
        self
    }

    /// Check whether no flags are set.
    pub fn is_empty(&self) -> bool {
        !self.confidentiality && !self.integrity
    }

    /// Iterate the flags that are set.
    pub fn iter(&self) -> impl Iterator<Item = SecurityFlag> {
        let mut flags = Vec::new();
        if self.confidentiality {
            flags.push(SecurityFlag::Confidentiality);
        }
        if self.integrity {
            flags.push(SecurityFlag::Integrity);
        }
        flags.into_iter()
    }
}

impl FromIterator<SecurityFlag> for SecurityFlags {
    fn from_iter<I: IntoIterator<Item = SecurityFlag>>(iter: I) -> Self {
        let mut flags = Self::new();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl From<SecurityFlag> for SecurityFlags {
    fn from(flag: SecurityFlag) -> Self {
        Self::new().with(flag)
    }
}

/// An uploader-supplied RSA signature over original document content.
///
/// The server stores and verifies signatures but never produces them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Signature({}...)", &hex[..hex.len().min(16)])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A content key encrypted under the server's RSA public key.
///
/// Only the server's private key can recover the symmetric key inside.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey(Vec<u8>);

impl WrappedKey {
    /// Wrap raw ciphertext bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(&self.0);
        write!(f, "WrappedKey({}...)", &hex[..hex.len().min(16)])
    }
}

impl AsRef<[u8]> for WrappedKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A user's RSA public key as stored in the user registry.
///
/// Kept as raw big-endian modulus and exponent components; the seal layer
/// reconstructs a usable key from them when verifying signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPublicKey {
    /// Big-endian modulus bytes.
    pub modulus: Vec<u8>,
    /// Big-endian public exponent bytes.
    pub exponent: Vec<u8>,
}

impl UserPublicKey {
    /// Create from big-endian component bytes.
    pub fn new(modulus: impl Into<Vec<u8>>, exponent: impl Into<Vec<u8>>) -> Self {
        Self {
            modulus: modulus.into(),
            exponent: exponent.into(),
        }
    }
}

/// A document row as persisted by the store.
///
/// When the document is confidential, `content` holds the sealed envelope
/// bytes and `wrapped_key` the RSA-wrapped content key. Plaintext and raw
/// keys are never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Document name (unique key).
    pub name: DocumentName,
    /// Stored content bytes (sealed envelope when confidential).
    pub content: Bytes,
    /// Who uploaded the current revision.
    pub uploader: UserName,
    /// RSA-wrapped content key, present iff the document is confidential.
    pub wrapped_key: Option<WrappedKey>,
    /// Uploader signature, present iff the document declares integrity.
    pub signature: Option<Signature>,
}

/// A checked-out document as returned to the caller.
///
/// Content is plaintext: the pipeline has already opened the envelope and
/// verified the signature where the flags required it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDownload {
    /// Document name.
    pub name: DocumentName,
    /// Who uploaded the revision being checked out.
    pub uploader: UserName,
    /// Plaintext content bytes.
    pub content: Bytes,
    /// Uploader signature, if the document declares integrity.
    pub signature: Option<Signature>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grantee_key_roundtrip() {
        let user = Grantee::User(UserName::new("alice"));
        assert_eq!(Grantee::from_key(user.as_key()), user);

        let all = Grantee::AllUsers;
        assert_eq!(all.as_key(), "*");
        assert_eq!(Grantee::from_key("*"), Grantee::AllUsers);
    }

    #[test]
    fn test_security_flag_roundtrip() {
        for flag in [SecurityFlag::Confidentiality, SecurityFlag::Integrity] {
            assert_eq!(SecurityFlag::from_str(flag.as_str()).unwrap(), flag);
        }
        assert!(SecurityFlag::from_str("TAMPER_EVIDENT").is_err());
    }

    #[test]
    fn test_security_flags_set_semantics() {
        let mut flags = SecurityFlags::new();
        assert!(flags.is_empty());

        flags.insert(SecurityFlag::Confidentiality);
        assert!(flags.contains(SecurityFlag::Confidentiality));
        assert!(!flags.contains(SecurityFlag::Integrity));

        // Inserting twice is idempotent
        flags.insert(SecurityFlag::Confidentiality);
        assert_eq!(flags.iter().count(), 1);

        let both: SecurityFlags = [SecurityFlag::Confidentiality, SecurityFlag::Integrity]
            .into_iter()
            .collect();
        assert_eq!(both.iter().count(), 2);
    }

    #[test]
    fn test_grantee_serde_roundtrip() {
        for grantee in [Grantee::User(UserName::new("alice")), Grantee::AllUsers] {
            let json = serde_json::to_string(&grantee).unwrap();
            assert_eq!(serde_json::from_str::<Grantee>(&json).unwrap(), grantee);
        }
    }

    #[test]
    fn test_signature_debug_is_truncated_hex() {
        let sig = Signature::from_bytes(vec![0xab; 64]);
        let debug = format!("{:?}", sig);
        assert!(debug.starts_with("Signature(abababab"));
        assert!(debug.len() < 40);
    }
}
