//! # docvault Core
//!
//! Pure primitives for the docvault document store: identities, document
//! names, security flags, and document records.
//!
//! This crate contains no I/O, no storage, no cryptography. It is pure
//! computation over value types shared by every other docvault crate.
//!
//! ## Key Types
//!
//! - [`DocumentName`] / [`UserName`] - string-keyed identifiers
//! - [`Grantee`] - grant recipient: a named user or the wildcard
//! - [`SecurityFlags`] - per-document protection declarations
//! - [`DocumentRecord`] - a document row as persisted
//! - [`DocumentDownload`] - a checked-out document as released to callers

pub mod error;
pub mod types;
pub mod validation;

pub use error::{CoreError, ValidationError};
pub use types::{
    DocumentDownload, DocumentName, DocumentRecord, Grantee, SecurityFlag, SecurityFlags,
    Signature, UserName, UserPublicKey, WrappedKey, ALL_USERS_KEY,
};
pub use validation::validate_record;
