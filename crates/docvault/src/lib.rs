//! # docvault
//!
//! A check-in/check-out document store with per-document access control and
//! envelope cryptography.
//!
//! ## Overview
//!
//! Every stored document carries its own access-control entries and optional
//! cryptographic protections:
//!
//! - **Permissions**: time-bounded, propagation-limited grants forming a
//!   dominance lattice (`Owner` on top). Effective rights are the union of
//!   an actor's currently valid grants plus any all-users grant.
//! - **Confidentiality**: content sealed under a fresh AES-128 key, which is
//!   itself RSA-wrapped under the server keypair.
//! - **Integrity**: an uploader-computed RSA signature, verified against the
//!   uploader's registered key on every download.
//!
//! Operations fail closed: missing or expired grants deny access, and no
//! plaintext or unverified content ever reaches a caller.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docvault::{Vault, VaultConfig};
//! use docvault::core::{DocumentName, SecurityFlags, UserName};
//! use docvault::seal::ServerKeyPair;
//! use docvault::store::SqliteStore;
//!
//! async fn example() {
//!     let server_keys = ServerKeyPair::generate().unwrap();
//!     let store = SqliteStore::open("vault.db").unwrap();
//!     let vault = Vault::new(server_keys, store, VaultConfig::default());
//!
//!     let alice = UserName::new("alice");
//!     vault
//!         .upload(
//!             &alice,
//!             &DocumentName::new("report.txt"),
//!             b"quarterly numbers",
//!             SecurityFlags::NONE,
//!             None,
//!         )
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `docvault::core` - shared primitives (names, flags, records)
//! - `docvault::perms` - the permission lattice and delegation engine
//! - `docvault::seal` - envelope crypto and the security pipeline
//! - `docvault::store` - the storage boundary and its backends

pub mod error;
pub mod vault;

// Re-export component crates
pub use docvault_core as core;
pub use docvault_perms as perms;
pub use docvault_seal as seal;
pub use docvault_store as store;

// Re-export main types for convenience
pub use error::{Result, VaultError};
pub use vault::{Vault, VaultConfig};

// Re-export commonly used component types
pub use docvault_core::{
    DocumentDownload, DocumentName, Grantee, SecurityFlag, SecurityFlags, Signature, UserName,
    UserPublicKey,
};
pub use docvault_perms::{Grant, Permission, PermissionSet};
pub use docvault_seal::ServerKeyPair;
