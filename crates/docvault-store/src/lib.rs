//! # docvault Store
//!
//! Storage boundary for docvault. Provides a trait-based interface over
//! document rows, permission grants, security flags, and the user registry,
//! with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The [`Store`] trait keeps the vault storage-agnostic. The primary
//! implementation is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! Grant and flag state is owned exclusively by the store; callers re-query
//! per operation instead of caching, so a revocation or expiry is always
//! observed by the next request.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docvault_store::{SqliteStore, Store};
//! use docvault_core::DocumentName;
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("vault.db").unwrap();
//!
//!     // Or an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let present = store
//!         .document_exists(&DocumentName::new("report.txt"))
//!         .await
//!         .unwrap();
//!     assert!(!present);
//! }
//! ```

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;
