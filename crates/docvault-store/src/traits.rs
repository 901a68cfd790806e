//! Store trait: the persistence boundary for documents, grants, flags, and
//! the user registry.
//!
//! The trait keeps the vault storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests). Each method corresponds to
//! one statement against the backend; multi-statement sequences (secure
//! delete in particular) are composed by the caller and are NOT atomic
//! across statements.
//!
//! # Design Notes
//!
//! - **No time logic here**: grant rows are returned whether expired or not;
//!   validity at "now" is the permission engine's concern. The store is the
//!   single owner of persisted authorization state, which the vault
//!   re-queries on every operation.
//! - **Wildcard rows**: `grants_for` returns rows for the named actor plus
//!   any all-users rows, since effective rights are the union of both.

use async_trait::async_trait;

use docvault_core::{DocumentName, DocumentRecord, Grantee, SecurityFlags, UserName, UserPublicKey};
use docvault_perms::{Grant, Permission};

use crate::error::Result;

/// The Store trait: async interface for document-store persistence.
///
/// All methods are async to support both sync (SQLite via `spawn_blocking`)
/// and async backends.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Document Rows
    // ─────────────────────────────────────────────────────────────────────────

    /// Check whether a document row exists.
    async fn document_exists(&self, name: &DocumentName) -> Result<bool>;

    /// Insert a new document row.
    async fn put_document(&self, record: &DocumentRecord) -> Result<()>;

    /// Fetch a document row, or `None` if no row matches.
    async fn get_document(&self, name: &DocumentName) -> Result<Option<DocumentRecord>>;

    /// Replace content, uploader, wrapped key, and signature of an existing
    /// row.
    async fn overwrite_document(&self, record: &DocumentRecord) -> Result<()>;

    /// Replace only the stored content bytes of an existing row.
    ///
    /// This is the zero-fill step of secure delete; it must be persisted as
    /// its own write, not folded into the row removal.
    async fn overwrite_content(&self, name: &DocumentName, content: &[u8]) -> Result<()>;

    /// Remove a document row.
    async fn delete_row(&self, name: &DocumentName) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Security Flags
    // ─────────────────────────────────────────────────────────────────────────

    /// Record the declared flags for a document.
    async fn set_flags(&self, name: &DocumentName, flags: SecurityFlags) -> Result<()>;

    /// Remove every flag recorded for a document.
    async fn clear_flags(&self, name: &DocumentName) -> Result<()>;

    /// The flags currently recorded for a document (empty set if none).
    async fn flags_of(&self, name: &DocumentName) -> Result<SecurityFlags>;

    // ─────────────────────────────────────────────────────────────────────────
    // Permission Grants
    // ─────────────────────────────────────────────────────────────────────────

    /// All grant rows applying to `actor` on `name`: rows granted to the
    /// actor directly plus any all-users rows. Expired rows are included.
    async fn grants_for(&self, name: &DocumentName, actor: &UserName) -> Result<Vec<Grant>>;

    /// Grant rows for an exact (document, grantee, permission) triple.
    ///
    /// Used to decide between overriding an existing grant and inserting a
    /// new one.
    async fn grants_matching(
        &self,
        name: &DocumentName,
        grantee: &Grantee,
        permission: Permission,
    ) -> Result<Vec<Grant>>;

    /// Insert a new grant row.
    async fn insert_grant(&self, grant: &Grant) -> Result<()>;

    /// Update the expiry and propagation flag of the rows matching the
    /// grant's (document, grantee, permission) triple.
    async fn update_grant(&self, grant: &Grant) -> Result<()>;

    /// Remove every grant row for a document (named and wildcard alike).
    async fn delete_all_grants(&self, name: &DocumentName) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // User Registry
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a user and their RSA public key.
    async fn add_user(&self, name: &UserName, key: &UserPublicKey) -> Result<()>;

    /// Fetch a user's registered public key, or `None` if unknown.
    async fn user_public_key(&self, name: &UserName) -> Result<Option<UserPublicKey>>;
}
