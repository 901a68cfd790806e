//! In-memory implementation of the Store trait.
//!
//! Primarily for testing. Same semantics as SQLite but keeps everything in
//! memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use docvault_core::{
    DocumentName, DocumentRecord, Grantee, SecurityFlags, UserName, UserPublicKey,
};
use docvault_perms::{Grant, Permission};

use crate::error::Result;
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Document rows by name.
    documents: HashMap<DocumentName, DocumentRecord>,

    /// Declared flags by name.
    flags: HashMap<DocumentName, SecurityFlags>,

    /// Grant rows, in insertion order.
    grants: Vec<Grant>,

    /// User registry.
    users: HashMap<UserName, UserPublicKey>,

    /// Content lengths written via `overwrite_content`, for tests asserting
    /// the secure-delete zero-fill step.
    content_overwrites: Vec<(DocumentName, usize)>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                documents: HashMap::new(),
                flags: HashMap::new(),
                grants: Vec::new(),
                users: HashMap::new(),
                content_overwrites: Vec::new(),
            }),
        }
    }

    /// The lengths of every `overwrite_content` payload so far.
    pub fn content_overwrites(&self) -> Vec<(DocumentName, usize)> {
        self.inner.read().unwrap().content_overwrites.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn document_exists(&self, name: &DocumentName) -> Result<bool> {
        let inner = self.inner.read().unwrap();
        Ok(inner.documents.contains_key(name))
    }

    async fn put_document(&self, record: &DocumentRecord) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.documents.insert(record.name.clone(), record.clone());
        Ok(())
    }

    async fn get_document(&self, name: &DocumentName) -> Result<Option<DocumentRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.documents.get(name).cloned())
    }

    async fn overwrite_document(&self, record: &DocumentRecord) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if let Some(existing) = inner.documents.get_mut(&record.name) {
            *existing = record.clone();
        }
        Ok(())
    }

    async fn overwrite_content(&self, name: &DocumentName, content: &[u8]) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner
            .content_overwrites
            .push((name.clone(), content.len()));
        if let Some(existing) = inner.documents.get_mut(name) {
            existing.content = Bytes::copy_from_slice(content);
        }
        Ok(())
    }

    async fn delete_row(&self, name: &DocumentName) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.documents.remove(name);
        Ok(())
    }

    async fn set_flags(&self, name: &DocumentName, flags: SecurityFlags) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let entry = inner.flags.entry(name.clone()).or_default();
        for flag in flags.iter() {
            entry.insert(flag);
        }
        Ok(())
    }

    async fn clear_flags(&self, name: &DocumentName) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.flags.remove(name);
        Ok(())
    }

    async fn flags_of(&self, name: &DocumentName) -> Result<SecurityFlags> {
        let inner = self.inner.read().unwrap();
        Ok(inner.flags.get(name).copied().unwrap_or_default())
    }

    async fn grants_for(&self, name: &DocumentName, actor: &UserName) -> Result<Vec<Grant>> {
        let inner = self.inner.read().unwrap();
        let actor = Grantee::User(actor.clone());
        Ok(inner
            .grants
            .iter()
            .filter(|g| {
                g.document == *name && (g.grantee == actor || g.grantee == Grantee::AllUsers)
            })
            .cloned()
            .collect())
    }

    async fn grants_matching(
        &self,
        name: &DocumentName,
        grantee: &Grantee,
        permission: Permission,
    ) -> Result<Vec<Grant>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .grants
            .iter()
            .filter(|g| {
                g.document == *name && g.grantee == *grantee && g.permission == permission
            })
            .cloned()
            .collect())
    }

    async fn insert_grant(&self, grant: &Grant) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.grants.push(grant.clone());
        Ok(())
    }

    async fn update_grant(&self, grant: &Grant) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        for existing in inner.grants.iter_mut().filter(|g| {
            g.document == grant.document
                && g.grantee == grant.grantee
                && g.permission == grant.permission
        }) {
            existing.expires_at = grant.expires_at;
            existing.can_propagate = grant.can_propagate;
        }
        Ok(())
    }

    async fn delete_all_grants(&self, name: &DocumentName) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.grants.retain(|g| g.document != *name);
        Ok(())
    }

    async fn add_user(&self, name: &UserName, key: &UserPublicKey) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.users.insert(name.clone(), key.clone());
        Ok(())
    }

    async fn user_public_key(&self, name: &UserName) -> Result<Option<UserPublicKey>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.users.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, content: &[u8]) -> DocumentRecord {
        DocumentRecord {
            name: DocumentName::new(name),
            content: Bytes::copy_from_slice(content),
            uploader: UserName::new("alice"),
            wrapped_key: None,
            signature: None,
        }
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let name = DocumentName::new("doc");

        store.put_document(&record("doc", b"body")).await.unwrap();
        assert!(store.document_exists(&name).await.unwrap());

        store.delete_row(&name).await.unwrap();
        assert!(!store.document_exists(&name).await.unwrap());
    }

    #[tokio::test]
    async fn test_grants_union_semantics() {
        let store = MemoryStore::new();
        let name = DocumentName::new("doc");
        let bob = Grantee::User(UserName::new("bob"));

        // Two simultaneous grants for the same grantee are both kept
        for permission in [Permission::Read, Permission::Write] {
            store
                .insert_grant(&Grant {
                    document: name.clone(),
                    grantee: bob.clone(),
                    permission,
                    expires_at: None,
                    can_propagate: false,
                })
                .await
                .unwrap();
        }

        let grants = store.grants_for(&name, &UserName::new("bob")).await.unwrap();
        assert_eq!(grants.len(), 2);
    }

    #[tokio::test]
    async fn test_overwrite_log_records_lengths() {
        let store = MemoryStore::new();
        let name = DocumentName::new("doc");

        store.put_document(&record("doc", b"0123456789")).await.unwrap();
        store.overwrite_content(&name, &[0u8; 10]).await.unwrap();

        assert_eq!(store.content_overwrites(), vec![(name, 10)]);
    }

    #[tokio::test]
    async fn test_update_grant_replaces_fields() {
        let store = MemoryStore::new();
        let name = DocumentName::new("doc");
        let bob = Grantee::User(UserName::new("bob"));

        store
            .insert_grant(&Grant {
                document: name.clone(),
                grantee: bob.clone(),
                permission: Permission::Read,
                expires_at: Some(100),
                can_propagate: false,
            })
            .await
            .unwrap();

        store
            .update_grant(&Grant {
                document: name.clone(),
                grantee: bob.clone(),
                permission: Permission::Read,
                expires_at: None,
                can_propagate: true,
            })
            .await
            .unwrap();

        let grants = store.grants_matching(&name, &bob, Permission::Read).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].expires_at, None);
        assert!(grants[0].can_propagate);
    }
}
