//! The Vault: the document lifecycle orchestrator.
//!
//! Every operation enters here, authorizes against freshly queried grant
//! rows, transforms content through the security pipeline, and persists
//! through the store. A document name moves between exactly two persisted
//! states: absent and present.

use std::sync::Arc;

use tracing::{debug, info};

use docvault_core::{
    validate_record, DocumentDownload, DocumentName, DocumentRecord, Grantee, SecurityFlag,
    SecurityFlags, Signature, UserName, UserPublicKey,
};
use docvault_perms::{
    can_delegate, effective_expiry, effective_permissions, max_delegation_time,
    valid_permissions_to_propagate, Grant, Permission, PermissionSet,
};
use docvault_seal::{SecurityPipeline, ServerKeyPair};
use docvault_store::Store;

use crate::error::{Result, VaultError};

/// Configuration for the Vault.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Whether to check record/flag invariants before persisting.
    pub validate_records: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            validate_records: true,
        }
    }
}

/// The main Vault struct.
///
/// Provides the document lifecycle API:
/// - check-in ([`upload`](Vault::upload)) and check-out
///   ([`download`](Vault::download))
/// - delegation of time-bounded, propagation-limited permissions
/// - secure delete
///
/// Authorization state is never cached: each operation re-queries the
/// store, so revocations and expirations take effect on the next request.
pub struct Vault<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Flag-driven content transformation around the server keypair.
    pipeline: SecurityPipeline,
    /// Configuration.
    config: VaultConfig,
}

impl<S: Store> Vault<S> {
    /// Create a new vault over a store and the server keypair.
    pub fn new(server_keys: ServerKeyPair, store: S, config: VaultConfig) -> Self {
        Self {
            store: Arc::new(store),
            pipeline: SecurityPipeline::new(server_keys),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a user's RSA public key for signature verification.
    pub async fn register_user(&self, name: &UserName, key: &UserPublicKey) -> Result<()> {
        debug!(user = %name, "registering user public key");
        Ok(self.store.add_user(name, key).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Check-in / Check-out
    // ─────────────────────────────────────────────────────────────────────────

    /// Check a document in.
    ///
    /// First upload creates the document and grants the uploader a permanent,
    /// propagable `Owner` permission. Overwriting requires write permission
    /// and replaces content, uploader, key, signature, and the full flag set;
    /// flags from the previous revision never survive.
    pub async fn upload(
        &self,
        actor: &UserName,
        name: &DocumentName,
        content: &[u8],
        flags: SecurityFlags,
        signature: Option<Signature>,
    ) -> Result<()> {
        let sealed = self
            .pipeline
            .seal(name, content, flags, signature)
            .map_err(|e| VaultError::from_seal(name, e))?;

        let record = DocumentRecord {
            name: name.clone(),
            content: sealed.content,
            uploader: actor.clone(),
            wrapped_key: sealed.wrapped_key,
            signature: sealed.signature,
        };

        if self.config.validate_records {
            validate_record(&record, flags)?;
        }

        if !self.store.document_exists(name).await? {
            info!(document = %name, actor = %actor, "uploading new document");
            self.store.put_document(&record).await?;

            // The uploader becomes the owner: permanent and propagable.
            info!(document = %name, actor = %actor, "granting uploader ownership");
            self.store
                .insert_grant(&Grant::uploader(name.clone(), Grantee::User(actor.clone())))
                .await?;
        } else {
            info!(document = %name, actor = %actor, "document exists, checking write permission");

            let grants = self.store.grants_for(name, actor).await?;
            if !effective_permissions(&grants, now_millis()).implies_write() {
                info!(document = %name, actor = %actor, "write permission denied");
                return Err(VaultError::UserLacksPermission(
                    "write permission is required to overwrite an existing document".to_string(),
                ));
            }

            info!(document = %name, actor = %actor, "overwriting document");
            self.store.overwrite_document(&record).await?;

            // Drop the previous revision's flags; only the newly requested
            // set is re-recorded below.
            self.store.clear_flags(name).await?;
        }

        self.store.set_flags(name, flags).await?;
        Ok(())
    }

    /// Check a document out.
    ///
    /// The record is fetched before the permission check, so a missing
    /// document reports `DocumentNotFound` rather than `UserLacksPermission`
    /// (a deleted document's grants are gone with it). Content is opened and
    /// verified by the pipeline before anything is released.
    pub async fn download(&self, actor: &UserName, name: &DocumentName) -> Result<DocumentDownload> {
        let record = self
            .store
            .get_document(name)
            .await?
            .ok_or_else(|| VaultError::DocumentNotFound(name.clone()))?;

        self.require_read(actor, name, "read permission is required to check a document out")
            .await?;

        let flags = self.store.flags_of(name).await?;
        debug!(document = %name, ?flags, "opening with declared flags");

        let uploader_key = self.verification_key(&record, flags).await?;

        let download = self
            .pipeline
            .open(&record, flags, uploader_key.as_ref())
            .map_err(|e| VaultError::from_seal(name, e))?;

        info!(document = %name, actor = %actor, "document checked out");
        Ok(download)
    }

    /// Fetch a document's stored signature.
    ///
    /// Requires the same read permission as a full download.
    pub async fn signature(&self, actor: &UserName, name: &DocumentName) -> Result<Option<Signature>> {
        let record = self
            .store
            .get_document(name)
            .await?
            .ok_or_else(|| VaultError::DocumentNotFound(name.clone()))?;

        self.require_read(
            actor,
            name,
            "read permission is required to view a document's signature",
        )
        .await?;

        Ok(record.signature)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Delegation
    // ─────────────────────────────────────────────────────────────────────────

    /// Delegate permissions on a document to another grantee.
    ///
    /// Each permission in the set is delegated independently. The persisted
    /// expiry is `now + min(requested, system ceiling)`, where the ceiling
    /// comes from the delegator's own soonest-expiring qualifying grant; a
    /// delegation can never outlive the authority it derives from.
    pub async fn delegate(
        &self,
        actor: &UserName,
        name: &DocumentName,
        permissions: PermissionSet,
        grantee: Grantee,
        requested_millis: Option<i64>,
        can_propagate: bool,
    ) -> Result<()> {
        for permission in permissions.iter() {
            self.delegate_single(actor, name, permission, &grantee, requested_millis, can_propagate)
                .await?;
        }
        Ok(())
    }

    async fn delegate_single(
        &self,
        actor: &UserName,
        name: &DocumentName,
        permission: Permission,
        grantee: &Grantee,
        requested_millis: Option<i64>,
        can_propagate: bool,
    ) -> Result<()> {
        info!(
            document = %name,
            actor = %actor,
            %permission,
            %grantee,
            "checking delegation rights"
        );

        let valid_set = valid_permissions_to_propagate(permission);
        let now = now_millis();

        // Wildcard rows authorize use, never delegation: the authority to
        // hand a permission down must be held by name.
        let own_grants: Vec<Grant> = self
            .store
            .grants_for(name, actor)
            .await?
            .into_iter()
            .filter(|g| g.grantee == Grantee::User(actor.clone()))
            .collect();

        if !can_delegate(&own_grants, valid_set, now) {
            info!(document = %name, actor = %actor, %permission, "delegation denied");
            return Err(VaultError::UserLacksPermission(
                "you do not possess the ability to further propagate the permission".to_string(),
            ));
        }

        // The delegator's own remaining time caps what they may hand down.
        let system_max = max_delegation_time(&own_grants, valid_set, now)?;
        let expires_at = effective_expiry(requested_millis, system_max, now);

        let grant = Grant {
            document: name.clone(),
            grantee: grantee.clone(),
            permission,
            expires_at,
            can_propagate,
        };

        let existing = self.store.grants_matching(name, grantee, permission).await?;
        if existing.iter().any(|g| g.is_valid(now)) {
            info!(%grantee, %permission, "valid grant already held, overriding in place");
            self.store.update_grant(&grant).await?;
        } else {
            info!(%grantee, %permission, document = %name, "inserting new grant");
            self.store.insert_grant(&grant).await?;
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Secure Delete
    // ─────────────────────────────────────────────────────────────────────────

    /// Securely delete a document. Owner only.
    ///
    /// Three persisted steps, in fixed order: delete every grant, clear the
    /// flags, then zero-overwrite the stored content (a same-length block of
    /// zeros, written as its own statement) and remove the row. The
    /// overwrite resists forensic recovery of the deleted content and must
    /// not be folded into the row removal.
    ///
    /// The steps are not wrapped in a single transaction; a crash in between
    /// can leave a document with cleared flags but surviving content, or
    /// zeroed content with a surviving row.
    pub async fn delete(&self, actor: &UserName, name: &DocumentName) -> Result<()> {
        let record = self
            .store
            .get_document(name)
            .await?
            .ok_or_else(|| VaultError::DocumentNotFound(name.clone()))?;

        info!(document = %name, actor = %actor, "checking delete permission");
        let grants = self.store.grants_for(name, actor).await?;
        if !effective_permissions(&grants, now_millis()).has_owner() {
            info!(document = %name, actor = %actor, "delete denied, ownership required");
            return Err(VaultError::UserLacksPermission(
                "only a document's owner is allowed to delete it".to_string(),
            ));
        }

        info!(document = %name, "deleting all permissions");
        self.store.delete_all_grants(name).await?;

        info!(document = %name, "removing security flags");
        self.store.clear_flags(name).await?;

        info!(document = %name, "performing secure delete");
        let zeros = vec![0u8; record.content.len()];
        self.store.overwrite_content(name, &zeros).await?;
        self.store.delete_row(name).await?;

        info!(document = %name, "document deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Authorize a read against freshly queried grants.
    async fn require_read(
        &self,
        actor: &UserName,
        name: &DocumentName,
        denial: &str,
    ) -> Result<()> {
        let grants = self.store.grants_for(name, actor).await?;
        if !effective_permissions(&grants, now_millis()).implies_read() {
            info!(document = %name, actor = %actor, "read permission denied");
            return Err(VaultError::UserLacksPermission(denial.to_string()));
        }
        Ok(())
    }

    /// Resolve the uploader's verification key when integrity is declared.
    async fn verification_key(
        &self,
        record: &DocumentRecord,
        flags: SecurityFlags,
    ) -> Result<Option<UserPublicKey>> {
        if !flags.contains(SecurityFlag::Integrity) {
            return Ok(None);
        }

        debug!(uploader = %record.uploader, "fetching uploader public key");
        let key = self
            .store
            .user_public_key(&record.uploader)
            .await?
            .ok_or_else(|| VaultError::UnknownUser(record.uploader.clone()))?;
        Ok(Some(key))
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
