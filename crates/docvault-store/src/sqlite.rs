//! SQLite implementation of the Store trait.
//!
//! The primary storage backend. Uses rusqlite with bundled SQLite behind a
//! mutex, wrapped in async via `tokio::task::spawn_blocking` so individual
//! statements stay blocking from the caller's perspective without stalling
//! the runtime.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use docvault_core::{
    DocumentName, DocumentRecord, Grantee, SecurityFlag, SecurityFlags, Signature, UserName,
    UserPublicKey, WrappedKey, ALL_USERS_KEY,
};
use docvault_perms::{Grant, Permission};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via an internal mutex. Every trait method runs one statement
/// (or one tight statement sequence) on a blocking task.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on a blocking task.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Background(e.to_string()))?
    }
}

/// Raw grant row as read from SQLite, before enum decoding.
type GrantRow = (String, String, String, Option<i64>, bool);

fn decode_grant(row: GrantRow) -> Result<Grant> {
    let (document, grantee, permission, expires_at, can_propagate) = row;
    let permission = Permission::from_str(&permission)
        .map_err(|e| StoreError::InvalidData(e.to_string()))?;

    Ok(Grant {
        document: DocumentName::new(document),
        grantee: Grantee::from_key(&grantee),
        permission,
        expires_at,
        can_propagate,
    })
}

fn query_grants(conn: &Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Grant>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, bool>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<GrantRow>>>()?;

    rows.into_iter().map(decode_grant).collect()
}

#[async_trait]
impl Store for SqliteStore {
    async fn document_exists(&self, name: &DocumentName) -> Result<bool> {
        let name = name.clone();
        self.blocking(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM documents WHERE document_name = ?1)",
                params![name.as_str()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn put_document(&self, record: &DocumentRecord) -> Result<()> {
        let record = record.clone();
        self.blocking(move |conn| {
            debug!(document = %record.name, "inserting document row");
            conn.execute(
                "INSERT INTO documents (document_name, contents, upload_user, encryption_key, signature)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.name.as_str(),
                    record.content.as_ref(),
                    record.uploader.as_str(),
                    record.wrapped_key.as_ref().map(|k| k.as_bytes()),
                    record.signature.as_ref().map(|s| s.as_bytes()),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_document(&self, name: &DocumentName) -> Result<Option<DocumentRecord>> {
        let name = name.clone();
        self.blocking(move |conn| {
            let row: Option<(String, Vec<u8>, String, Option<Vec<u8>>, Option<Vec<u8>>)> = conn
                .query_row(
                    "SELECT document_name, contents, upload_user, encryption_key, signature
                     FROM documents WHERE document_name = ?1",
                    params![name.as_str()],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                        ))
                    },
                )
                .optional()?;

            Ok(row.map(|(name, contents, uploader, key, signature)| DocumentRecord {
                name: DocumentName::new(name),
                content: Bytes::from(contents),
                uploader: UserName::new(uploader),
                wrapped_key: key.map(WrappedKey::from_bytes),
                signature: signature.map(Signature::from_bytes),
            }))
        })
        .await
    }

    async fn overwrite_document(&self, record: &DocumentRecord) -> Result<()> {
        let record = record.clone();
        self.blocking(move |conn| {
            conn.execute(
                "UPDATE documents
                    SET contents = ?1,
                        upload_user = ?2,
                        encryption_key = ?3,
                        signature = ?4
                  WHERE document_name = ?5",
                params![
                    record.content.as_ref(),
                    record.uploader.as_str(),
                    record.wrapped_key.as_ref().map(|k| k.as_bytes()),
                    record.signature.as_ref().map(|s| s.as_bytes()),
                    record.name.as_str(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn overwrite_content(&self, name: &DocumentName, content: &[u8]) -> Result<()> {
        let name = name.clone();
        let content = content.to_vec();
        self.blocking(move |conn| {
            debug!(document = %name, bytes = content.len(), "overwriting stored content");
            conn.execute(
                "UPDATE documents SET contents = ?1 WHERE document_name = ?2",
                params![content, name.as_str()],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_row(&self, name: &DocumentName) -> Result<()> {
        let name = name.clone();
        self.blocking(move |conn| {
            debug!(document = %name, "deleting document row");
            conn.execute(
                "DELETE FROM documents WHERE document_name = ?1",
                params![name.as_str()],
            )?;
            Ok(())
        })
        .await
    }

    async fn set_flags(&self, name: &DocumentName, flags: SecurityFlags) -> Result<()> {
        let name = name.clone();
        self.blocking(move |conn| {
            for flag in flags.iter() {
                conn.execute(
                    "INSERT OR REPLACE INTO document_security (document_name, security_flag)
                     VALUES (?1, ?2)",
                    params![name.as_str(), flag.as_str()],
                )?;
            }
            Ok(())
        })
        .await
    }

    async fn clear_flags(&self, name: &DocumentName) -> Result<()> {
        let name = name.clone();
        self.blocking(move |conn| {
            conn.execute(
                "DELETE FROM document_security WHERE document_name = ?1",
                params![name.as_str()],
            )?;
            Ok(())
        })
        .await
    }

    async fn flags_of(&self, name: &DocumentName) -> Result<SecurityFlags> {
        let name = name.clone();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT security_flag FROM document_security WHERE document_name = ?1",
            )?;
            let raw: Vec<String> = stmt
                .query_map(params![name.as_str()], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            raw.iter()
                .map(|s| {
                    SecurityFlag::from_str(s).map_err(|e| StoreError::InvalidData(e.to_string()))
                })
                .collect()
        })
        .await
    }

    async fn grants_for(&self, name: &DocumentName, actor: &UserName) -> Result<Vec<Grant>> {
        let name = name.clone();
        let actor = actor.clone();
        self.blocking(move |conn| {
            query_grants(
                conn,
                "SELECT document_name, grantee, permission, expires_at, can_propagate
                   FROM document_permissions
                  WHERE document_name = ?1
                    AND (grantee = ?2 OR grantee = ?3)",
                &[&name.as_str(), &actor.as_str(), &ALL_USERS_KEY],
            )
        })
        .await
    }

    async fn grants_matching(
        &self,
        name: &DocumentName,
        grantee: &Grantee,
        permission: Permission,
    ) -> Result<Vec<Grant>> {
        let name = name.clone();
        let grantee = grantee.clone();
        self.blocking(move |conn| {
            query_grants(
                conn,
                "SELECT document_name, grantee, permission, expires_at, can_propagate
                   FROM document_permissions
                  WHERE document_name = ?1
                    AND grantee = ?2
                    AND permission = ?3",
                &[&name.as_str(), &grantee.as_key(), &permission.as_str()],
            )
        })
        .await
    }

    async fn insert_grant(&self, grant: &Grant) -> Result<()> {
        let grant = grant.clone();
        self.blocking(move |conn| {
            debug!(
                document = %grant.document,
                grantee = %grant.grantee,
                permission = %grant.permission,
                "inserting grant row"
            );
            conn.execute(
                "INSERT INTO document_permissions
                    (document_name, grantee, permission, expires_at, can_propagate)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    grant.document.as_str(),
                    grant.grantee.as_key(),
                    grant.permission.as_str(),
                    grant.expires_at,
                    grant.can_propagate,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn update_grant(&self, grant: &Grant) -> Result<()> {
        let grant = grant.clone();
        self.blocking(move |conn| {
            conn.execute(
                "UPDATE document_permissions
                    SET expires_at = ?1,
                        can_propagate = ?2
                  WHERE document_name = ?3
                    AND grantee = ?4
                    AND permission = ?5",
                params![
                    grant.expires_at,
                    grant.can_propagate,
                    grant.document.as_str(),
                    grant.grantee.as_key(),
                    grant.permission.as_str(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_all_grants(&self, name: &DocumentName) -> Result<()> {
        let name = name.clone();
        self.blocking(move |conn| {
            conn.execute(
                "DELETE FROM document_permissions WHERE document_name = ?1",
                params![name.as_str()],
            )?;
            Ok(())
        })
        .await
    }

    async fn add_user(&self, name: &UserName, key: &UserPublicKey) -> Result<()> {
        let name = name.clone();
        let key = key.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO users (user_name, pub_key_modulus, pub_key_exponent)
                 VALUES (?1, ?2, ?3)",
                params![name.as_str(), key.modulus, key.exponent],
            )?;
            Ok(())
        })
        .await
    }

    async fn user_public_key(&self, name: &UserName) -> Result<Option<UserPublicKey>> {
        let name = name.clone();
        self.blocking(move |conn| {
            let row: Option<(Vec<u8>, Vec<u8>)> = conn
                .query_row(
                    "SELECT pub_key_modulus, pub_key_exponent FROM users WHERE user_name = ?1",
                    params![name.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            Ok(row.map(|(modulus, exponent)| UserPublicKey::new(modulus, exponent)))
        })
        .await
    }
}
