//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system: each migration is a SQL batch that
//! transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Document rows: one per stored document
        CREATE TABLE documents (
            document_name TEXT PRIMARY KEY,
            contents BLOB NOT NULL,           -- sealed envelope bytes when confidential
            upload_user TEXT NOT NULL,
            encryption_key BLOB,              -- RSA-wrapped content key, nullable
            signature BLOB                    -- uploader signature, nullable
        );

        -- Permission grants: several rows per (document, grantee) allowed
        CREATE TABLE document_permissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_name TEXT NOT NULL,
            grantee TEXT NOT NULL,            -- user name, or '*' for all users
            permission TEXT NOT NULL,         -- READ | WRITE | BOTH | OWNER
            expires_at INTEGER,               -- Unix ms, NULL = permanent
            can_propagate INTEGER NOT NULL DEFAULT 0
        );

        -- Declared security flags, one row per flag
        CREATE TABLE document_security (
            document_name TEXT NOT NULL,
            security_flag TEXT NOT NULL,      -- CONFIDENTIALITY | INTEGRITY
            PRIMARY KEY (document_name, security_flag)
        );

        -- User registry with RSA public key components
        CREATE TABLE users (
            user_name TEXT PRIMARY KEY,
            pub_key_modulus BLOB NOT NULL,    -- big-endian
            pub_key_exponent BLOB NOT NULL    -- big-endian
        );

        -- Indexes for the per-operation authorization queries
        CREATE INDEX idx_permissions_document ON document_permissions(document_name);
        CREATE INDEX idx_permissions_grantee ON document_permissions(document_name, grantee);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"document_permissions".to_string()));
        assert!(tables.contains(&"document_security".to_string()));
        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }
}
