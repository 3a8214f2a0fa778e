//! Durable tenant records (SQLite).
//!
//! One row per tenant: display info plus the graph credential triple.
//! Rows are never hard-deleted by this core.

use crate::error::Result;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

/// Durable tenant record. `updated_at_ms` advances on any re-registration.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TenantRecord {
    pub tenant_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub graph_uri: String,
    pub graph_user: String,
    pub graph_secret: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl TenantRecord {
    /// Credential triple used for cache-invalidation comparison.
    pub fn credential_tuple(&self) -> (String, String, String) {
        (
            self.graph_uri.clone(),
            self.graph_user.clone(),
            self.graph_secret.clone(),
        )
    }
}

pub(crate) fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// SQLite-backed tenant store. Connections are opened per call; the schema
/// is created on construction.
#[derive(Clone)]
pub struct TenantStore {
    db_path: PathBuf,
}

impl TenantStore {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        let this = Self { db_path };
        this.init()?;
        Ok(this)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        Ok(conn)
    }

    fn init(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = self.open()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tenants (
                tenant_id TEXT PRIMARY KEY,
                name TEXT NULL,
                email TEXT NULL,
                graph_uri TEXT NOT NULL,
                graph_user TEXT NOT NULL,
                graph_secret TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL,
                updated_at_ms INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn get(&self, tenant_id: &str) -> Result<Option<TenantRecord>> {
        let conn = self.open()?;
        let row = conn
            .query_row(
                r#"
                SELECT tenant_id, name, email, graph_uri, graph_user, graph_secret,
                       created_at_ms, updated_at_ms
                FROM tenants WHERE tenant_id = ?1
                "#,
                params![tenant_id],
                |row| {
                    Ok(TenantRecord {
                        tenant_id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        graph_uri: row.get(3)?,
                        graph_user: row.get(4)?,
                        graph_secret: row.get(5)?,
                        created_at_ms: row.get(6)?,
                        updated_at_ms: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Insert-or-update keyed by tenant id. `created_at_ms` is preserved on
    /// update; `updated_at_ms` always takes the supplied value.
    pub fn upsert(&self, record: &TenantRecord) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            r#"
            INSERT INTO tenants (tenant_id, name, email, graph_uri, graph_user, graph_secret,
                                 created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(tenant_id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                graph_uri = excluded.graph_uri,
                graph_user = excluded.graph_user,
                graph_secret = excluded.graph_secret,
                updated_at_ms = excluded.updated_at_ms
            "#,
            params![
                record.tenant_id,
                record.name,
                record.email,
                record.graph_uri,
                record.graph_user,
                record.graph_secret,
                record.created_at_ms,
                record.updated_at_ms,
            ],
        )?;
        Ok(())
    }
}
