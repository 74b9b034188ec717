//! Synchronous SQLite access. Every method here runs on a blocking
//! thread; the async [`Registry`](crate::Registry) wraps calls in
//! `spawn_blocking`.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection as SqliteConnection, OptionalExtension};

use crate::connection::Connection;

pub struct Store {
    conn: Mutex<SqliteConnection>,
}

impl Store {
    pub fn open(db_path: &std::path::Path) -> rusqlite::Result<Self> {
        let conn = SqliteConnection::open(db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS connections (
                id             TEXT PRIMARY KEY,
                name           TEXT NOT NULL,
                driver_type    TEXT NOT NULL,
                credential_key TEXT,
                created_at     TEXT,
                updated_at     TEXT
            )",
            [],
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Rows with a non-null `secret` column, present only in the legacy
    /// schema where the credential was embedded directly in the
    /// metadata file. Returns `(id, secret)` pairs so the caller can
    /// move them into the vault before the column is dropped.
    pub fn legacy_secrets_needing_migration(&self) -> rusqlite::Result<Vec<(String, String)>> {
        let conn = self.conn.lock().expect("registry connection mutex poisoned");
        let has_secret_column = conn
            .prepare("SELECT secret FROM connections LIMIT 0")
            .is_ok();
        if !has_secret_column {
            return Ok(Vec::new());
        }
        let mut stmt = conn.prepare(
            "SELECT id, secret FROM connections WHERE secret IS NOT NULL AND secret != ''",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn drop_legacy_secret_column(&self) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("registry connection mutex poisoned");
        conn.execute("ALTER TABLE connections DROP COLUMN secret", [])?;
        Ok(())
    }

    pub fn list(&self) -> rusqlite::Result<Vec<Connection>> {
        let conn = self.conn.lock().expect("registry connection mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, driver_type, credential_key, created_at, updated_at
             FROM connections ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_connection)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get(&self, id: &str) -> rusqlite::Result<Option<Connection>> {
        let conn = self.conn.lock().expect("registry connection mutex poisoned");
        conn.query_row(
            "SELECT id, name, driver_type, credential_key, created_at, updated_at
             FROM connections WHERE id = ?1",
            [id],
            Self::row_to_connection,
        )
        .optional()
    }

    pub fn insert(&self, connection: &Connection) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("registry connection mutex poisoned");
        conn.execute(
            "INSERT INTO connections (id, name, driver_type, credential_key, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                connection.id,
                connection.name,
                connection.driver_type,
                connection.credential_key,
                connection.created_at.to_rfc3339(),
                connection.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Returns the number of rows removed, so the caller can detect a
    /// not-found delete.
    pub fn delete(&self, id: &str) -> rusqlite::Result<usize> {
        let conn = self.conn.lock().expect("registry connection mutex poisoned");
        conn.execute("DELETE FROM connections WHERE id = ?1", [id])
    }

    fn row_to_connection(row: &rusqlite::Row<'_>) -> rusqlite::Result<Connection> {
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;
        Ok(Connection {
            id: row.get(0)?,
            name: row.get(1)?,
            driver_type: row.get(2)?,
            credential_key: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
