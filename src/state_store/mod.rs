//! Key-value state persistence, used for the cached upstream tokens.
//!
//! Entries carry an optional expiry; expired values are evicted lazily on
//! read so no background sweep is needed.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const STATE_TABLE: Table = Table {
    name: "state",
    columns: &[
        sqlite_column!("key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("value", &SqlType::Text, non_null = true),
        sqlite_column!("expires_at", &SqlType::Integer),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const STATE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[STATE_TABLE],
    migration: None,
}];

/// Key-value store with optional per-entry TTL.
pub trait StateStore: Send + Sync {
    /// Get an unexpired value. Expired entries are deleted and read as None.
    fn get_state(&self, key: &str) -> Result<Option<String>>;

    /// Set a value, replacing any previous entry. A `ttl` of None means the
    /// entry never expires.
    fn set_state(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    fn delete_state(&self, key: &str) -> Result<()>;
}

pub struct SqliteStateStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStateStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).context("Failed to open state database")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let schema = &STATE_VERSIONED_SCHEMAS[0];
        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);
        if table_count == 0 {
            schema.create(&conn)?;
        } else {
            schema.validate(&conn)?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl StateStore for SqliteStateStore {
    fn get_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT value, expires_at FROM state WHERE key = ?1",
                params![key],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, Option<i64>>(1)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        match row {
            None => Ok(None),
            Some((_, Some(expires_at))) if expires_at <= Utc::now().timestamp() => {
                conn.execute("DELETE FROM state WHERE key = ?1", params![key])?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
        }
    }

    fn set_state(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|ttl| Utc::now().timestamp() + ttl.as_secs() as i64);
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO state (key, value, expires_at, updated_at)
             VALUES (?1, ?2, ?3, cast(strftime('%s','now') as int))
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 expires_at = excluded.expires_at,
                 updated_at = excluded.updated_at",
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    fn delete_state(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM state WHERE key = ?1", params![key])?;
        Ok(())
    }
}
