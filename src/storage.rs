/// Durable key-value storage for client state
///
/// Backs the session store with a small SQLite table. Values are opaque
/// strings; multi-key writes and deletes run in a single transaction so a
/// crash can never leave half of a related group behind.

use crate::error::{ClientError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Local storage manager for the client database
pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open (or create) the store at the given database path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS client_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ClientError::Storage("Failed to lock database".to_string()))
    }

    /// Read one value
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM client_state WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Write several values atomically
    pub fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut conn = self.lock()?;
        let updated_at = chrono::Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT OR REPLACE INTO client_state (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, &updated_at],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete several values atomically. Missing keys are ignored.
    pub fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute("DELETE FROM client_state WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(())
    }
}
