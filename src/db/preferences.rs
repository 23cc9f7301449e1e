//! `SQLite`-backed preference store

use crate::db::{DbConn, DbPool};
use crate::store::PreferenceStore;
use crate::{Error, Result};

/// Preference store persisted in the local database
pub struct SqliteStore {
    db: DbPool,
}

impl SqliteStore {
    /// Create a store backed by the given pool
    #[must_use]
    pub const fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Remove a stored value
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn remove(&self, key: &str) -> Result<()> {
        let removed = self.conn()?.execute(
            "DELETE FROM preferences WHERE key = ?1",
            rusqlite::params![key],
        )?;
        tracing::debug!(key, removed, "preference removed");
        Ok(())
    }

    fn conn(&self) -> Result<DbConn> {
        self.db.get().map_err(|e| Error::Database(e.to_string()))
    }
}

impl PreferenceStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT value FROM preferences WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO preferences (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value],
        )?;
        tracing::debug!(key, value, "preference stored");
        Ok(())
    }
}
