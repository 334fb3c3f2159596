//! Key/value queries backing the snapshot store.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension};

use crate::{
    error::{DatabaseResultExt, Result},
    store::KeyValueStore,
};

const SELECT_VALUE_SQL: &str = "SELECT value FROM cycle_state WHERE key = ?1";
const UPSERT_VALUE_SQL: &str = "INSERT INTO cycle_state (key, value, updated_at) VALUES (?1, ?2, ?3) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";
const DELETE_VALUE_SQL: &str = "DELETE FROM cycle_state WHERE key = ?1";
const SELECT_KEYS_SQL: &str = "SELECT key FROM cycle_state ORDER BY key";

impl super::Database {
    /// Lists every stored key, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_KEYS_SQL)
            .db_context("Failed to prepare key listing")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .db_context("Failed to list keys")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read key")?;
        Ok(keys)
    }
}

impl KeyValueStore for super::Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.connection
            .query_row(SELECT_VALUE_SQL, params![key], |row| row.get(0))
            .optional()
            .db_context("Failed to read value")
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let now = Timestamp::now().to_string();
        self.connection
            .execute(UPSERT_VALUE_SQL, params![key, value, now])
            .db_context("Failed to write value")?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.connection
            .execute(DELETE_VALUE_SQL, params![key])
            .db_context("Failed to delete value")?;
        Ok(())
    }
}
