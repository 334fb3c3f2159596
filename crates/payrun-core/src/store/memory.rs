//! In-memory key/value store.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use super::KeyValueStore;
use crate::error::{CycleError, Result};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    fail_writes: bool,
}

/// Map-backed store. Clones share the same map, so a test can keep a handle
/// and inspect what the engine persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set`/`remove` fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Seeds a raw value, bypassing `fail_writes`.
    pub fn insert(&self, key: &str, value: &str) {
        self.lock().values.insert(key.to_string(), value.to_string());
    }

    /// Raw value currently stored under `key`.
    pub fn value(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(inner: &Inner) -> Result<()> {
        if inner.fail_writes {
            return Err(CycleError::Configuration {
                message: "memory store rejected the write".to_string(),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        Self::write_guard(&inner)?;
        inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut inner = self.lock();
        Self::write_guard(&inner)?;
        inner.values.remove(key);
        Ok(())
    }
}
