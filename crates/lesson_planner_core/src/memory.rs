//! crates/lesson_planner_core/src/memory.rs
//!
//! An in-process `KeyValueStore`. Mirrors browser local storage closely enough
//! for tests, including an optional byte quota.

use crate::ports::{KeyValueStore, PortError, PortResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any write that would push the total stored size past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            quota_bytes: Some(bytes),
        }
    }

    fn lock(&self) -> PortResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.slots
            .lock()
            .map_err(|_| PortError::Unexpected("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut slots = self.lock()?;
        if let Some(quota) = self.quota_bytes {
            let others: usize = slots
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(PortError::QuotaExceeded(format!(
                    "{needed} bytes requested, {quota} allowed"
                )));
            }
        }
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
