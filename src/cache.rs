use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// String-keyed memo table that lives as long as its owner. No eviction:
/// match payloads and static data are immutable once fetched.
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: Mutex<HashMap<String, V>>,
}

impl<V: Clone> MemoCache<V> {
    pub fn new() -> Self {
        MemoCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries().insert(key.into(), value);
    }

    /// Returns the cached value or runs `fetch` and stores its success.
    /// The lock is not held while fetching; failures are not cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        fetch: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = fetch()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl<V: Clone> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
