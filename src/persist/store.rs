//! Key-value persistence substrate.

use std::collections::HashMap;

/// Minimal key-value store the studio persists through.
///
/// In the browser this is `localStorage` (via `JsStore`); natively it is
/// `MemoryStore` or any other string-keyed backing. Implementations must
/// not panic: a failed write reports `false`, a failed removal is silent.
pub trait KeyValueStore {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`. Returns false on write failure
    /// (e.g. quota exceeded).
    fn set(&mut self, key: &str, value: &str) -> bool;

    /// Removes `key` if present. Best-effort.
    fn remove(&mut self, key: &str);
}

/// In-memory store for native use and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.entries.insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("k"), None);

        assert!(store.set("k", "v"));
        assert_eq!(store.get("k"), Some("v".to_string()));
        assert_eq!(store.len(), 1);

        assert!(store.set("k", "v2"));
        assert_eq!(store.get("k"), Some("v2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_remove_is_best_effort() {
        let mut store = MemoryStore::new();
        store.remove("absent");
        assert!(store.set("k", "v"));
        store.remove("k");
        assert_eq!(store.get("k"), None);
    }
}
