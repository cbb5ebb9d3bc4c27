//! JSON-file-backed key-value store for the CLI.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use pawsville::persist::KeyValueStore;

/// Key-value store over one JSON file holding an object of storage keys
/// to stored string values, the shape a browser storage dump produces.
///
/// Writes rewrite the whole file, matching the synchronous semantics of
/// the browser store. A failed write reports `false` like any other
/// `KeyValueStore` backend.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens `path`. A missing file reads as an empty store; a file that
    /// is not a JSON object is rejected.
    ///
    /// Some dump tools store the parsed value under each key instead of
    /// the raw string; non-string values are re-serialized so the state
    /// managers can read either shape.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read state file: {}", path.display()))?;
            serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw)
                .with_context(|| format!("State file is not a JSON object: {}", path.display()))?
                .into_iter()
                .map(|(key, value)| {
                    let text = match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (key, text)
                })
                .collect()
        } else {
            BTreeMap::new()
        };
        Ok(FileStore {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Stored size of `key` in bytes, if present.
    pub fn raw_len(&self, key: &str) -> Option<usize> {
        self.entries.get(key).map(String::len)
    }

    fn flush(&self) -> bool {
        match serde_json::to_string_pretty(&self.entries) {
            Ok(raw) => std::fs::write(&self.path, raw).is_ok(),
            Err(_) => false,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.flush();
    }
}
