//! PromptHistory: capped, newest-first ledger of generated prompts.

use serde::Serialize;
use serde_json::Value;

use crate::error::{StudioError, StudioResult};
use crate::history::model::HistoryEntry;
use crate::persist::json;
use crate::persist::store::KeyValueStore;

/// Storage key for the ledger.
pub const HISTORY_KEY: &str = "pawsville_prompt_history_v1";

/// Hard cap on retained entries; oldest evicted first.
pub const MAX_ENTRIES: usize = 200;

/// Export document shape: `{ "exportedAt": ..., "items": [...] }`.
#[derive(Serialize)]
struct HistoryExport<'a> {
    #[serde(rename = "exportedAt")]
    exported_at: i64,
    items: &'a [HistoryEntry],
}

/// Dashboard numbers for the ledger.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    /// Timestamp of the most recent entry, if any.
    pub last_ts: Option<i64>,
}

/// The prompt history ledger.
///
/// Append-only from the producer's perspective: producers add entries,
/// only the user removes or clears. Every mutation re-persists the full
/// list through the store handle passed in; mutations are user-paced, so
/// writes are not debounced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptHistory {
    entries: Vec<HistoryEntry>,
}

impl PromptHistory {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the ledger, normalizing each stored item and dropping blank
    /// ones. A corrupt or non-array backing loads empty; nothing fails.
    pub fn load(store: &dyn KeyValueStore, now_ms: i64) -> Self {
        let entries = store
            .get(HISTORY_KEY)
            .and_then(|raw| json::parse(&raw))
            .as_ref()
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|item| HistoryEntry::from_value(item, now_ms))
                    .filter(|entry| !entry.is_blank())
                    .take(MAX_ENTRIES)
                    .collect()
            })
            .unwrap_or_default();
        PromptHistory { entries }
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepends a batch of entries (input order preserved, batch ahead
    /// of existing history), drops blank items, truncates to the cap,
    /// and persists. Returns how many entries were accepted.
    pub fn add_entries(
        &mut self,
        store: &mut dyn KeyValueStore,
        entries: Vec<HistoryEntry>,
    ) -> usize {
        let mut accepted: Vec<HistoryEntry> =
            entries.into_iter().filter(|e| !e.is_blank()).collect();
        let added = accepted.len();
        if added == 0 {
            return 0;
        }
        accepted.extend(self.entries.drain(..));
        self.entries = accepted;
        self.entries.truncate(MAX_ENTRIES);
        self.persist(store);
        added
    }

    /// Removes at most one entry by id; no-op (returns false) if absent.
    pub fn remove_entry(&mut self, store: &mut dyn KeyValueStore, id: &str) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries.remove(index);
                self.persist(store);
                true
            }
            None => false,
        }
    }

    /// Empties the ledger and removes its persisted backing entirely.
    pub fn clear(&mut self, store: &mut dyn KeyValueStore) {
        self.entries.clear();
        store.remove(HISTORY_KEY);
    }

    /// Renders the export document (pretty-printed, 2-space indent).
    /// No side effects on the ledger.
    pub fn export_json(&self, now_ms: i64) -> StudioResult<String> {
        let export = HistoryExport {
            exported_at: now_ms,
            items: &self.entries,
        };
        serde_json::to_string_pretty(&export)
            .map_err(|e| StudioError::serialization(e.to_string()))
    }

    /// Ledger stats for the dashboard.
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            total: self.entries.len(),
            last_ts: self.entries.first().map(|e| e.ts),
        }
    }

    fn persist(&self, store: &mut dyn KeyValueStore) -> bool {
        serde_json::to_string(&self.entries)
            .map(|raw| store.set(HISTORY_KEY, &raw))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::model::HistoryMode;
    use crate::persist::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_add_entries_prepends_newest_first() {
        let mut store = MemoryStore::new();
        let mut history = PromptHistory::new();

        history.add_entries(&mut store, vec![HistoryEntry::single("old", "P old", 1)]);
        let added = history.add_entries(
            &mut store,
            vec![
                HistoryEntry::batch("new A", "P new A", 2),
                HistoryEntry::batch("new B", "P new B", 2),
            ],
        );

        assert_eq!(added, 2);
        let scenes: Vec<&str> = history.entries().iter().map(|e| e.scene.as_str()).collect();
        assert_eq!(scenes, vec!["new A", "new B", "old"]);
    }

    #[test]
    fn test_blank_entries_cause_no_change() {
        let mut store = MemoryStore::new();
        let mut history = PromptHistory::new();
        history.add_entries(&mut store, vec![HistoryEntry::single("keep", "P", 1)]);
        let before = history.clone();

        let added = history.add_entries(
            &mut store,
            vec![
                HistoryEntry::single("", "", 2),
                HistoryEntry::batch("", "", 2),
            ],
        );

        assert_eq!(added, 0);
        assert_eq!(history, before);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut store = MemoryStore::new();
        let mut history = PromptHistory::new();
        for i in 0..(MAX_ENTRIES + 50) {
            history.add_entries(
                &mut store,
                vec![HistoryEntry::single(format!("scene {}", i), "P", i as i64)],
            );
        }
        assert_eq!(history.len(), MAX_ENTRIES);
        // newest entry first, oldest 50 evicted
        assert_eq!(history.entries()[0].scene, format!("scene {}", MAX_ENTRIES + 49));
        assert_eq!(history.entries()[MAX_ENTRIES - 1].scene, "scene 50");
    }

    #[test]
    fn test_remove_entry_by_id() {
        let mut store = MemoryStore::new();
        let mut history = PromptHistory::new();
        let entry = HistoryEntry::single("scene", "P", 1);
        let id = entry.id.clone();
        history.add_entries(&mut store, vec![entry]);

        assert!(history.remove_entry(&mut store, &id));
        assert!(history.is_empty());
        assert!(!history.remove_entry(&mut store, &id));
    }

    #[test]
    fn test_clear_removes_backing_key() {
        let mut store = MemoryStore::new();
        let mut history = PromptHistory::new();
        history.add_entries(&mut store, vec![HistoryEntry::single("x", "P", 1)]);
        assert!(store.get(HISTORY_KEY).is_some());

        history.clear(&mut store);
        assert!(history.is_empty());
        assert_eq!(store.get(HISTORY_KEY), None);
    }

    #[test]
    fn test_mutations_persist_immediately() {
        let mut store = MemoryStore::new();
        let mut history = PromptHistory::new();
        history.add_entries(&mut store, vec![HistoryEntry::single("x", "P", 5)]);

        let reloaded = PromptHistory::load(&store, 0);
        assert_eq!(reloaded, history);
    }

    #[test]
    fn test_load_normalizes_garbage() {
        let mut store = MemoryStore::new();
        store.set(
            HISTORY_KEY,
            &json!([
                { "id": "h1", "ts": 10, "mode": "single", "scene": "ok", "prompt": "P" },
                { "scene": "", "prompt": "" },
                "not an object",
                { "ts": "bad", "prompt": "kept" }
            ])
            .to_string(),
        );

        let history = PromptHistory::load(&store, 77);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].id, "h1");
        assert_eq!(history.entries()[1].prompt, "kept");
        assert_eq!(history.entries()[1].ts, 77);
        assert_eq!(history.entries()[1].mode, HistoryMode::Batch);
    }

    #[test]
    fn test_load_corrupt_backing_is_empty() {
        let mut store = MemoryStore::new();
        store.set(HISTORY_KEY, "{broken");
        assert!(PromptHistory::load(&store, 0).is_empty());

        store.set(HISTORY_KEY, "\"not an array\"");
        assert!(PromptHistory::load(&store, 0).is_empty());
    }

    #[test]
    fn test_export_json_shape() {
        let mut store = MemoryStore::new();
        let mut history = PromptHistory::new();
        history.add_entries(&mut store, vec![HistoryEntry::single("scene", "P", 9)]);

        let exported = history.export_json(1234).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(doc["exportedAt"], 1234);
        assert_eq!(doc["items"][0]["scene"], "scene");
        assert_eq!(doc["items"][0]["mode"], "single");
        // pretty-printed with 2-space indent
        assert!(exported.contains("\n  \"exportedAt\""));
        // exporting does not touch the ledger
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_stats() {
        let mut store = MemoryStore::new();
        let mut history = PromptHistory::new();
        assert_eq!(history.stats(), HistoryStats { total: 0, last_ts: None });

        history.add_entries(&mut store, vec![HistoryEntry::single("a", "P", 10)]);
        history.add_entries(&mut store, vec![HistoryEntry::single("b", "P", 20)]);
        assert_eq!(
            history.stats(),
            HistoryStats {
                total: 2,
                last_ts: Some(20)
            }
        );
    }
}
