//! Data model for the prompt history ledger.

use serde::Serialize;
use serde_json::Value;

use crate::ids;
use crate::persist::json;

/// How a ledger entry was produced.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    Single,
    /// Anything stored that is not exactly `"single"` reads as batch.
    #[default]
    Batch,
}

impl HistoryMode {
    pub fn from_key(key: &str) -> Self {
        if key == "single" {
            HistoryMode::Single
        } else {
            HistoryMode::Batch
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            HistoryMode::Single => "single",
            HistoryMode::Batch => "batch",
        }
    }
}

/// One generated prompt, as recorded in the ledger.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    /// Creation time, epoch milliseconds.
    pub ts: i64,
    pub mode: HistoryMode,
    /// Source scene text the prompt was generated from.
    pub scene: String,
    /// The generated prompt.
    pub prompt: String,
}

impl HistoryEntry {
    /// Creates a single-generation entry with a fresh id.
    pub fn single(scene: impl Into<String>, prompt: impl Into<String>, now_ms: i64) -> Self {
        HistoryEntry {
            id: ids::fresh("h"),
            ts: now_ms,
            mode: HistoryMode::Single,
            scene: scene.into(),
            prompt: prompt.into(),
        }
    }

    /// Creates a batch-generation entry with a fresh id.
    pub fn batch(scene: impl Into<String>, prompt: impl Into<String>, now_ms: i64) -> Self {
        HistoryEntry {
            mode: HistoryMode::Batch,
            ..HistoryEntry::single(scene, prompt, now_ms)
        }
    }

    /// Normalizes one stored item. Total: a missing or null id gets a
    /// fresh one, a non-finite or missing timestamp becomes `now_ms`,
    /// and non-object input yields a blank entry (later filtered).
    pub fn from_value(value: &Value, now_ms: i64) -> Self {
        let id = match json::pick(value, &[&["id"]]) {
            Some(v) => json::string_or(Some(v), ""),
            None => ids::fresh("h"),
        };
        HistoryEntry {
            id,
            ts: json::int_or(value.get("ts"), now_ms),
            mode: HistoryMode::from_key(&json::string_or(value.get("mode"), "")),
            scene: json::string_or(json::pick(value, &[&["scene"]]), ""),
            prompt: json::string_or(json::pick(value, &[&["prompt"]]), ""),
        }
    }

    /// Entries with neither scene nor prompt carry no information and
    /// are dropped by the ledger.
    pub fn is_blank(&self) -> bool {
        self.scene.is_empty() && self.prompt.is_empty()
    }
}
