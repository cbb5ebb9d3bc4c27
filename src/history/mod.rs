//! History module: the capped ledger of previously generated prompts.
//!
//! This module provides:
//! - `model`: HistoryEntry with total normalization of stored items
//! - `manager`: PromptHistory with capped newest-first storage and export

pub mod manager;
pub mod model;

pub use manager::{HistoryStats, PromptHistory, HISTORY_KEY, MAX_ENTRIES};
pub use model::{HistoryEntry, HistoryMode};
