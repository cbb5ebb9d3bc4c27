//! Pawsville - State, persistence, and prompt-assembly core for an image
//! prompt studio.
//!
//! The browser UI renders panels and textareas; everything behind them
//! lives here:
//!
//! - **Block Store**: global settings, reusable characters, presets, and a
//!   user-ordered section list
//! - **Persistence**: versioned key-value envelopes with total normalization
//!   (corrupt data degrades field-by-field, never crashes a load) and a
//!   debounced autosave
//! - **Assembly**: deterministic prompt construction from active blocks,
//!   single or batch, labeled or raw
//! - **History**: a capped newest-first ledger of generated prompts
//! - **Refinery**: actor wardrobes, system-prompt construction, and
//!   sequential AI enhancement through pluggable providers
//!
//! # Example
//!
//! ```rust
//! use pawsville::{BuilderManager, MemoryStore, TextureLevel};
//!
//! // Boot a session (the browser build wires a localStorage-backed store)
//! let mut manager = BuilderManager::load(MemoryStore::new(), 0);
//!
//! manager.set_style("Pixar style");
//! manager.set_texture(TextureLevel::High);
//! manager.set_character_text("c1", "orange tabby");
//!
//! let prompt = manager.generate("cat skateboards at sunset");
//! assert!(prompt.starts_with("STYLE: Pixar style"));
//!
//! // Persist for the next session
//! assert!(manager.save_now());
//! ```

pub mod error;

mod ids;

// Shared substrate
pub mod assemble;
pub mod persist;

// Tool variants
pub mod builder;
pub mod history;
pub mod manual;
pub mod refinery;

// Provider interface (HTTP clients behind the `http` feature)
pub mod provider;

// Re-exports for convenience
pub use assemble::{
    Assembler, BatchPrompt, PromptContext, BATCH_COPY_SEPARATOR, TEXTURE_EXTREME, TEXTURE_HIGH,
};
pub use builder::{
    BuilderManager, BuilderState, BuilderStats, Character, GlobalSettings, OrderEntry, PresetItem,
    SectionKind, TextureLevel,
};
pub use error::{StudioError, StudioResult};
pub use history::{HistoryEntry, HistoryMode, HistoryStats, PromptHistory};
pub use manual::{ManualManager, ManualState};
pub use persist::{KeyValueStore, MemoryStore, SaveDebouncer};
pub use provider::{ApiConfig, ModelProvider, ProviderError, ProviderKind};
pub use refinery::{Actor, Outfit, RefineryManager, RefineryState};

#[cfg(feature = "wasm")]
pub use builder::JsBuilderManager;
#[cfg(feature = "wasm")]
pub use manual::JsManualManager;
#[cfg(feature = "wasm")]
pub use persist::JsStore;
#[cfg(feature = "wasm")]
pub use refinery::JsRefineryManager;

#[cfg(feature = "http")]
pub use provider::{GeminiClient, OpenAiClient};
