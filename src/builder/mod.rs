//! Builder module: the main prompt-construction tool.
//!
//! This module provides:
//! - `model`: Block Store data (GlobalSettings, Character, PresetItem, order)
//!   with total normalization of stored envelopes
//! - `manager`: BuilderManager owning store, state, history, and autosave
//! - `wasm`: WASM bindings for browser usage (JsBuilderManager)

pub mod manager;
pub mod model;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use manager::{BuilderManager, BuilderStats, CURRENT_STATE_KEY, LEGACY_STATE_KEY};
pub use model::*;

#[cfg(feature = "wasm")]
pub use wasm::JsBuilderManager;
