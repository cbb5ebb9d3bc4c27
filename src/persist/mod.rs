//! Local persistence substrate.
//!
//! This module provides:
//! - `store`: the `KeyValueStore` trait and the in-memory implementation
//! - `json`: lenient field readers for normalizing stored JSON
//! - `debounce`: the autosave quiet-window timer
//! - `wasm`: a store backed by caller-supplied JS functions (browser)

pub mod debounce;
pub(crate) mod json;
pub mod store;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use debounce::{SaveDebouncer, AUTOSAVE_DELAY_MS};
pub use store::{KeyValueStore, MemoryStore};

#[cfg(feature = "wasm")]
pub use wasm::JsStore;
