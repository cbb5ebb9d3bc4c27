//! Refinery module: the AI enhancement tool.
//!
//! This module provides:
//! - `model`: Actor/Outfit data and the refinery envelope with total
//!   normalization
//! - `manager`: RefineryManager owning store and state, system-prompt
//!   construction, and sequential batch enhancement
//! - `wasm`: WASM bindings for browser usage (JsRefineryManager)

pub mod manager;
pub mod model;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use manager::{RefineryManager, REFINERY_KEY, VISION_SYSTEM_PROMPT};
pub use model::*;

#[cfg(feature = "wasm")]
pub use wasm::JsRefineryManager;
