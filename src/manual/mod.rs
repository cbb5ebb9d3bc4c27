//! Manual module: the raw-block editor.
//!
//! This module provides:
//! - `model`: the manual envelope (style, camera, free-form blocks)
//! - `manager`: ManualManager with block CRUD and unlabeled batch assembly
//! - `wasm`: WASM bindings for browser usage (JsManualManager)

pub mod manager;
pub mod model;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use manager::{ManualManager, MANUAL_KEY};
pub use model::ManualState;

#[cfg(feature = "wasm")]
pub use wasm::JsManualManager;
