//! WASM bindings for the manual block editor.

use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

use crate::assemble::join_batch;
use crate::error::StudioError;
use crate::manual::manager::ManualManager;
use crate::persist::JsStore;

/// Serialize a value to JsValue with HashMaps as plain JS objects (not Map).
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&Serializer::new().serialize_maps_as_objects(true))
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

/// Helper macro for Result conversion
macro_rules! js_result {
    ($expr:expr) => {
        $expr.map_err(|e: StudioError| JsValue::from_str(&e.to_string()))
    };
}

// =============================================================================
// MAIN WRAPPER TYPE
// =============================================================================

/// JavaScript-friendly wrapper around ManualManager.
#[wasm_bindgen]
pub struct JsManualManager {
    inner: ManualManager<JsStore>,
}

#[wasm_bindgen]
impl JsManualManager {
    /// Boots a session from the given store, falling back to defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(store: JsStore) -> JsManualManager {
        JsManualManager {
            inner: ManualManager::load(store),
        }
    }

    /// Gets the full editor state as a JavaScript object.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(self.inner.state())?)
    }

    /// Sets the style line.
    #[wasm_bindgen(js_name = setStyle)]
    pub fn set_style(&mut self, value: &str) {
        self.inner.set_style(value);
    }

    /// Sets the camera line.
    #[wasm_bindgen(js_name = setCamera)]
    pub fn set_camera(&mut self, value: &str) {
        self.inner.set_camera(value);
    }

    /// Appends a new active block. Returns the new id.
    #[wasm_bindgen(js_name = addBlock)]
    pub fn add_block(&mut self) -> String {
        self.inner.add_block()
    }

    /// Deletes a block by ID.
    #[wasm_bindgen(js_name = deleteBlock)]
    pub fn delete_block(&mut self, id: &str) {
        self.inner.delete_block(id);
    }

    /// Flips a block's active flag.
    #[wasm_bindgen(js_name = toggleBlockActive)]
    pub fn toggle_block_active(&mut self, id: &str) {
        self.inner.toggle_block_active(id);
    }

    /// Sets the block name.
    #[wasm_bindgen(js_name = setBlockName)]
    pub fn set_block_name(&mut self, id: &str, name: &str) {
        self.inner.set_block_name(id, name);
    }

    /// Sets the block text.
    #[wasm_bindgen(js_name = setBlockText)]
    pub fn set_block_text(&mut self, id: &str, text: &str) {
        self.inner.set_block_text(id, text);
    }

    /// Assembles one unlabeled prompt per non-empty line. Returns an
    /// array of `{ scene, prompt }` objects.
    #[wasm_bindgen(js_name = buildBatch)]
    pub fn build_batch(&self, scene_input: &str) -> Result<JsValue, JsValue> {
        Ok(to_js_value(&self.inner.build_batch(scene_input))?)
    }

    /// Assembles a batch and joins the prompts with the copy-all
    /// separator, ready for the clipboard.
    #[wasm_bindgen(js_name = batchCopyText)]
    pub fn batch_copy_text(&self, scene_input: &str) -> String {
        join_batch(&self.inner.build_batch(scene_input))
    }

    /// Saves the current state. Returns false on write failure.
    #[wasm_bindgen(js_name = saveNow)]
    pub fn save_now(&mut self) -> bool {
        self.inner.save_now()
    }

    /// Re-reads the saved state, replacing in-memory edits. Throws when
    /// nothing is saved or the stored JSON is unreadable.
    #[wasm_bindgen]
    pub fn reload(&mut self) -> Result<(), JsValue> {
        js_result!(self.inner.reload())
    }

    /// Deletes the saved state and returns to defaults.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}
