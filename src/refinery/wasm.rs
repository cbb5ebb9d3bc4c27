//! WASM bindings for the refinery tool.
//!
//! The browser page keeps ownership of the actual HTTP calls (it has
//! `fetch` and the user's key already in hand); this layer supplies
//! everything around them: state, the system prompt, and suffix
//! handling. Native consumers drive `RefineryManager::enhance_batch`
//! directly instead.

use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

use crate::builder::model::TextureLevel;
use crate::error::StudioError;
use crate::persist::JsStore;
use crate::provider::ProviderKind;
use crate::refinery::manager::{RefineryManager, VISION_SYSTEM_PROMPT};

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

/// JavaScript-friendly wrapper around RefineryManager.
#[wasm_bindgen]
pub struct JsRefineryManager {
    inner: RefineryManager<JsStore>,
}

#[wasm_bindgen]
impl JsRefineryManager {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Boots a session from the given store, falling back to defaults.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const store = new JsStore(
    ///   (k) => localStorage.getItem(k),
    ///   (k, v) => localStorage.setItem(k, v),
    ///   (k) => localStorage.removeItem(k),
    /// );
    /// const refinery = new JsRefineryManager(store);
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(store: JsStore) -> JsRefineryManager {
        JsRefineryManager {
            inner: RefineryManager::load(store),
        }
    }

    /// Gets the full refinery state as a JavaScript object.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(self.inner.state())?)
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    /// Sets the style line of the system prompt.
    #[wasm_bindgen(js_name = setStyle)]
    pub fn set_style(&mut self, value: &str) {
        self.inner.set_style(value);
    }

    /// Sets the negative line of the system prompt.
    #[wasm_bindgen(js_name = setNegative)]
    pub fn set_negative(&mut self, value: &str) {
        self.inner.set_negative(value);
    }

    /// Sets the texture intensity ("standard", "high" or "extreme").
    #[wasm_bindgen(js_name = setTexture)]
    pub fn set_texture(&mut self, level: &str) {
        self.inner.set_texture(TextureLevel::from_key(level));
    }

    /// Sets the suffix appended to successful enhancements.
    #[wasm_bindgen(js_name = setSuffix)]
    pub fn set_suffix(&mut self, value: &str) {
        self.inner.set_suffix(value);
    }

    /// Selects the hosted provider ("gemini" or "openai").
    #[wasm_bindgen(js_name = setApiProvider)]
    pub fn set_api_provider(&mut self, provider: &str) {
        self.inner.set_api_provider(ProviderKind::from_key(provider));
    }

    /// Sets the provider API key.
    #[wasm_bindgen(js_name = setApiKey)]
    pub fn set_api_key(&mut self, key: &str) {
        self.inner.set_api_key(key);
    }

    // =========================================================================
    // ACTOR OPERATIONS
    // =========================================================================

    /// Appends a new actor. Returns the new id.
    #[wasm_bindgen(js_name = addActor)]
    pub fn add_actor(&mut self) -> String {
        self.inner.add_actor()
    }

    /// Deletes an actor by ID.
    #[wasm_bindgen(js_name = deleteActor)]
    pub fn delete_actor(&mut self, id: &str) {
        self.inner.delete_actor(id);
    }

    /// Flips an actor's panel-open flag.
    #[wasm_bindgen(js_name = toggleActorOpen)]
    pub fn toggle_actor_open(&mut self, id: &str) {
        self.inner.toggle_actor_open(id);
    }

    /// Sets the actor name.
    #[wasm_bindgen(js_name = setActorName)]
    pub fn set_actor_name(&mut self, id: &str, name: &str) {
        self.inner.set_actor_name(id, name);
    }

    /// Sets the actor tag.
    #[wasm_bindgen(js_name = setActorTag)]
    pub fn set_actor_tag(&mut self, id: &str, tag: &str) {
        self.inner.set_actor_tag(id, tag);
    }

    /// Sets the actor description.
    #[wasm_bindgen(js_name = setActorDesc)]
    pub fn set_actor_desc(&mut self, id: &str, desc: &str) {
        self.inner.set_actor_desc(id, desc);
    }

    // =========================================================================
    // OUTFIT OPERATIONS
    // =========================================================================

    /// Appends an outfit to an actor's wardrobe and selects it.
    #[wasm_bindgen(js_name = addOutfit)]
    pub fn add_outfit(&mut self, actor_id: &str, name: &str, desc: &str) -> Result<(), JsValue> {
        js_result!(self.inner.add_outfit(actor_id, name, desc))
    }

    /// Removes the selected outfit; throws when it is the last one.
    #[wasm_bindgen(js_name = removeActiveOutfit)]
    pub fn remove_active_outfit(&mut self, actor_id: &str) -> Result<(), JsValue> {
        js_result!(self.inner.remove_active_outfit(actor_id))
    }

    /// Selects an outfit by index, bounds-checked.
    #[wasm_bindgen(js_name = selectOutfit)]
    pub fn select_outfit(&mut self, actor_id: &str, index: usize) -> Result<(), JsValue> {
        js_result!(self.inner.select_outfit(actor_id, index))
    }

    /// Edits the selected outfit's description.
    #[wasm_bindgen(js_name = setActiveOutfitDesc)]
    pub fn set_active_outfit_desc(&mut self, actor_id: &str, desc: &str) {
        self.inner.set_active_outfit_desc(actor_id, desc);
    }

    // =========================================================================
    // ENHANCEMENT SUPPORT
    // =========================================================================

    /// Builds the system prompt for the page's enhancement calls.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const system = refinery.systemPrompt();
    /// const reply = await callTextAI(apiConfig, system, sceneLine);
    /// display(refinery.applySuffix(reply));
    /// ```
    #[wasm_bindgen(js_name = systemPrompt)]
    pub fn system_prompt(&self) -> String {
        self.inner.system_prompt()
    }

    /// Appends the configured suffix to an enhancement result.
    #[wasm_bindgen(js_name = applySuffix)]
    pub fn apply_suffix(&self, text: &str) -> String {
        self.inner.apply_suffix(text)
    }

    /// The fixed system prompt for image description.
    #[wasm_bindgen(js_name = visionSystemPrompt)]
    pub fn vision_system_prompt() -> String {
        VISION_SYSTEM_PROMPT.to_string()
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

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
