//! WASM bindings for the builder tool.
//!
//! This module provides JavaScript-friendly wrappers around the
//! BuilderManager for use in browser environments. Timestamps come from
//! `js_sys::Date::now()`; the native core never reads a clock itself.

use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;

use crate::builder::manager::BuilderManager;
use crate::builder::model::TextureLevel;
use crate::error::StudioError;
use crate::history::HistoryEntry;
use crate::persist::JsStore;

/// Serialize a value to JsValue with HashMaps as plain JS objects (not Map).
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&Serializer::new().serialize_maps_as_objects(true))
}

/// Current wall-clock time in epoch milliseconds.
fn now_ms() -> i64 {
    js_sys::Date::now() as i64
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

/// JavaScript-friendly wrapper around BuilderManager.
///
/// Every mutation restarts the autosave quiet window; the page drives
/// the actual write by calling `pollAutosave` on a timer.
#[wasm_bindgen]
pub struct JsBuilderManager {
    inner: BuilderManager<JsStore>,
}

#[wasm_bindgen]
impl JsBuilderManager {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Boots a session from the given store, falling back to the legacy
    /// envelope and then to defaults.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const store = new JsStore(
    ///   (k) => localStorage.getItem(k),
    ///   (k, v) => localStorage.setItem(k, v),
    ///   (k) => localStorage.removeItem(k),
    /// );
    /// const manager = new JsBuilderManager(store);
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(store: JsStore) -> JsBuilderManager {
        JsBuilderManager {
            inner: BuilderManager::load(store, now_ms()),
        }
    }

    /// True when boot fell back to the legacy envelope.
    #[wasm_bindgen(js_name = migratedFromLegacy)]
    pub fn migrated_from_legacy(&self) -> bool {
        self.inner.migrated_from_legacy()
    }

    // =========================================================================
    // STATE ACCESS
    // =========================================================================

    /// Gets the full builder state as a JavaScript object.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const state = manager.getState();
    /// console.log(state.chars);
    /// console.log(state.texture);
    /// ```
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(self.inner.state())?)
    }

    /// Dashboard summary numbers.
    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(&self.inner.stats())?)
    }

    // =========================================================================
    // GLOBAL SETTINGS
    // =========================================================================

    /// Sets the style line.
    #[wasm_bindgen(js_name = setStyle)]
    pub fn set_style(&mut self, value: &str) {
        self.inner.set_style(value);
        self.touch();
    }

    /// Sets the camera line.
    #[wasm_bindgen(js_name = setCamera)]
    pub fn set_camera(&mut self, value: &str) {
        self.inner.set_camera(value);
        self.touch();
    }

    /// Sets the lighting line.
    #[wasm_bindgen(js_name = setLight)]
    pub fn set_light(&mut self, value: &str) {
        self.inner.set_light(value);
        self.touch();
    }

    /// Sets the negative rules line.
    #[wasm_bindgen(js_name = setRules)]
    pub fn set_rules(&mut self, value: &str) {
        self.inner.set_rules(value);
        self.touch();
    }

    /// Sets the texture intensity ("standard", "high" or "extreme";
    /// anything else reads as standard).
    #[wasm_bindgen(js_name = setTexture)]
    pub fn set_texture(&mut self, level: &str) {
        self.inner.set_texture(TextureLevel::from_key(level));
        self.touch();
    }

    /// Sets the global suffix appended to enhancement results.
    #[wasm_bindgen(js_name = setSuffix)]
    pub fn set_suffix(&mut self, value: &str) {
        self.inner.set_suffix(value);
        self.touch();
    }

    // =========================================================================
    // CHARACTER OPERATIONS
    // =========================================================================

    /// Appends a new character and opens its panel. Returns the new id.
    #[wasm_bindgen(js_name = addCharacter)]
    pub fn add_character(&mut self) -> String {
        let id = self.inner.add_character();
        self.touch();
        id
    }

    /// Deletes a character by ID.
    #[wasm_bindgen(js_name = deleteCharacter)]
    pub fn delete_character(&mut self, id: &str) {
        self.inner.delete_character(id);
        self.touch();
    }

    /// Flips a character's active flag.
    #[wasm_bindgen(js_name = toggleCharacterActive)]
    pub fn toggle_character_active(&mut self, id: &str) {
        self.inner.toggle_character_active(id);
        self.touch();
    }

    /// Flips a character's panel-open flag.
    #[wasm_bindgen(js_name = toggleCharacterOpen)]
    pub fn toggle_character_open(&mut self, id: &str) {
        self.inner.toggle_character_open(id);
        self.touch();
    }

    /// Sets the character name.
    #[wasm_bindgen(js_name = setCharacterName)]
    pub fn set_character_name(&mut self, id: &str, name: &str) {
        self.inner.set_character_name(id, name);
        self.touch();
    }

    /// Sets the character description text.
    #[wasm_bindgen(js_name = setCharacterText)]
    pub fn set_character_text(&mut self, id: &str, text: &str) {
        self.inner.set_character_text(id, text);
        self.touch();
    }

    // =========================================================================
    // PRESET OPERATIONS
    // =========================================================================

    /// Adds an active preset. Returns the new id.
    #[wasm_bindgen(js_name = addPreset)]
    pub fn add_preset(&mut self, text: &str) -> String {
        let id = self.inner.add_preset(text);
        self.touch();
        id
    }

    /// Flips a preset's active flag.
    #[wasm_bindgen(js_name = togglePreset)]
    pub fn toggle_preset(&mut self, id: &str) {
        self.inner.toggle_preset(id);
        self.touch();
    }

    /// Sets a preset's text.
    #[wasm_bindgen(js_name = setPresetText)]
    pub fn set_preset_text(&mut self, id: &str, value: &str) {
        self.inner.set_preset_text(id, value);
        self.touch();
    }

    /// Removes a preset by ID.
    #[wasm_bindgen(js_name = removePreset)]
    pub fn remove_preset(&mut self, id: &str) {
        self.inner.remove_preset(id);
        self.touch();
    }

    // =========================================================================
    // SECTION ORDER & PANELS
    // =========================================================================

    /// Moves the order entry at `index` one step (-1 up, +1 down).
    /// Returns false when the move is out of range.
    #[wasm_bindgen(js_name = moveSection)]
    pub fn move_section(&mut self, index: usize, direction: i32) -> bool {
        let moved = self.inner.move_section(index, direction);
        if moved {
            self.touch();
        }
        moved
    }

    /// Flips a UI panel's collapsed flag.
    #[wasm_bindgen(js_name = toggleCollapsed)]
    pub fn toggle_collapsed(&mut self, panel: &str) {
        self.inner.toggle_collapsed(panel);
        self.touch();
    }

    /// True when a panel is collapsed.
    #[wasm_bindgen(js_name = isCollapsed)]
    pub fn is_collapsed(&self, panel: &str) -> bool {
        self.inner.is_collapsed(panel)
    }

    // =========================================================================
    // GENERATION
    // =========================================================================

    /// Assembles one prompt from the current state.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const prompt = manager.generate('cat skateboards at sunset');
    /// ```
    #[wasm_bindgen]
    pub fn generate(&self, scene: &str) -> String {
        self.inner.generate(scene)
    }

    /// Assembles one prompt per non-empty line. Returns an array of
    /// `{ scene, prompt }` objects.
    #[wasm_bindgen(js_name = generateBatch)]
    pub fn generate_batch(&self, scene_input: &str) -> Result<JsValue, JsValue> {
        Ok(to_js_value(&self.inner.generate_batch(scene_input))?)
    }

    /// Assembles a batch and joins the prompts with the copy-all
    /// separator, ready for the clipboard.
    #[wasm_bindgen(js_name = batchCopyText)]
    pub fn batch_copy_text(&self, scene_input: &str) -> String {
        crate::assemble::join_batch(&self.inner.generate_batch(scene_input))
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    /// The history ledger, newest first.
    #[wasm_bindgen(js_name = getHistory)]
    pub fn get_history(&self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(&self.inner.history().entries())?)
    }

    /// Records one generated prompt. Returns the number accepted (0 when
    /// both scene and prompt are blank).
    #[wasm_bindgen(js_name = recordSingle)]
    pub fn record_single(&mut self, scene: &str, prompt: &str) -> usize {
        self.inner.record_single(scene, prompt, now_ms())
    }

    /// Adds an array of entry objects to the ledger. Malformed elements
    /// are normalized the same way stored history is.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const results = manager.generateBatch(input);
    /// manager.addHistoryEntries(results.map((r) => ({ mode: 'batch', ...r })));
    /// ```
    #[wasm_bindgen(js_name = addHistoryEntries)]
    pub fn add_history_entries(&mut self, entries: JsValue) -> Result<usize, JsValue> {
        let value: serde_json::Value = from_value(entries)?;
        let now = now_ms();
        let entries: Vec<HistoryEntry> = value
            .as_array()
            .map(|items| items.iter().map(|v| HistoryEntry::from_value(v, now)).collect())
            .unwrap_or_default();
        Ok(self.inner.add_history_entries(entries))
    }

    /// Removes one ledger entry by ID. Returns whether it was found.
    #[wasm_bindgen(js_name = removeHistoryEntry)]
    pub fn remove_history_entry(&mut self, id: &str) -> bool {
        self.inner.remove_history_entry(id)
    }

    /// Empties the ledger and its persisted backing.
    #[wasm_bindgen(js_name = clearHistory)]
    pub fn clear_history(&mut self) {
        self.inner.clear_history();
    }

    /// Renders the ledger export document (pretty-printed JSON).
    #[wasm_bindgen(js_name = exportHistoryJson)]
    pub fn export_history_json(&self) -> Result<String, JsValue> {
        js_result!(self.inner.export_history_json(now_ms()))
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Saves the current state immediately. Returns false on write
    /// failure (e.g. storage quota).
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

    /// True while a debounced save is scheduled.
    #[wasm_bindgen(js_name = autosavePending)]
    pub fn autosave_pending(&self) -> bool {
        self.inner.autosave_pending()
    }

    /// Fires the debounced save if its quiet window has elapsed.
    /// Returns the save outcome when one ran, undefined otherwise.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// setInterval(() => manager.pollAutosave(), 50);
    /// ```
    #[wasm_bindgen(js_name = pollAutosave)]
    pub fn poll_autosave(&mut self) -> Option<bool> {
        self.inner.poll_autosave(now_ms())
    }
}

impl JsBuilderManager {
    /// Restarts the autosave quiet window at the current time.
    fn touch(&mut self) {
        self.inner.mark_changed(now_ms());
    }
}
