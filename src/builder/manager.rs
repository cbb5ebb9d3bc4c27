//! BuilderManager: session-scoped state for the main prompt tool.
//!
//! Owns the store handle, the Block Store snapshot, the history ledger,
//! the assembler, and the autosave debouncer. All mutation goes through
//! explicit methods here; there is no module-level state.

use paste::paste;
use serde::Serialize;

use crate::assemble::{Assembler, BatchPrompt, PromptContext};
use crate::builder::model::{BuilderState, Character, PresetItem, TextureLevel};
use crate::error::{StudioError, StudioResult};
use crate::history::{HistoryEntry, PromptHistory};
use crate::persist::json;
use crate::persist::store::{KeyValueStore, MemoryStore};
use crate::persist::SaveDebouncer;

/// Storage key for the current builder envelope.
pub const CURRENT_STATE_KEY: &str = "pawsville_v5";

/// Storage key for the legacy builder envelope (read-only fallback).
pub const LEGACY_STATE_KEY: &str = "pawsville_v4";

// =============================================================================
// FIELD SETTER MACRO
// =============================================================================

/// Generates a setter that finds a character by id and updates one
/// field. Unknown ids are a silent no-op, matching dispatch semantics.
macro_rules! character_setter {
    ($field:ident) => {
        paste! {
            #[doc = concat!("Sets a character's `", stringify!($field), "` field.")]
            pub fn [<set_character_ $field>](&mut self, id: &str, value: &str) {
                if let Some(character) =
                    self.state.characters.iter_mut().find(|c| c.id == id)
                {
                    character.$field = value.to_string();
                }
            }
        }
    };
}

// =============================================================================
// DASHBOARD STATS
// =============================================================================

/// Dashboard summary of the current session.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuilderStats {
    pub total_characters: usize,
    pub active_characters: usize,
    pub texture_label: &'static str,
    pub prompts_generated: usize,
    pub last_generated_ts: Option<i64>,
}

// =============================================================================
// BUILDER MANAGER
// =============================================================================

/// The main prompt-construction tool.
pub struct BuilderManager<S: KeyValueStore> {
    store: S,
    state: BuilderState,
    history: PromptHistory,
    assembler: Assembler,
    autosave: SaveDebouncer,
    migrated_from_legacy: bool,
}

impl<S: KeyValueStore> BuilderManager<S> {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Boots a session from the store. Total: corrupt or missing data
    /// degrades to defaults, never fails. The legacy key is consulted
    /// only when the current key is absent, and is never rewritten here;
    /// persistence under the current key happens on the next save.
    pub fn load(store: S, now_ms: i64) -> Self {
        let (state, migrated_from_legacy) = read_versioned_state(&store);
        let history = PromptHistory::load(&store, now_ms);
        BuilderManager {
            store,
            state,
            history,
            assembler: Assembler::standard(),
            autosave: SaveDebouncer::default(),
            migrated_from_legacy,
        }
    }

    /// Current Block Store snapshot.
    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    /// True when boot fell back to the legacy envelope.
    pub fn migrated_from_legacy(&self) -> bool {
        self.migrated_from_legacy
    }

    /// The ledger of generated prompts.
    pub fn history(&self) -> &PromptHistory {
        &self.history
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The assembler, for registering custom section renderers.
    pub fn assembler_mut(&mut self) -> &mut Assembler {
        &mut self.assembler
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Serializes the snapshot under the current key. Returns false on
    /// any store-write failure; never panics.
    pub fn save_now(&mut self) -> bool {
        serde_json::to_string(&self.state)
            .map(|raw| self.store.set(CURRENT_STATE_KEY, &raw))
            .unwrap_or(false)
    }

    /// Explicit re-read of the current key (the UI's Load button).
    /// Unlike boot, this distinguishes "nothing saved" from "unreadable".
    pub fn reload(&mut self) -> StudioResult<()> {
        let raw = self
            .store
            .get(CURRENT_STATE_KEY)
            .ok_or_else(|| StudioError::missing_key(CURRENT_STATE_KEY))?;
        let value = json::parse(&raw)
            .ok_or_else(|| StudioError::serialization("stored state is not valid JSON"))?;
        self.state = BuilderState::from_value(&value);
        Ok(())
    }

    /// Deletes the current key (best-effort) and returns to defaults.
    /// Any pending autosave is dropped so defaults are not re-persisted
    /// behind the user's back.
    pub fn reset(&mut self) {
        self.store.remove(CURRENT_STATE_KEY);
        self.state = BuilderState::default();
        self.autosave.cancel();
    }

    // =========================================================================
    // AUTOSAVE
    // =========================================================================

    /// Notes a state change at `now_ms`, restarting the autosave window.
    /// The UI calls this after each mutation; `poll_autosave` later
    /// performs the actual write.
    pub fn mark_changed(&mut self, now_ms: i64) {
        self.autosave.mark_changed(now_ms);
    }

    /// True while a debounced save is scheduled.
    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Fires the debounced save if its quiet window has elapsed.
    /// Returns the save outcome when one ran, None otherwise.
    pub fn poll_autosave(&mut self, now_ms: i64) -> Option<bool> {
        if self.autosave.poll(now_ms) {
            Some(self.save_now())
        } else {
            None
        }
    }

    // =========================================================================
    // GLOBAL SETTINGS
    // =========================================================================

    /// Sets the style line.
    pub fn set_style(&mut self, value: &str) {
        self.state.globals.style = value.to_string();
    }

    /// Sets the camera line.
    pub fn set_camera(&mut self, value: &str) {
        self.state.globals.camera = value.to_string();
    }

    /// Sets the lighting line.
    pub fn set_light(&mut self, value: &str) {
        self.state.globals.light = value.to_string();
    }

    /// Sets the negative rules line.
    pub fn set_rules(&mut self, value: &str) {
        self.state.globals.rules = value.to_string();
    }

    /// Sets the texture intensity.
    pub fn set_texture(&mut self, level: TextureLevel) {
        self.state.globals.texture = level;
    }

    /// Sets the global suffix appended to enhancement results.
    pub fn set_suffix(&mut self, value: &str) {
        self.state.suffix = value.to_string();
    }

    // =========================================================================
    // CHARACTERS
    // =========================================================================

    /// Appends a new character (active, panel open) and closes every
    /// other character's panel. Returns the new id.
    pub fn add_character(&mut self) -> String {
        for character in &mut self.state.characters {
            character.is_open = false;
        }
        let character = Character::new("New Character").with_active(true).with_open(true);
        let id = character.id.clone();
        self.state.characters.push(character);
        id
    }

    /// Deletes a character by id. Confirmation is the UI's concern; by
    /// the time this is called the user has already agreed.
    pub fn delete_character(&mut self, id: &str) {
        self.state.characters.retain(|c| c.id != id);
    }

    /// Flips a character's active flag.
    pub fn toggle_character_active(&mut self, id: &str) {
        if let Some(character) = self.state.characters.iter_mut().find(|c| c.id == id) {
            character.active = !character.active;
        }
    }

    /// Flips a character's panel-open flag.
    pub fn toggle_character_open(&mut self, id: &str) {
        if let Some(character) = self.state.characters.iter_mut().find(|c| c.id == id) {
            character.is_open = !character.is_open;
        }
    }

    character_setter!(name);
    character_setter!(text);

    // =========================================================================
    // PRESETS
    // =========================================================================

    /// Adds an active preset. Returns the new id.
    pub fn add_preset(&mut self, text: &str) -> String {
        let preset = PresetItem::new(text);
        let id = preset.id.clone();
        self.state.presets.push(preset);
        id
    }

    /// Flips a preset's active flag.
    pub fn toggle_preset(&mut self, id: &str) {
        if let Some(preset) = self.state.presets.iter_mut().find(|p| p.id == id) {
            preset.active = !preset.active;
        }
    }

    /// Sets a preset's text.
    pub fn set_preset_text(&mut self, id: &str, value: &str) {
        if let Some(preset) = self.state.presets.iter_mut().find(|p| p.id == id) {
            preset.text = value.to_string();
        }
    }

    /// Removes a preset by id.
    pub fn remove_preset(&mut self, id: &str) {
        self.state.presets.retain(|p| p.id != id);
    }

    // =========================================================================
    // SECTION ORDER & PANELS
    // =========================================================================

    /// Swaps the order entry at `index` with its neighbor in
    /// `direction` (-1 up, +1 down). Returns false when either side is
    /// out of range.
    pub fn move_section(&mut self, index: usize, direction: i32) -> bool {
        let len = self.state.prompt_order.len() as i64;
        let target = index as i64 + direction as i64;
        if index as i64 >= len || target < 0 || target >= len {
            return false;
        }
        self.state.prompt_order.swap(index, target as usize);
        true
    }

    /// Flips a UI panel's collapsed flag.
    pub fn toggle_collapsed(&mut self, panel: &str) {
        if let Some(position) = self.state.collapsed.iter().position(|p| p == panel) {
            self.state.collapsed.remove(position);
        } else {
            self.state.collapsed.push(panel.to_string());
        }
    }

    /// True when a panel is collapsed.
    pub fn is_collapsed(&self, panel: &str) -> bool {
        self.state.collapsed.iter().any(|p| p == panel)
    }

    // =========================================================================
    // GENERATION
    // =========================================================================

    /// Assembles one prompt from the current snapshot.
    pub fn generate(&self, scene: &str) -> String {
        self.assembler.assemble(&self.prompt_context(), scene)
    }

    /// Assembles one prompt per non-empty line of `scene_input`.
    pub fn generate_batch(&self, scene_input: &str) -> Vec<BatchPrompt> {
        self.assembler.assemble_batch(&self.prompt_context(), scene_input)
    }

    fn prompt_context(&self) -> PromptContext<'_> {
        PromptContext::new(
            &self.state.globals,
            &self.state.characters,
            &self.state.prompt_order,
        )
        .with_presets(&self.state.presets)
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    /// Records one generated prompt in the ledger.
    pub fn record_single(&mut self, scene: &str, prompt: &str, now_ms: i64) -> usize {
        self.history.add_entries(
            &mut self.store,
            vec![HistoryEntry::single(scene, prompt, now_ms)],
        )
    }

    /// Records a whole batch in the ledger, input order preserved.
    pub fn record_batch(&mut self, results: &[BatchPrompt], now_ms: i64) -> usize {
        let entries = results
            .iter()
            .map(|r| HistoryEntry::batch(r.scene.clone(), r.prompt.clone(), now_ms))
            .collect();
        self.history.add_entries(&mut self.store, entries)
    }

    /// Adds pre-built entries to the ledger.
    pub fn add_history_entries(&mut self, entries: Vec<HistoryEntry>) -> usize {
        self.history.add_entries(&mut self.store, entries)
    }

    /// Removes one ledger entry by id.
    pub fn remove_history_entry(&mut self, id: &str) -> bool {
        self.history.remove_entry(&mut self.store, id)
    }

    /// Empties the ledger and its persisted backing.
    pub fn clear_history(&mut self) {
        self.history.clear(&mut self.store);
    }

    /// Renders the ledger export document.
    pub fn export_history_json(&self, now_ms: i64) -> StudioResult<String> {
        self.history.export_json(now_ms)
    }

    // =========================================================================
    // DASHBOARD
    // =========================================================================

    /// Summary numbers for the dashboard panel.
    pub fn stats(&self) -> BuilderStats {
        let ledger = self.history.stats();
        BuilderStats {
            total_characters: self.state.characters.len(),
            active_characters: self.state.characters.iter().filter(|c| c.active).count(),
            texture_label: self.state.globals.texture.label(),
            prompts_generated: ledger.total,
            last_generated_ts: ledger.last_ts,
        }
    }
}

impl Default for BuilderManager<MemoryStore> {
    fn default() -> Self {
        BuilderManager::load(MemoryStore::new(), 0)
    }
}

/// Reads the current envelope, else the legacy one. Corrupt JSON under
/// the current key yields defaults without consulting the legacy key.
fn read_versioned_state(store: &impl KeyValueStore) -> (BuilderState, bool) {
    if let Some(raw) = store.get(CURRENT_STATE_KEY) {
        let state = json::parse(&raw)
            .map(|value| BuilderState::from_value(&value))
            .unwrap_or_default();
        return (state, false);
    }
    if let Some(raw) = store.get(LEGACY_STATE_KEY) {
        if let Some(value) = json::parse(&raw) {
            return (BuilderState::from_value(&value), true);
        }
    }
    (BuilderState::default(), false)
}
