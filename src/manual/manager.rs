//! ManualManager: session-scoped state for the manual block editor.
//!
//! The simplest of the three variants: raw blocks, unlabeled assembly,
//! explicit save and load under its own key.

use paste::paste;

use crate::assemble::{Assembler, BatchPrompt, PromptContext};
use crate::builder::model::{BuilderState, Character, GlobalSettings};
use crate::error::{StudioError, StudioResult};
use crate::manual::model::ManualState;
use crate::persist::json;
use crate::persist::store::{KeyValueStore, MemoryStore};

/// Storage key for the manual editor envelope.
pub const MANUAL_KEY: &str = "pawsville_manual_v1";

// =============================================================================
// FIELD SETTER MACRO
// =============================================================================

/// Generates a setter that finds a block by id and updates one field.
/// Unknown ids are a silent no-op.
macro_rules! block_setter {
    ($field:ident) => {
        paste! {
            #[doc = concat!("Sets a block's `", stringify!($field), "` field.")]
            pub fn [<set_block_ $field>](&mut self, id: &str, value: &str) {
                if let Some(block) = self.state.blocks.iter_mut().find(|b| b.id == id) {
                    block.$field = value.to_string();
                }
            }
        }
    };
}

// =============================================================================
// MANUAL MANAGER
// =============================================================================

/// The manual block editor.
pub struct ManualManager<S: KeyValueStore> {
    store: S,
    state: ManualState,
    assembler: Assembler,
}

impl<S: KeyValueStore> ManualManager<S> {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Boots a session from the store. Total: corrupt or missing data
    /// degrades to defaults, never fails.
    pub fn load(store: S) -> Self {
        let state = store
            .get(MANUAL_KEY)
            .and_then(|raw| json::parse(&raw))
            .map(|value| ManualState::from_value(&value))
            .unwrap_or_default();
        ManualManager {
            store,
            state,
            assembler: Assembler::manual(),
        }
    }

    /// Current editor snapshot.
    pub fn state(&self) -> &ManualState {
        &self.state
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Serializes the snapshot under the manual key. Returns false on
    /// any store-write failure; never panics.
    pub fn save_now(&mut self) -> bool {
        serde_json::to_string(&self.state)
            .map(|raw| self.store.set(MANUAL_KEY, &raw))
            .unwrap_or(false)
    }

    /// Explicit re-read of the manual key, distinguishing "nothing
    /// saved" from "unreadable".
    pub fn reload(&mut self) -> StudioResult<()> {
        let raw = self
            .store
            .get(MANUAL_KEY)
            .ok_or_else(|| StudioError::missing_key(MANUAL_KEY))?;
        let value = json::parse(&raw)
            .ok_or_else(|| StudioError::serialization("stored state is not valid JSON"))?;
        self.state = ManualState::from_value(&value);
        Ok(())
    }

    /// Deletes the manual key (best-effort) and returns to defaults.
    pub fn reset(&mut self) {
        self.store.remove(MANUAL_KEY);
        self.state = ManualState::default();
    }

    // =========================================================================
    // FIELDS & BLOCKS
    // =========================================================================

    /// Sets the style line.
    pub fn set_style(&mut self, value: &str) {
        self.state.style = value.to_string();
    }

    /// Sets the camera line.
    pub fn set_camera(&mut self, value: &str) {
        self.state.camera = value.to_string();
    }

    /// Appends a new active block. Returns the new id.
    pub fn add_block(&mut self) -> String {
        let block = Character::new("New Block").with_active(true).with_open(true);
        let id = block.id.clone();
        self.state.blocks.push(block);
        id
    }

    /// Deletes a block by id.
    pub fn delete_block(&mut self, id: &str) {
        self.state.blocks.retain(|b| b.id != id);
    }

    /// Flips a block's active flag.
    pub fn toggle_block_active(&mut self, id: &str) {
        if let Some(block) = self.state.blocks.iter_mut().find(|b| b.id == id) {
            block.active = !block.active;
        }
    }

    block_setter!(name);
    block_setter!(text);

    // =========================================================================
    // ASSEMBLY
    // =========================================================================

    /// Assembles one unlabeled prompt per non-empty line of
    /// `scene_input`: style, camera, active block texts, `SCENE:` line.
    pub fn build_batch(&self, scene_input: &str) -> Vec<BatchPrompt> {
        let globals = GlobalSettings::new()
            .with_style(self.state.style.as_str())
            .with_camera(self.state.camera.as_str());
        let order = BuilderState::default_order();
        let context = PromptContext::new(&globals, &self.state.blocks, &order);
        self.assembler.assemble_batch(&context, scene_input)
    }
}

impl Default for ManualManager<MemoryStore> {
    fn default() -> Self {
        ManualManager::load(MemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_fresh_store_gives_defaults() {
        let manager = ManualManager::load(MemoryStore::new());
        assert_eq!(manager.state(), &ManualState::default());
    }

    #[test]
    fn test_save_now_roundtrip() {
        let mut manager = ManualManager::load(MemoryStore::new());
        manager.set_style("Anime");
        manager.set_camera("low angle");
        manager.add_block();
        assert!(manager.save_now());

        let reloaded = ManualManager::load(manager.store().clone());
        assert_eq!(reloaded.state(), manager.state());
    }

    #[test]
    fn test_reload_distinguishes_empty_from_corrupt() {
        let mut manager = ManualManager::load(MemoryStore::new());
        assert!(matches!(manager.reload(), Err(StudioError::MissingKey(_))));

        manager.save_now();
        manager.set_style("unsaved edit");
        assert!(manager.reload().is_ok());
        assert_eq!(manager.state().style, "");

        let mut store = MemoryStore::new();
        store.set(MANUAL_KEY, "][");
        let mut corrupt = ManualManager::load(store);
        assert!(matches!(corrupt.reload(), Err(StudioError::Serialization(_))));
    }

    #[test]
    fn test_reset_removes_key_and_restores_defaults() {
        let mut manager = ManualManager::load(MemoryStore::new());
        manager.set_camera("wide");
        manager.save_now();

        manager.reset();
        assert_eq!(manager.state(), &ManualState::default());
        assert_eq!(manager.store().get(MANUAL_KEY), None);
    }

    #[test]
    fn test_block_mutations() {
        let mut manager = ManualManager::load(MemoryStore::new());
        let id = manager.add_block();
        assert_eq!(manager.state().blocks.len(), 2);
        assert_eq!(manager.state().blocks[1].name, "New Block");
        assert!(manager.state().blocks[1].active);

        manager.set_block_name(&id, "Backdrop");
        manager.set_block_text(&id, "a brick wall");
        manager.toggle_block_active(&id);
        let block = &manager.state().blocks[1];
        assert_eq!(block.name, "Backdrop");
        assert_eq!(block.text, "a brick wall");
        assert!(!block.active);

        // unknown ids are silent no-ops
        manager.set_block_text("nope", "x");
        manager.delete_block("nope");
        assert_eq!(manager.state().blocks.len(), 2);

        manager.delete_block(&id);
        assert_eq!(manager.state().blocks.len(), 1);
    }

    #[test]
    fn test_build_batch_is_unlabeled() {
        let mut manager = ManualManager::load(MemoryStore::new());
        manager.set_style("Anime");
        manager.set_camera("low angle");

        let results = manager.build_batch("kickflip\n\n rail grind \n");
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].prompt,
            "Anime\n\nlow angle\n\nOrange tabby cat on a skateboard\n\nSCENE: kickflip"
        );
        assert_eq!(results[1].scene, "rail grind");
    }

    #[test]
    fn test_build_batch_skips_inactive_blocks() {
        let mut manager = ManualManager::load(MemoryStore::new());
        manager.toggle_block_active("fc1");
        let results = manager.build_batch("kickflip");
        assert_eq!(results[0].prompt, "SCENE: kickflip");
    }
}
