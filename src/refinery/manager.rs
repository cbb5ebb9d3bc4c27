//! RefineryManager: session-scoped state for the AI enhancement tool.
//!
//! Unlike the builder there is no autosave: the refinery saves and
//! loads on explicit button presses, and there is no legacy key to
//! migrate from. The manager also owns the prompt-engineering side of
//! enhancement: building the system prompt, pacing the batch one call
//! at a time, and applying the suffix to successful results.

use paste::paste;

use crate::assemble::scene_lines;
use crate::builder::model::TextureLevel;
use crate::error::{StudioError, StudioResult};
use crate::persist::json;
use crate::persist::store::{KeyValueStore, MemoryStore};
use crate::provider::{ModelProvider, ProviderError, ProviderKind};
use crate::refinery::model::{Actor, Outfit, RefineryState};

/// Storage key for the refinery envelope.
pub const REFINERY_KEY: &str = "pawsville_refinery_v12";

/// Fixed system prompt for image description.
pub const VISION_SYSTEM_PROMPT: &str = "Analyze image. Write a detailed text-to-image prompt. \
     Focus on Art Style, Lighting, Camera, Key Elements. Output ONLY prompt string.";

// =============================================================================
// FIELD SETTER MACRO
// =============================================================================

/// Generates a setter that finds an actor by id and updates one field.
/// Unknown ids are a silent no-op.
macro_rules! actor_setter {
    ($field:ident) => {
        paste! {
            #[doc = concat!("Sets an actor's `", stringify!($field), "` field.")]
            pub fn [<set_actor_ $field>](&mut self, id: &str, value: &str) {
                if let Some(actor) = self.state.actors.iter_mut().find(|a| a.id == id) {
                    actor.$field = value.to_string();
                }
            }
        }
    };
}

// =============================================================================
// REFINERY MANAGER
// =============================================================================

/// The AI enhancement tool.
pub struct RefineryManager<S: KeyValueStore> {
    store: S,
    state: RefineryState,
}

impl<S: KeyValueStore> RefineryManager<S> {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Boots a session from the store. Total: corrupt or missing data
    /// degrades to defaults, never fails.
    pub fn load(store: S) -> Self {
        let state = store
            .get(REFINERY_KEY)
            .and_then(|raw| json::parse(&raw))
            .map(|value| RefineryState::from_value(&value))
            .unwrap_or_default();
        RefineryManager { store, state }
    }

    /// Current refinery snapshot.
    pub fn state(&self) -> &RefineryState {
        &self.state
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Serializes the snapshot under the refinery key. Returns false on
    /// any store-write failure; never panics.
    pub fn save_now(&mut self) -> bool {
        serde_json::to_string(&self.state)
            .map(|raw| self.store.set(REFINERY_KEY, &raw))
            .unwrap_or(false)
    }

    /// Explicit re-read of the refinery key, distinguishing "nothing
    /// saved" from "unreadable".
    pub fn reload(&mut self) -> StudioResult<()> {
        let raw = self
            .store
            .get(REFINERY_KEY)
            .ok_or_else(|| StudioError::missing_key(REFINERY_KEY))?;
        let value = json::parse(&raw)
            .ok_or_else(|| StudioError::serialization("stored state is not valid JSON"))?;
        self.state = RefineryState::from_value(&value);
        Ok(())
    }

    /// Deletes the refinery key (best-effort) and returns to defaults.
    pub fn reset(&mut self) {
        self.store.remove(REFINERY_KEY);
        self.state = RefineryState::default();
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    /// Sets the style line of the system prompt.
    pub fn set_style(&mut self, value: &str) {
        self.state.style = value.to_string();
    }

    /// Sets the negative line of the system prompt.
    pub fn set_negative(&mut self, value: &str) {
        self.state.negative = value.to_string();
    }

    /// Sets the texture intensity.
    pub fn set_texture(&mut self, level: TextureLevel) {
        self.state.texture = level;
    }

    /// Sets the suffix appended to successful enhancements.
    pub fn set_suffix(&mut self, value: &str) {
        self.state.suffix = value.to_string();
    }

    /// Selects the hosted provider.
    pub fn set_api_provider(&mut self, provider: ProviderKind) {
        self.state.api.provider = provider;
    }

    /// Sets the provider API key.
    pub fn set_api_key(&mut self, key: &str) {
        self.state.api.key = key.to_string();
    }

    // =========================================================================
    // ACTORS
    // =========================================================================

    /// Appends a new actor with a placeholder wardrobe. Returns the new
    /// id. Actors are independent; adding one leaves the others as-is.
    pub fn add_actor(&mut self) -> String {
        let actor = Actor::new("New", "@new");
        let id = actor.id.clone();
        self.state.actors.push(actor);
        id
    }

    /// Deletes an actor by id.
    pub fn delete_actor(&mut self, id: &str) {
        self.state.actors.retain(|a| a.id != id);
    }

    /// Flips an actor's panel-open flag.
    pub fn toggle_actor_open(&mut self, id: &str) {
        if let Some(actor) = self.state.actors.iter_mut().find(|a| a.id == id) {
            actor.open = !actor.open;
        }
    }

    actor_setter!(name);
    actor_setter!(tag);
    actor_setter!(desc);

    // =========================================================================
    // OUTFITS
    // =========================================================================

    /// Appends an outfit to an actor's wardrobe and selects it.
    pub fn add_outfit(&mut self, actor_id: &str, name: &str, desc: &str) -> StudioResult<()> {
        let actor = self.actor_mut(actor_id)?;
        actor.outfits.push(Outfit::new(name, desc));
        actor.active_outfit = actor.outfits.len() - 1;
        Ok(())
    }

    /// Removes the selected outfit and falls back to the first one.
    /// Refuses to remove the last outfit so the wardrobe stays non-empty.
    pub fn remove_active_outfit(&mut self, actor_id: &str) -> StudioResult<()> {
        let actor = self.actor_mut(actor_id)?;
        if actor.outfits.len() == 1 {
            return Err(StudioError::last_outfit(actor_id));
        }
        let index = actor.active_outfit;
        actor.outfits.remove(index);
        actor.active_outfit = 0;
        Ok(())
    }

    /// Selects an outfit by index, bounds-checked.
    pub fn select_outfit(&mut self, actor_id: &str, index: usize) -> StudioResult<()> {
        let actor = self.actor_mut(actor_id)?;
        if index >= actor.outfits.len() {
            return Err(StudioError::index_out_of_bounds(index, actor.outfits.len()));
        }
        actor.active_outfit = index;
        Ok(())
    }

    /// Edits the selected outfit's description. Unknown ids are a
    /// silent no-op, like the other text setters.
    pub fn set_active_outfit_desc(&mut self, actor_id: &str, desc: &str) {
        if let Some(actor) = self.state.actors.iter_mut().find(|a| a.id == actor_id) {
            let index = actor.active_outfit;
            if let Some(outfit) = actor.outfits.get_mut(index) {
                outfit.desc = desc.to_string();
            }
        }
    }

    fn actor_mut(&mut self, id: &str) -> StudioResult<&mut Actor> {
        self.state
            .actors
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StudioError::actor_not_found(id))
    }

    // =========================================================================
    // ENHANCEMENT
    // =========================================================================

    /// Builds the system prompt sent with every enhancement call: the
    /// engineer role, current style and negative lines, one block per
    /// actor, and the texture instruction.
    pub fn system_prompt(&self) -> String {
        let blocks: Vec<String> = self
            .state
            .actors
            .iter()
            .map(|actor| {
                let outfit = actor.current_outfit().map(|o| o.desc.as_str()).unwrap_or("");
                format!("TRIGGER: {}\nDESC: {}\nOUTFIT: {}", actor.tag, actor.desc, outfit)
            })
            .collect();
        let texture_instruction = match self.state.texture {
            TextureLevel::Extreme => "MICRO-TEXTURE: Describe weave, pores, scratches.",
            TextureLevel::High => "High detail.",
            TextureLevel::Standard => "Standard.",
        };
        format!(
            "Role: Expert Image Prompt Engineer.\nStyle: {}\nNegative: {}\nActors:\n{}\n\
             Instructions:\n1. Replace tags (@cat) with DESC + OUTFIT. NO NAMES.\n2. {}\n\
             3. Focus on Composition/Light.\n4. Output ONLY prompt.",
            self.state.style,
            self.state.negative,
            blocks.join("\n\n"),
            texture_instruction,
        )
    }

    /// Appends the configured suffix to an enhancement result with a
    /// single space. The result is trimmed; a blank suffix is skipped.
    pub fn apply_suffix(&self, text: &str) -> String {
        let trimmed = text.trim();
        let suffix = self.state.suffix.trim();
        if suffix.is_empty() {
            trimmed.to_string()
        } else {
            format!("{} {}", trimmed, suffix)
        }
    }

    /// Enhances each non-empty line of `scene_input` through the
    /// provider, one outstanding call at a time. A failed line becomes
    /// the inline marker `Error: <message>`; the batch never aborts.
    pub async fn enhance_batch(
        &self,
        provider: &dyn ModelProvider,
        scene_input: &str,
    ) -> Vec<String> {
        let system = self.system_prompt();
        let mut results = Vec::new();
        for line in scene_lines(scene_input) {
            match provider.enhance_text(&system, line).await {
                Ok(text) => results.push(self.apply_suffix(&text)),
                Err(e) => results.push(format!("Error: {}", e.message())),
            }
        }
        results
    }

    /// Describes an image with the fixed vision prompt. The result goes
    /// to the scene input, so no suffix is applied.
    pub async fn describe_image(
        &self,
        provider: &dyn ModelProvider,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, ProviderError> {
        provider.describe_image(VISION_SYSTEM_PROMPT, image, mime_type).await
    }
}

impl Default for RefineryManager<MemoryStore> {
    fn default() -> Self {
        RefineryManager::load(MemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays a scripted reply per call and records what
    /// it was asked.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
            ScriptedProvider {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn enhance_text(
            &self,
            system_prompt: &str,
            user_text: &str,
        ) -> Result<String, ProviderError> {
            self.seen
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_text.to_string()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::malformed("script exhausted")))
        }

        async fn describe_image(
            &self,
            system_prompt: &str,
            image: &[u8],
            mime_type: &str,
        ) -> Result<String, ProviderError> {
            Ok(format!("{}|{}|{}", system_prompt, image.len(), mime_type))
        }
    }

    #[test]
    fn test_load_fresh_store_gives_defaults() {
        let manager = RefineryManager::load(MemoryStore::new());
        assert_eq!(manager.state(), &RefineryState::default());
    }

    #[test]
    fn test_load_corrupt_store_gives_defaults() {
        let mut store = MemoryStore::new();
        store.set(REFINERY_KEY, "{broken");
        let manager = RefineryManager::load(store);
        assert_eq!(manager.state(), &RefineryState::default());
    }

    #[test]
    fn test_save_now_roundtrip() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        manager.set_style("cinematic");
        manager.set_texture(TextureLevel::High);
        manager.set_api_provider(ProviderKind::OpenAi);
        manager.set_api_key("sk-test");
        assert!(manager.save_now());

        let reloaded = RefineryManager::load(manager.store().clone());
        assert_eq!(reloaded.state(), manager.state());
    }

    #[test]
    fn test_reload_distinguishes_empty_from_corrupt() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        assert!(matches!(manager.reload(), Err(StudioError::MissingKey(_))));

        manager.save_now();
        manager.set_style("unsaved edit");
        assert!(manager.reload().is_ok());
        assert_eq!(manager.state().style, "");

        let mut store = MemoryStore::new();
        store.set(REFINERY_KEY, "not json");
        let mut corrupt = RefineryManager::load(store);
        assert!(matches!(corrupt.reload(), Err(StudioError::Serialization(_))));
    }

    #[test]
    fn test_reset_removes_key_and_restores_defaults() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        manager.set_negative("--no text");
        manager.save_now();

        manager.reset();
        assert_eq!(manager.state(), &RefineryState::default());
        assert_eq!(manager.store().get(REFINERY_KEY), None);
    }

    #[test]
    fn test_add_actor_defaults() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        let id = manager.add_actor();
        assert_eq!(manager.state().actors.len(), 2);
        let actor = manager.state().actors.last().unwrap();
        assert_eq!(actor.id, id);
        assert_eq!(actor.name, "New");
        assert_eq!(actor.tag, "@new");
        assert_eq!(actor.outfits, vec![Outfit::fallback()]);
        assert!(actor.open);
        // the existing actor's panel is untouched
        assert!(manager.state().actors[0].open);
    }

    #[test]
    fn test_actor_mutations() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        manager.set_actor_name("rc1", "Captain");
        manager.set_actor_tag("rc1", "@cap");
        manager.set_actor_desc("rc1", "grizzled tabby");
        manager.toggle_actor_open("rc1");

        let actor = &manager.state().actors[0];
        assert_eq!(actor.name, "Captain");
        assert_eq!(actor.tag, "@cap");
        assert_eq!(actor.desc, "grizzled tabby");
        assert!(!actor.open);

        // unknown ids are silent no-ops
        manager.set_actor_name("nope", "x");
        manager.delete_actor("nope");
        assert_eq!(manager.state().actors.len(), 1);

        manager.delete_actor("rc1");
        assert!(manager.state().actors.is_empty());
    }

    #[test]
    fn test_add_outfit_appends_and_selects() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        manager.add_outfit("rc1", "Raincoat", "yellow raincoat").unwrap();

        let actor = &manager.state().actors[0];
        assert_eq!(actor.outfits.len(), 2);
        assert_eq!(actor.active_outfit, 1);
        assert_eq!(actor.current_outfit().unwrap().name, "Raincoat");

        assert!(matches!(
            manager.add_outfit("nope", "X", ""),
            Err(StudioError::ActorNotFound(_))
        ));
    }

    #[test]
    fn test_remove_active_outfit_resets_selection() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        manager.add_outfit("rc1", "Raincoat", "yellow raincoat").unwrap();
        manager.add_outfit("rc1", "Armor", "plate armor").unwrap();
        manager.select_outfit("rc1", 1).unwrap();

        manager.remove_active_outfit("rc1").unwrap();
        let actor = &manager.state().actors[0];
        assert_eq!(actor.outfits.len(), 2);
        assert_eq!(actor.active_outfit, 0);
        assert_eq!(actor.current_outfit().unwrap().name, "Hoodie");
    }

    #[test]
    fn test_last_outfit_cannot_be_removed() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        assert!(matches!(
            manager.remove_active_outfit("rc1"),
            Err(StudioError::LastOutfit(_))
        ));
        assert_eq!(manager.state().actors[0].outfits.len(), 1);
    }

    #[test]
    fn test_select_outfit_bounds_checked() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        assert!(matches!(
            manager.select_outfit("rc1", 1),
            Err(StudioError::IndexOutOfBounds { index: 1, length: 1 })
        ));
        manager.add_outfit("rc1", "Raincoat", "").unwrap();
        assert!(manager.select_outfit("rc1", 0).is_ok());
    }

    #[test]
    fn test_set_active_outfit_desc_edits_selection() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        manager.set_active_outfit_desc("rc1", "red hoodie");
        assert_eq!(manager.state().actors[0].outfits[0].desc, "red hoodie");
        manager.set_active_outfit_desc("nope", "ignored");
    }

    #[test]
    fn test_system_prompt_construction() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        manager.set_style("Anime");
        manager.set_negative("--no blur");
        manager.set_texture(TextureLevel::Extreme);
        let id = manager.add_actor();
        manager.set_actor_tag(&id, "@rex");
        manager.set_actor_desc(&id, "german shepherd");
        manager.set_active_outfit_desc(&id, "grey suit");

        assert_eq!(
            manager.system_prompt(),
            "Role: Expert Image Prompt Engineer.\n\
             Style: Anime\n\
             Negative: --no blur\n\
             Actors:\n\
             TRIGGER: @cat\nDESC: orange tabby cat, anthropomorphic\nOUTFIT: blue hoodie\n\n\
             TRIGGER: @rex\nDESC: german shepherd\nOUTFIT: grey suit\n\
             Instructions:\n\
             1. Replace tags (@cat) with DESC + OUTFIT. NO NAMES.\n\
             2. MICRO-TEXTURE: Describe weave, pores, scratches.\n\
             3. Focus on Composition/Light.\n\
             4. Output ONLY prompt."
        );
    }

    #[test]
    fn test_texture_instruction_per_level() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        assert!(manager.system_prompt().contains("2. Standard."));
        manager.set_texture(TextureLevel::High);
        assert!(manager.system_prompt().contains("2. High detail."));
        manager.set_texture(TextureLevel::Extreme);
        assert!(manager
            .system_prompt()
            .contains("2. MICRO-TEXTURE: Describe weave, pores, scratches."));
    }

    #[test]
    fn test_apply_suffix() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        assert_eq!(manager.apply_suffix("  a cat  "), "a cat");

        manager.set_suffix("  8k, sharp  ");
        assert_eq!(manager.apply_suffix("a cat\n"), "a cat 8k, sharp");

        manager.set_suffix("   ");
        assert_eq!(manager.apply_suffix("a cat"), "a cat");
    }

    #[tokio::test]
    async fn test_enhance_batch_sequential_with_inline_errors() {
        let mut manager = RefineryManager::load(MemoryStore::new());
        manager.set_suffix("8k");
        let provider = ScriptedProvider::new(vec![
            Ok("a cinematic cat\n".to_string()),
            Err(ProviderError::Api {
                status: 429,
                message: "rate limited".to_string(),
            }),
            Ok("a cinematic duck".to_string()),
        ]);

        let results = manager
            .enhance_batch(&provider, "cat scene\n\n  duck alley  \nduck pond")
            .await;
        assert_eq!(
            results,
            vec![
                "a cinematic cat 8k".to_string(),
                "Error: rate limited".to_string(),
                "a cinematic duck 8k".to_string(),
            ]
        );

        let seen = provider.seen.lock().unwrap();
        let lines: Vec<&str> = seen.iter().map(|(_, user)| user.as_str()).collect();
        assert_eq!(lines, vec!["cat scene", "duck alley", "duck pond"]);
        assert!(seen[0].0.starts_with("Role: Expert Image Prompt Engineer."));
    }

    #[tokio::test]
    async fn test_enhance_batch_empty_input_makes_no_calls() {
        let manager = RefineryManager::load(MemoryStore::new());
        let provider = ScriptedProvider::new(vec![]);
        let results = manager.enhance_batch(&provider, "   \n\n  ").await;
        assert!(results.is_empty());
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_describe_image_uses_vision_prompt() {
        let manager = RefineryManager::load(MemoryStore::new());
        let provider = ScriptedProvider::new(vec![]);
        let described = manager
            .describe_image(&provider, &[1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(described, format!("{}|3|image/png", VISION_SYSTEM_PROMPT));
    }
}
