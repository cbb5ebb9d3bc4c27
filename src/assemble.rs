//! Prompt assembly: the pure function joining active blocks into one
//! output string.
//!
//! The tool historically grew several near-duplicate assembly routines
//! (labeled builder output, unlabeled manual output). They are
//! consolidated here into one `Assembler` driven by an ordered table of
//! section renderers: each entry of the user's block order resolves to
//! its renderer, empty sections drop out, and the survivors join with a
//! blank line between them.

use serde::Serialize;

use crate::builder::model::{
    Character, GlobalSettings, OrderEntry, PresetItem, SectionKind, TextureLevel,
};

/// TEXTURE template at `High`.
pub const TEXTURE_HIGH: &str =
    "High detail. Defined materials, visible surface grain, crisp fur and fabric.";

/// TEXTURE template at `Extreme`.
pub const TEXTURE_EXTREME: &str = "EXTREME micro-texture. Macro-level surface detail: \
individual fibers, skin pores, fabric weave, fine dust and scratches on every material.";

/// Separator used when copying a whole batch as one document.
pub const BATCH_COPY_SEPARATOR: &str = "\n\n---\n\n";

/// Returns the fixed template for a texture level, if the level emits one.
pub fn texture_template(level: TextureLevel) -> Option<&'static str> {
    match level {
        TextureLevel::Standard => None,
        TextureLevel::High => Some(TEXTURE_HIGH),
        TextureLevel::Extreme => Some(TEXTURE_EXTREME),
    }
}

/// Splits a multi-line scene input into trimmed, non-empty lines.
pub fn scene_lines(input: &str) -> Vec<&str> {
    input.lines().map(str::trim).filter(|line| !line.is_empty()).collect()
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Borrowed view of the Block Store that assembly reads from.
///
/// The scene text is not part of the context; it is passed per call so
/// batch generation can reuse one context across lines.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub globals: &'a GlobalSettings,
    pub characters: &'a [Character],
    pub presets: &'a [PresetItem],
    pub order: &'a [OrderEntry],
}

impl<'a> PromptContext<'a> {
    /// Creates a context with no presets.
    pub fn new(
        globals: &'a GlobalSettings,
        characters: &'a [Character],
        order: &'a [OrderEntry],
    ) -> Self {
        PromptContext {
            globals,
            characters,
            presets: &[],
            order,
        }
    }

    /// Builder: Set the preset list.
    pub fn with_presets(mut self, presets: &'a [PresetItem]) -> Self {
        self.presets = presets;
        self
    }
}

/// One result of a batch generation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchPrompt {
    pub scene: String,
    pub prompt: String,
}

/// Joins batch results with the copy separator.
pub fn join_batch(prompts: &[BatchPrompt]) -> String {
    prompts
        .iter()
        .map(|p| p.prompt.as_str())
        .collect::<Vec<_>>()
        .join(BATCH_COPY_SEPARATOR)
}

// =============================================================================
// ASSEMBLER
// =============================================================================

/// Renders one section kind from the context plus the scene text.
pub type SectionRenderer = fn(&PromptContext<'_>, &str) -> String;

/// Ordered-section-renderer table. Deterministic and side-effect-free:
/// the same context and scene always produce the same output.
#[derive(Debug, Clone)]
pub struct Assembler {
    table: Vec<(SectionKind, SectionRenderer)>,
}

impl Assembler {
    /// Creates an assembler with no registered renderers.
    pub fn new() -> Self {
        Assembler { table: Vec::new() }
    }

    /// The labeled configuration used by the builder tool.
    pub fn standard() -> Self {
        let mut assembler = Assembler::new();
        assembler.register(SectionKind::Global, render_global_labeled);
        assembler.register(SectionKind::Characters, render_characters_labeled);
        assembler.register(SectionKind::Scene, render_scene);
        assembler
    }

    /// The unlabeled configuration used by the manual block editor:
    /// style and camera render raw, blocks render their bare text, only
    /// the scene keeps its label.
    pub fn manual() -> Self {
        let mut assembler = Assembler::new();
        assembler.register(SectionKind::Global, render_global_raw);
        assembler.register(SectionKind::Characters, render_blocks_raw);
        assembler.register(SectionKind::Scene, render_scene);
        assembler
    }

    /// Registers a renderer for a kind, replacing any existing one.
    pub fn register(&mut self, kind: SectionKind, renderer: SectionRenderer) {
        if let Some(slot) = self.table.iter_mut().find(|(k, _)| *k == kind) {
            slot.1 = renderer;
        } else {
            self.table.push((kind, renderer));
        }
    }

    fn renderer_for(&self, kind: SectionKind) -> Option<SectionRenderer> {
        self.table
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, renderer)| *renderer)
    }

    /// Assembles one prompt. Sections follow the context's order;
    /// entries with no renderer and sections that render empty are
    /// skipped. All-blank input yields an empty string.
    pub fn assemble(&self, ctx: &PromptContext<'_>, scene: &str) -> String {
        let mut sections: Vec<String> = Vec::new();
        for entry in ctx.order {
            if let Some(renderer) = self.renderer_for(entry.kind) {
                let text = renderer(ctx, scene);
                if !text.is_empty() {
                    sections.push(text);
                }
            }
        }
        sections.join("\n\n")
    }

    /// Assembles once per non-empty line of `scene_input`, preserving
    /// input order.
    pub fn assemble_batch(&self, ctx: &PromptContext<'_>, scene_input: &str) -> Vec<BatchPrompt> {
        scene_lines(scene_input)
            .into_iter()
            .map(|line| BatchPrompt {
                scene: line.to_string(),
                prompt: self.assemble(ctx, line),
            })
            .collect()
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Assembler::standard()
    }
}

// =============================================================================
// SECTION RENDERERS
// =============================================================================

fn push_labeled(pieces: &mut Vec<String>, label: &str, value: &str) {
    let trimmed = value.trim();
    if !trimmed.is_empty() {
        pieces.push(format!("{}: {}", label, trimmed));
    }
}

/// STYLE, CAMERA, LIGHTING, active presets, TEXTURE, NEGATIVE, in that
/// fixed sub-order regardless of which fields are populated.
fn render_global_labeled(ctx: &PromptContext<'_>, _scene: &str) -> String {
    let globals = ctx.globals;
    let mut pieces: Vec<String> = Vec::new();
    push_labeled(&mut pieces, "STYLE", &globals.style);
    push_labeled(&mut pieces, "CAMERA", &globals.camera);
    push_labeled(&mut pieces, "LIGHTING", &globals.light);
    for preset in ctx.presets.iter().filter(|p| p.active) {
        let text = preset.text.trim();
        if !text.is_empty() {
            pieces.push(text.to_string());
        }
    }
    if let Some(template) = texture_template(globals.texture) {
        pieces.push(format!("TEXTURE: {}", template));
    }
    push_labeled(&mut pieces, "NEGATIVE", &globals.rules);
    pieces.join("\n\n")
}

/// One `CHARACTER (NAME): text` line per active character with
/// non-blank text; names upper-cased.
fn render_characters_labeled(ctx: &PromptContext<'_>, _scene: &str) -> String {
    ctx.characters
        .iter()
        .filter(|c| c.active)
        .filter_map(|c| {
            let text = c.text.trim();
            if text.is_empty() {
                None
            } else {
                Some(format!("CHARACTER ({}): {}", c.name.to_uppercase(), text))
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_scene(_ctx: &PromptContext<'_>, scene: &str) -> String {
    let trimmed = scene.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("SCENE: {}", trimmed)
    }
}

/// Unlabeled globals: trimmed style then camera, nothing else.
fn render_global_raw(ctx: &PromptContext<'_>, _scene: &str) -> String {
    [ctx.globals.style.trim(), ctx.globals.camera.trim()]
        .iter()
        .filter(|piece| !piece.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Unlabeled blocks: bare trimmed text of each active block.
fn render_blocks_raw(ctx: &PromptContext<'_>, _scene: &str) -> String {
    ctx.characters
        .iter()
        .filter(|c| c.active)
        .filter_map(|c| {
            let text = c.text.trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::model::BuilderState;

    fn scenario_state() -> BuilderState {
        let mut state = BuilderState::default();
        state.globals.style = "Pixar style".to_string();
        state.globals.rules = "--no text".to_string();
        state.globals.texture = TextureLevel::Extreme;
        state.characters = vec![Character::new("Cat")
            .with_text("orange tabby")
            .with_active(true)];
        state
    }

    fn ctx_of(state: &BuilderState) -> PromptContext<'_> {
        PromptContext::new(&state.globals, &state.characters, &state.prompt_order)
            .with_presets(&state.presets)
    }

    #[test]
    fn test_assemble_exact_output() {
        let state = scenario_state();
        let output = Assembler::standard().assemble(&ctx_of(&state), "cat skateboards");
        let expected = format!(
            "STYLE: Pixar style\n\nTEXTURE: {}\n\nNEGATIVE: --no text\n\n\
             CHARACTER (CAT): orange tabby\n\nSCENE: cat skateboards",
            TEXTURE_EXTREME
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_assemble_follows_block_order() {
        let mut state = scenario_state();
        state.globals.texture = TextureLevel::Standard;
        state.prompt_order = vec![
            OrderEntry::new(SectionKind::Scene),
            OrderEntry::new(SectionKind::Characters),
            OrderEntry::new(SectionKind::Global),
        ];
        let output = Assembler::standard().assemble(&ctx_of(&state), "a scene");
        assert_eq!(
            output,
            "SCENE: a scene\n\nCHARACTER (CAT): orange tabby\n\n\
             STYLE: Pixar style\n\nNEGATIVE: --no text"
        );
    }

    #[test]
    fn test_assemble_all_blank_is_empty() {
        let mut state = BuilderState::default();
        state.characters.clear();
        let output = Assembler::standard().assemble(&ctx_of(&state), "   ");
        assert_eq!(output, "");
    }

    #[test]
    fn test_inactive_or_blank_characters_never_render() {
        let mut state = BuilderState::default();
        state.characters = vec![
            Character::new("Ghost").with_text("translucent").with_active(false),
            Character::new("Blank").with_text("   ").with_active(true),
            Character::new("Real").with_text("visible").with_active(true),
        ];
        let output = Assembler::standard().assemble(&ctx_of(&state), "");
        assert_eq!(output, "CHARACTER (REAL): visible");
    }

    #[test]
    fn test_texture_levels_are_distinct_and_exclusive() {
        let mut state = BuilderState::default();
        state.characters.clear();

        state.globals.texture = TextureLevel::Standard;
        assert_eq!(Assembler::standard().assemble(&ctx_of(&state), ""), "");

        state.globals.texture = TextureLevel::High;
        let high = Assembler::standard().assemble(&ctx_of(&state), "");
        assert_eq!(high, format!("TEXTURE: {}", TEXTURE_HIGH));

        state.globals.texture = TextureLevel::Extreme;
        let extreme = Assembler::standard().assemble(&ctx_of(&state), "");
        assert_eq!(extreme, format!("TEXTURE: {}", TEXTURE_EXTREME));

        assert_ne!(high, extreme);
        assert!(!extreme.contains(TEXTURE_HIGH));
    }

    #[test]
    fn test_whitespace_fields_are_treated_as_absent() {
        let mut state = BuilderState::default();
        state.globals.style = "  \t ".to_string();
        state.globals.camera = " 35mm ".to_string();
        state.characters.clear();
        let output = Assembler::standard().assemble(&ctx_of(&state), "");
        assert_eq!(output, "CAMERA: 35mm");
    }

    #[test]
    fn test_presets_render_between_lighting_and_texture() {
        let mut state = BuilderState::default();
        state.globals.light = "dusk".to_string();
        state.globals.texture = TextureLevel::High;
        state.characters.clear();
        state.presets = vec![
            PresetItem::new(" rim light "),
            PresetItem {
                id: "p2".to_string(),
                text: "ignored".to_string(),
                active: false,
            },
            PresetItem::new("   "),
        ];
        let output = Assembler::standard().assemble(&ctx_of(&state), "");
        assert_eq!(
            output,
            format!("LIGHTING: dusk\n\nrim light\n\nTEXTURE: {}", TEXTURE_HIGH)
        );
    }

    #[test]
    fn test_batch_trims_drops_empties_and_preserves_order() {
        let mut state = BuilderState::default();
        state.characters.clear();
        state.globals.style = "Pixar".to_string();
        let results = Assembler::standard().assemble_batch(
            &ctx_of(&state),
            "  first scene \n\n   \nsecond scene\n",
        );
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].scene, "first scene");
        assert_eq!(results[0].prompt, "STYLE: Pixar\n\nSCENE: first scene");
        assert_eq!(results[1].scene, "second scene");
    }

    #[test]
    fn test_join_batch_uses_copy_separator() {
        let prompts = vec![
            BatchPrompt {
                scene: "a".to_string(),
                prompt: "P1".to_string(),
            },
            BatchPrompt {
                scene: "b".to_string(),
                prompt: "P2".to_string(),
            },
        ];
        assert_eq!(join_batch(&prompts), "P1\n\n---\n\nP2");
    }

    #[test]
    fn test_manual_assembly_is_unlabeled() {
        let mut state = BuilderState::default();
        state.globals.style = "Pixar style".to_string();
        state.globals.camera = "low angle".to_string();
        state.globals.rules = "--no text".to_string();
        state.characters = vec![Character::new("Skater Cat")
            .with_text("Orange tabby cat on a skateboard")
            .with_active(true)];
        let output = Assembler::manual().assemble(&ctx_of(&state), "kickflip");
        assert_eq!(
            output,
            "Pixar style\n\nlow angle\n\nOrange tabby cat on a skateboard\n\nSCENE: kickflip"
        );
    }

    #[test]
    fn test_register_replaces_renderer() {
        fn shout(_ctx: &PromptContext<'_>, _scene: &str) -> String {
            "GLOBALS!".to_string()
        }
        let state = scenario_state();
        let mut assembler = Assembler::standard();
        assembler.register(SectionKind::Global, shout);
        let output = assembler.assemble(&ctx_of(&state), "");
        assert!(output.starts_with("GLOBALS!\n\n"));
    }

    #[test]
    fn test_unregistered_kind_is_skipped() {
        let state = scenario_state();
        let mut assembler = Assembler::new();
        assembler.register(SectionKind::Scene, render_scene);
        let output = assembler.assemble(&ctx_of(&state), "only scene");
        assert_eq!(output, "SCENE: only scene");
    }
}
