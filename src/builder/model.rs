//! Data models for the prompt builder.
//!
//! These structs mirror the JSON envelope the browser tool persists
//! (`pawsville_v5` flat shape), so serialization stays byte-compatible
//! with state written by earlier versions of the tool. Loading never uses
//! derived deserialization: `BuilderState::from_value` normalizes every
//! field individually and cannot fail.

use serde::Serialize;
use serde_json::Value;

use crate::ids;
use crate::persist::json;

// =============================================================================
// TEXTURE LEVEL
// =============================================================================

/// Texture intensity for the global section's TEXTURE line.
///
/// `Standard` emits nothing; `High` and `Extreme` each emit their own
/// fixed template text.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextureLevel {
    #[default]
    Standard,
    High,
    Extreme,
}

impl TextureLevel {
    /// Parses a stored value; anything unrecognized reads as `Standard`.
    pub fn from_key(key: &str) -> Self {
        match key {
            "high" => TextureLevel::High,
            "extreme" => TextureLevel::Extreme,
            _ => TextureLevel::Standard,
        }
    }

    /// Storage key for this level.
    pub fn as_key(&self) -> &'static str {
        match self {
            TextureLevel::Standard => "standard",
            TextureLevel::High => "high",
            TextureLevel::Extreme => "extreme",
        }
    }

    /// Human-readable label (dashboard display).
    pub fn label(&self) -> &'static str {
        match self {
            TextureLevel::Standard => "Standard",
            TextureLevel::High => "High",
            TextureLevel::Extreme => "Extreme",
        }
    }
}

// =============================================================================
// GLOBAL SETTINGS
// =============================================================================

/// The fixed set of global free-text fields plus texture intensity.
///
/// Exactly one instance per session; mutated field-by-field.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GlobalSettings {
    /// Style line (`STYLE:`).
    pub style: String,
    /// Camera line (`CAMERA:`).
    pub camera: String,
    /// Lighting line (`LIGHTING:`).
    pub light: String,
    /// Texture intensity (`TEXTURE:` template selection).
    pub texture: TextureLevel,
    /// Negative prompt line (`NEGATIVE:`).
    pub rules: String,
}

impl GlobalSettings {
    /// Creates empty settings at standard texture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: Set style.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Builder: Set camera.
    pub fn with_camera(mut self, camera: impl Into<String>) -> Self {
        self.camera = camera.into();
        self
    }

    /// Builder: Set lighting.
    pub fn with_light(mut self, light: impl Into<String>) -> Self {
        self.light = light.into();
        self
    }

    /// Builder: Set texture level.
    pub fn with_texture(mut self, texture: TextureLevel) -> Self {
        self.texture = texture;
        self
    }

    /// Builder: Set negative rules.
    pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
        self.rules = rules.into();
        self
    }
}

// =============================================================================
// CHARACTER
// =============================================================================

/// A reusable character block: active characters with non-blank text
/// contribute one `CHARACTER (NAME): text` line to the output.
///
/// The manual editor reuses this shape for its free-form blocks.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub text: String,
    pub active: bool,
    #[serde(rename = "isOpen")]
    pub is_open: bool,
}

impl Character {
    /// Creates a character with a fresh id and the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Character {
            id: ids::fresh("c"),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: Set description text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder: Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Builder: Set the panel-open flag.
    pub fn with_open(mut self, is_open: bool) -> Self {
        self.is_open = is_open;
        self
    }

    /// Normalizes one stored element; non-object elements are dropped.
    ///
    /// A missing or null id gets a fresh one, but a present empty-string
    /// id is kept as stored.
    pub(crate) fn from_value(value: &Value) -> Option<Character> {
        if !value.is_object() {
            return None;
        }
        let id = match json::pick(value, &[&["id"]]) {
            Some(v) => json::string_or(Some(v), ""),
            None => ids::fresh("c"),
        };
        Some(Character {
            id,
            name: json::string_or(json::pick(value, &[&["name"]]), "Unnamed"),
            text: json::string_or(json::pick(value, &[&["text"]]), ""),
            active: json::truthy(value.get("active")),
            is_open: json::truthy(value.get("isOpen")),
        })
    }
}

// =============================================================================
// PRESET ITEM
// =============================================================================

/// A flat toggleable text snippet rendered inside the global section
/// when active and non-blank.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PresetItem {
    pub id: String,
    pub text: String,
    pub active: bool,
}

impl PresetItem {
    /// Creates a preset with a fresh id.
    pub fn new(text: impl Into<String>) -> Self {
        PresetItem {
            id: ids::fresh("p"),
            text: text.into(),
            active: true,
        }
    }

    pub(crate) fn from_value(value: &Value) -> Option<PresetItem> {
        if !value.is_object() {
            return None;
        }
        let id = match json::pick(value, &[&["id"]]) {
            Some(v) => json::string_or(Some(v), ""),
            None => ids::fresh("p"),
        };
        Some(PresetItem {
            id,
            text: json::string_or(json::pick(value, &[&["text"]]), ""),
            active: json::truthy(value.get("active")),
        })
    }
}

// =============================================================================
// SECTION ORDER
// =============================================================================

/// The fixed kinds of output section the assembler can render.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SectionKind {
    #[serde(rename = "global")]
    Global,
    #[serde(rename = "chars")]
    Characters,
    #[serde(rename = "scene")]
    Scene,
}

impl SectionKind {
    /// Every kind, in default order.
    pub const ALL: [SectionKind; 3] = [
        SectionKind::Global,
        SectionKind::Characters,
        SectionKind::Scene,
    ];

    /// Parses a storage id (`global` / `chars` / `scene`).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "global" => Some(SectionKind::Global),
            "chars" => Some(SectionKind::Characters),
            "scene" => Some(SectionKind::Scene),
            _ => None,
        }
    }

    /// Storage id for this kind.
    pub fn as_key(&self) -> &'static str {
        match self {
            SectionKind::Global => "global",
            SectionKind::Characters => "chars",
            SectionKind::Scene => "scene",
        }
    }

    /// Canonical display label.
    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::Global => "Global Settings",
            SectionKind::Characters => "Characters",
            SectionKind::Scene => "Scene Description",
        }
    }
}

/// One entry of the user-ordered section list.
///
/// Labels are always rebuilt from the kind during normalization, never
/// trusted from stored data.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderEntry {
    #[serde(rename = "id")]
    pub kind: SectionKind,
    pub name: String,
}

impl OrderEntry {
    /// Creates an entry with the kind's canonical label.
    pub fn new(kind: SectionKind) -> Self {
        OrderEntry {
            kind,
            name: kind.label().to_string(),
        }
    }
}

// =============================================================================
// BUILDER STATE
// =============================================================================

/// Full Block Store snapshot for the builder tool.
///
/// Serializes to the flat current-version envelope; `from_value` accepts
/// both the flat shape and the nested legacy shape.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BuilderState {
    #[serde(flatten)]
    pub globals: GlobalSettings,
    #[serde(rename = "chars")]
    pub characters: Vec<Character>,
    #[serde(rename = "order")]
    pub prompt_order: Vec<OrderEntry>,
    pub presets: Vec<PresetItem>,
    pub suffix: String,
    /// Ids of collapsed UI panels (opaque to the core).
    pub collapsed: Vec<String>,
}

impl BuilderState {
    /// Default character roster shipped with the tool.
    pub fn default_characters() -> Vec<Character> {
        let seed = [
            ("c1", "Orange Tabby", true),
            ("c2", "Baby Dragon", true),
            ("c3", "Duckling", false),
            ("c4", "Queen", false),
            ("c5", "Bully", false),
        ];
        seed.iter()
            .map(|(id, name, active)| Character {
                id: id.to_string(),
                name: name.to_string(),
                text: String::new(),
                active: *active,
                is_open: false,
            })
            .collect()
    }

    /// Default section order: global, characters, scene.
    pub fn default_order() -> Vec<OrderEntry> {
        SectionKind::ALL.iter().copied().map(OrderEntry::new).collect()
    }

    /// Total normalization of a stored envelope. Never fails: every
    /// field degrades to its default independently, and non-object input
    /// yields the full default state.
    pub fn from_value(raw: &Value) -> Self {
        let globals = GlobalSettings {
            style: json::string_or(json::pick(raw, &[&["style"], &["globals", "style"]]), ""),
            camera: json::string_or(json::pick(raw, &[&["camera"], &["globals", "camera"]]), ""),
            light: json::string_or(json::pick(raw, &[&["light"], &["globals", "light"]]), ""),
            texture: TextureLevel::from_key(&json::string_or(
                json::pick(raw, &[&["texture"], &["globals", "texture"]]),
                "",
            )),
            rules: json::string_or(json::pick(raw, &[&["rules"], &["globals", "rules"]]), ""),
        };
        BuilderState {
            globals,
            characters: normalize_characters(json::pick(raw, &[&["chars"], &["characters"]])),
            prompt_order: normalize_order(json::pick(raw, &[&["order"], &["promptOrder"]])),
            presets: normalize_presets(json::pick(raw, &[&["presets"]])),
            suffix: json::string_or(json::pick(raw, &[&["suffix"]]), ""),
            collapsed: normalize_collapsed(json::pick(raw, &[&["collapsed"]])),
        }
    }
}

impl Default for BuilderState {
    fn default() -> Self {
        BuilderState {
            globals: GlobalSettings::default(),
            characters: Self::default_characters(),
            prompt_order: Self::default_order(),
            presets: Vec::new(),
            suffix: String::new(),
            collapsed: Vec::new(),
        }
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Non-array input falls back to the default roster; an array keeps only
/// its object elements, each normalized field-by-field. An empty array
/// stays empty.
fn normalize_characters(raw: Option<&Value>) -> Vec<Character> {
    match raw.and_then(Value::as_array) {
        Some(list) => list.iter().filter_map(Character::from_value).collect(),
        None => BuilderState::default_characters(),
    }
}

/// Guarantees each section kind appears exactly once: unknown ids are
/// dropped, duplicates keep their first position, missing kinds are
/// re-appended in default order.
fn normalize_order(raw: Option<&Value>) -> Vec<OrderEntry> {
    let mut kinds: Vec<SectionKind> = Vec::new();
    if let Some(list) = raw.and_then(Value::as_array) {
        for item in list {
            let key = json::string_or(item.get("id"), "");
            if let Some(kind) = SectionKind::from_key(&key) {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
    }
    for kind in SectionKind::ALL {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds.into_iter().map(OrderEntry::new).collect()
}

fn normalize_presets(raw: Option<&Value>) -> Vec<PresetItem> {
    raw.and_then(Value::as_array)
        .map(|list| list.iter().filter_map(PresetItem::from_value).collect())
        .unwrap_or_default()
}

fn normalize_collapsed(raw: Option<&Value>) -> Vec<String> {
    raw.and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_texture_level_parsing() {
        assert_eq!(TextureLevel::from_key("high"), TextureLevel::High);
        assert_eq!(TextureLevel::from_key("extreme"), TextureLevel::Extreme);
        assert_eq!(TextureLevel::from_key("standard"), TextureLevel::Standard);
        assert_eq!(TextureLevel::from_key("HIGH"), TextureLevel::Standard);
        assert_eq!(TextureLevel::from_key(""), TextureLevel::Standard);
    }

    #[test]
    fn test_default_state_shape() {
        let state = BuilderState::default();
        assert_eq!(state.characters.len(), 5);
        assert_eq!(state.characters[0].name, "Orange Tabby");
        assert!(state.characters[0].active);
        assert!(!state.characters[2].active);
        assert_eq!(state.prompt_order.len(), 3);
        assert_eq!(state.prompt_order[0].kind, SectionKind::Global);
        assert_eq!(state.prompt_order[0].name, "Global Settings");
        assert!(state.presets.is_empty());
        assert!(state.suffix.is_empty());
    }

    #[test]
    fn test_from_value_reads_flat_envelope() {
        let raw = json!({
            "style": "Pixar style",
            "camera": "35mm",
            "light": "golden hour",
            "texture": "high",
            "rules": "--no text",
            "chars": [
                { "id": "c9", "name": "Cat", "text": "orange tabby", "active": true, "isOpen": true }
            ],
            "order": [
                { "id": "scene", "name": "whatever" },
                { "id": "global", "name": "x" },
                { "id": "chars", "name": "y" }
            ]
        });
        let state = BuilderState::from_value(&raw);
        assert_eq!(state.globals.style, "Pixar style");
        assert_eq!(state.globals.texture, TextureLevel::High);
        assert_eq!(state.characters.len(), 1);
        assert_eq!(state.characters[0].id, "c9");
        assert!(state.characters[0].is_open);
        assert_eq!(state.prompt_order[0].kind, SectionKind::Scene);
        // labels rebuilt from the kind, not trusted from data
        assert_eq!(state.prompt_order[0].name, "Scene Description");
    }

    #[test]
    fn test_from_value_reads_nested_legacy_envelope() {
        let raw = json!({
            "globals": { "style": "Ghibli", "camera": "", "light": "dusk", "rules": "" },
            "characters": [
                { "id": "c1", "name": "Tabby", "text": "cat", "active": 1 }
            ],
            "promptOrder": [ { "id": "chars" }, { "id": "global" }, { "id": "scene" } ]
        });
        let state = BuilderState::from_value(&raw);
        assert_eq!(state.globals.style, "Ghibli");
        assert_eq!(state.globals.light, "dusk");
        // legacy envelopes predate texture levels
        assert_eq!(state.globals.texture, TextureLevel::Standard);
        assert_eq!(state.characters[0].name, "Tabby");
        assert!(state.characters[0].active);
        assert_eq!(state.prompt_order[0].kind, SectionKind::Characters);
    }

    #[test]
    fn test_from_value_flat_wins_over_nested() {
        let raw = json!({
            "style": "flat",
            "globals": { "style": "nested" }
        });
        assert_eq!(BuilderState::from_value(&raw).globals.style, "flat");
    }

    #[test]
    fn test_from_value_defaults_on_garbage() {
        for raw in [json!(42), json!("nope"), json!(null), json!([1, 2])] {
            let state = BuilderState::from_value(&raw);
            assert_eq!(state, BuilderState::default());
        }
    }

    #[test]
    fn test_from_value_degrades_field_by_field() {
        let raw = json!({
            "style": ["not", "a", "string"],
            "camera": 35,
            "texture": "bogus",
            "chars": "not an array",
            "order": []
        });
        let state = BuilderState::from_value(&raw);
        assert_eq!(state.globals.style, "");
        assert_eq!(state.globals.camera, "35");
        assert_eq!(state.globals.texture, TextureLevel::Standard);
        assert_eq!(state.characters, BuilderState::default_characters());
        assert_eq!(state.prompt_order, BuilderState::default_order());
    }

    #[test]
    fn test_normalize_characters_keeps_empty_array() {
        let raw = json!({ "chars": [] });
        assert!(BuilderState::from_value(&raw).characters.is_empty());
    }

    #[test]
    fn test_normalize_characters_drops_non_objects() {
        let raw = json!({ "chars": [null, 7, "x", { "name": "Kept" }] });
        let chars = BuilderState::from_value(&raw).characters;
        assert_eq!(chars.len(), 1);
        assert_eq!(chars[0].name, "Kept");
        assert!(chars[0].id.starts_with("c-"));
        assert!(!chars[0].active);
    }

    #[test]
    fn test_normalize_character_name_defaults_to_unnamed() {
        let raw = json!({ "chars": [ { "id": "c1" } ] });
        assert_eq!(BuilderState::from_value(&raw).characters[0].name, "Unnamed");
    }

    #[test]
    fn test_normalize_order_dedups_and_completes() {
        let raw = json!({
            "order": [
                { "id": "scene" },
                { "id": "scene" },
                { "id": "bogus" },
                "garbage"
            ]
        });
        let order = BuilderState::from_value(&raw).prompt_order;
        let kinds: Vec<SectionKind> = order.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![SectionKind::Scene, SectionKind::Global, SectionKind::Characters]
        );
    }

    #[test]
    fn test_envelope_roundtrip_through_normalization() {
        let mut state = BuilderState::default();
        state.globals.style = "Pixar style".to_string();
        state.globals.texture = TextureLevel::Extreme;
        state.characters[0].text = "orange tabby".to_string();
        state.presets.push(PresetItem::new("rim light"));
        state.suffix = "--ar 16:9".to_string();
        state.collapsed.push("globals".to_string());

        let raw = serde_json::to_value(&state).unwrap();
        assert_eq!(raw["texture"], "extreme");
        assert_eq!(raw["order"][0]["id"], "global");
        assert_eq!(raw["chars"][0]["isOpen"], false);

        let reloaded = BuilderState::from_value(&raw);
        assert_eq!(reloaded, state);
    }
}
