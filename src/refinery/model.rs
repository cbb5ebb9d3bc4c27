//! Data models for the refinery (AI enhancement variant).
//!
//! The refinery persists under its own key with the same total
//! normalization as the builder: derived `Serialize` for writing, never
//! derived `Deserialize` for reading. Storage field names (`chars`,
//! `neg`, `tex`, `activeOutfit`) match the envelope the browser tool
//! has always written.

use serde::Serialize;
use serde_json::Value;

use crate::builder::model::TextureLevel;
use crate::ids;
use crate::persist::json;
use crate::provider::ApiConfig;

// =============================================================================
// OUTFIT
// =============================================================================

/// One named outfit; the active outfit's description is what reaches
/// the system prompt.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Outfit {
    pub name: String,
    pub desc: String,
}

impl Outfit {
    /// Creates an outfit.
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Outfit {
            name: name.into(),
            desc: desc.into(),
        }
    }

    /// The placeholder outfit inserted wherever a list would otherwise
    /// be empty.
    pub(crate) fn fallback() -> Self {
        Outfit::new("Default", "")
    }

    /// Normalizes one stored element; non-object elements are dropped.
    pub(crate) fn from_value(value: &Value) -> Option<Outfit> {
        if !value.is_object() {
            return None;
        }
        Some(Outfit {
            name: json::string_or(json::pick(value, &[&["name"]]), ""),
            desc: json::string_or(json::pick(value, &[&["desc"]]), ""),
        })
    }
}

// =============================================================================
// ACTOR
// =============================================================================

/// A refinery actor: a tag the user types in scene text (`@cat`) plus
/// the description and outfit wardrobe the model substitutes for it.
///
/// Invariants: `outfits` is never empty and `active_outfit` is always a
/// valid index. Normalization restores both; mutation paths preserve
/// them (the last outfit cannot be removed).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub tag: String,
    pub desc: String,
    pub outfits: Vec<Outfit>,
    #[serde(rename = "activeOutfit")]
    pub active_outfit: usize,
    pub open: bool,
}

impl Actor {
    /// Creates an actor with a fresh id, one placeholder outfit, and an
    /// open panel.
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Actor {
            id: ids::fresh("a"),
            name: name.into(),
            tag: tag.into(),
            desc: String::new(),
            outfits: vec![Outfit::fallback()],
            active_outfit: 0,
            open: true,
        }
    }

    /// Builder: Set description.
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Builder: Replace the wardrobe (empty input keeps the placeholder).
    pub fn with_outfits(mut self, outfits: Vec<Outfit>) -> Self {
        if !outfits.is_empty() {
            self.outfits = outfits;
            self.active_outfit = 0;
        }
        self
    }

    /// The currently selected outfit.
    pub fn current_outfit(&self) -> Option<&Outfit> {
        self.outfits.get(self.active_outfit)
    }

    /// Normalizes one stored element; non-object elements are dropped.
    ///
    /// An empty stored wardrobe gets the placeholder outfit; the active
    /// index is clamped into range.
    pub(crate) fn from_value(value: &Value) -> Option<Actor> {
        if !value.is_object() {
            return None;
        }
        let id = match json::pick(value, &[&["id"]]) {
            Some(v) => json::string_or(Some(v), ""),
            None => ids::fresh("a"),
        };
        let mut outfits: Vec<Outfit> = value
            .get("outfits")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Outfit::from_value).collect())
            .unwrap_or_default();
        if outfits.is_empty() {
            outfits.push(Outfit::fallback());
        }
        let raw_index = json::int_or(json::pick(value, &[&["activeOutfit"]]), 0);
        let active_outfit = if raw_index < 0 {
            0
        } else {
            (raw_index as usize).min(outfits.len() - 1)
        };
        Some(Actor {
            id,
            name: json::string_or(json::pick(value, &[&["name"]]), "Unnamed"),
            tag: json::string_or(json::pick(value, &[&["tag"]]), ""),
            desc: json::string_or(json::pick(value, &[&["desc"]]), ""),
            outfits,
            active_outfit,
            open: json::truthy(value.get("open")),
        })
    }
}

// =============================================================================
// REFINERY STATE
// =============================================================================

/// The refinery envelope: actors plus enhancement settings and the
/// provider config.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RefineryState {
    #[serde(rename = "chars")]
    pub actors: Vec<Actor>,
    pub style: String,
    #[serde(rename = "neg")]
    pub negative: String,
    #[serde(rename = "tex")]
    pub texture: TextureLevel,
    pub api: ApiConfig,
    pub suffix: String,
}

impl RefineryState {
    /// Default actor roster shipped with the tool.
    pub fn default_actors() -> Vec<Actor> {
        vec![Actor {
            id: "rc1".to_string(),
            name: "Tabby".to_string(),
            tag: "@cat".to_string(),
            desc: "orange tabby cat, anthropomorphic".to_string(),
            outfits: vec![Outfit::new("Hoodie", "blue hoodie")],
            active_outfit: 0,
            open: true,
        }]
    }

    /// Total normalization of a stored envelope. A non-array `chars`
    /// yields the default roster; an empty array stays empty (the user
    /// deleted every actor on purpose).
    pub(crate) fn from_value(value: &Value) -> Self {
        let actors = match json::pick(value, &[&["chars"]]).and_then(Value::as_array) {
            Some(items) => items.iter().filter_map(Actor::from_value).collect(),
            None => Self::default_actors(),
        };
        RefineryState {
            actors,
            style: json::string_or(json::pick(value, &[&["style"]]), ""),
            negative: json::string_or(json::pick(value, &[&["neg"]]), ""),
            texture: TextureLevel::from_key(&json::string_or(
                json::pick(value, &[&["tex"]]),
                "standard",
            )),
            api: json::pick(value, &[&["api"]])
                .map(ApiConfig::from_value)
                .unwrap_or_default(),
            suffix: json::string_or(json::pick(value, &[&["suffix"]]), ""),
        }
    }
}

impl Default for RefineryState {
    fn default() -> Self {
        RefineryState {
            actors: Self::default_actors(),
            style: String::new(),
            negative: String::new(),
            texture: TextureLevel::Standard,
            api: ApiConfig::default(),
            suffix: String::new(),
        }
    }
}
