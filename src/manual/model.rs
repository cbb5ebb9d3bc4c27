//! Data model for the manual block editor.

use serde::Serialize;
use serde_json::Value;

use crate::builder::model::Character;
use crate::persist::json;

/// The manual editor envelope: two free-text lines plus raw blocks.
///
/// Blocks reuse the builder's `Character` shape; only `text` and
/// `active` matter to assembly, which renders block text unlabeled.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ManualState {
    pub style: String,
    pub camera: String,
    pub blocks: Vec<Character>,
}

impl ManualState {
    /// Default block shipped with the tool.
    pub fn default_blocks() -> Vec<Character> {
        vec![Character {
            id: "fc1".to_string(),
            name: "Skater Cat".to_string(),
            text: "Orange tabby cat on a skateboard".to_string(),
            active: true,
            is_open: false,
        }]
    }

    /// Total normalization of a stored envelope. A non-array `blocks`
    /// yields the default block; an empty array stays empty.
    pub(crate) fn from_value(value: &Value) -> Self {
        let blocks = match json::pick(value, &[&["blocks"]]).and_then(Value::as_array) {
            Some(items) => items.iter().filter_map(Character::from_value).collect(),
            None => Self::default_blocks(),
        };
        ManualState {
            style: json::string_or(json::pick(value, &[&["style"]]), ""),
            camera: json::string_or(json::pick(value, &[&["camera"]]), ""),
            blocks,
        }
    }
}

impl Default for ManualState {
    fn default() -> Self {
        ManualState {
            style: String::new(),
            camera: String::new(),
            blocks: Self::default_blocks(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_state_shape() {
        let state = ManualState::default();
        assert_eq!(state.blocks.len(), 1);
        let block = &state.blocks[0];
        assert_eq!(block.id, "fc1");
        assert_eq!(block.name, "Skater Cat");
        assert_eq!(block.text, "Orange tabby cat on a skateboard");
        assert!(block.active);
    }

    #[test]
    fn test_from_value_roundtrip() {
        let mut state = ManualState::default();
        state.style = "Anime".to_string();
        state.camera = "low angle".to_string();
        let raw = serde_json::to_value(&state).unwrap();
        assert_eq!(ManualState::from_value(&raw), state);
    }

    #[test]
    fn test_from_value_garbage_gives_defaults() {
        assert_eq!(ManualState::from_value(&json!("junk")), ManualState::default());
        assert_eq!(ManualState::from_value(&json!({ "blocks": 7 })), ManualState::default());
    }

    #[test]
    fn test_empty_block_list_is_preserved() {
        let state = ManualState::from_value(&json!({ "blocks": [] }));
        assert!(state.blocks.is_empty());
    }

    #[test]
    fn test_block_elements_normalize_like_characters() {
        let state = ManualState::from_value(&json!({
            "blocks": [null, { "text": "a brick wall", "active": 1 }]
        }));
        assert_eq!(state.blocks.len(), 1);
        assert_eq!(state.blocks[0].name, "Unnamed");
        assert_eq!(state.blocks[0].text, "a brick wall");
        assert!(state.blocks[0].active);
    }
}
