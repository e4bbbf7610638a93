//! Board import from extracted image data.
//!
//! # Responsibility
//! - Describe the opaque extractor output (`ExtractedBoard`).
//! - Match extracted names against existing records.
//! - Plan dense target layouts that the import service writes with
//!   ordering checks skipped.

use crate::model::relation::RelationType;
use serde::{Deserialize, Serialize};

mod extractor;
mod matching;

pub use extractor::{BoardExtractor, ExtractError, ProcessExtractor};
pub use matching::{
    dice_coefficient, match_by_name, names_match, plan_slots, Slot,
    DEFAULT_NAME_MATCH_MIN_CONFIDENCE,
};

/// Structured board content produced by an extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBoard {
    #[serde(default)]
    pub lists: Vec<ExtractedList>,
    #[serde(default)]
    pub relations: Vec<ExtractedRelation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedList {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub items: Vec<ExtractedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRelation {
    /// Extractor-local identifier; informational only.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
}

/// Trimmed text, or `None` when absent or blank.
pub(crate) fn clean_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{clean_text, ExtractedBoard};
    use crate::model::relation::RelationType;

    #[test]
    fn parses_extractor_output_with_missing_fields() {
        let raw = r#"{
            "lists": [
                {"text": "Todo", "items": [{"text": "Buy milk"}, {}]},
                {"items": []}
            ],
            "relations": [{"id": "r1", "text": "Week 1", "type": "vertical"}]
        }"#;

        let board: ExtractedBoard = serde_json::from_str(raw).unwrap();
        assert_eq!(board.lists.len(), 2);
        assert_eq!(board.lists[0].items.len(), 2);
        assert_eq!(board.lists[0].items[1].text, None);
        assert_eq!(board.lists[1].text, None);
        assert_eq!(board.relations[0].relation_type, RelationType::Vertical);
    }

    #[test]
    fn empty_object_is_an_empty_board() {
        let board: ExtractedBoard = serde_json::from_str("{}").unwrap();
        assert!(board.lists.is_empty());
        assert!(board.relations.is_empty());
    }

    #[test]
    fn clean_text_drops_blank_values() {
        assert_eq!(clean_text(Some("  Done ")), Some("Done".to_string()));
        assert_eq!(clean_text(Some("   ")), None);
        assert_eq!(clean_text(None), None);
    }
}
