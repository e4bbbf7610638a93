//! Board item model.
//!
//! Items are the cards of a board. They are ordered per list and may move
//! between lists of the same board.

use super::board::BoardId;
use super::list::ListId;
use super::{ensure_name, ensure_position, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ItemId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub uuid: ItemId,
    pub board_uuid: BoardId,
    /// Owning list; changing it is a cross-list move.
    pub list_uuid: ListId,
    pub name: String,
    pub description: Option<String>,
    /// Zero-based rank among the list's live items.
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating an item. `position: None` appends at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub list_uuid: ListId,
    pub name: String,
    pub description: Option<String>,
    pub position: Option<i64>,
}

impl NewItem {
    pub fn new(list_uuid: ListId, name: impl Into<String>) -> Self {
        Self {
            list_uuid,
            name: name.into(),
            description: None,
            position: None,
        }
    }

    pub fn at(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Item {
    /// Checks every field except `position`, which the position
    /// maintainer validates against the live group size.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        ensure_name("item", &self.name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_fields()?;
        ensure_position("item", self.position)
    }
}
