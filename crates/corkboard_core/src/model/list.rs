//! Board list (column) model.
//!
//! Lists are ordered per board: their positions are dense within
//! `board_uuid`.

use super::board::BoardId;
use super::{ensure_name, ensure_position, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ListId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub uuid: ListId,
    pub board_uuid: BoardId,
    pub name: String,
    /// Zero-based rank among the board's live lists.
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a list. `position: None` appends at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewList {
    pub board_uuid: BoardId,
    pub name: String,
    pub position: Option<i64>,
}

impl NewList {
    pub fn new(board_uuid: BoardId, name: impl Into<String>) -> Self {
        Self {
            board_uuid,
            name: name.into(),
            position: None,
        }
    }

    pub fn at(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }
}

impl List {
    /// Checks every field except `position`, which the position
    /// maintainer validates against the live group size.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        ensure_name("list", &self.name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_fields()?;
        ensure_position("list", self.position)
    }
}
