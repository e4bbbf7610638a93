//! Relation model.
//!
//! Relations are the row/column headers of a board matrix. Vertical and
//! horizontal relations are ordered independently, so the ordering group is
//! `(board_uuid, relation_type)`.

use super::board::BoardId;
use super::{ensure_name, ensure_position, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RelationId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Vertical,
    Horizontal,
}

impl RelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "vertical" => Some(Self::Vertical),
            "horizontal" => Some(Self::Horizontal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub uuid: RelationId,
    pub board_uuid: BoardId,
    pub name: String,
    /// Changing the type moves the relation to the other ordering group.
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelation {
    pub board_uuid: BoardId,
    pub name: String,
    pub relation_type: RelationType,
    pub position: Option<i64>,
}

impl NewRelation {
    pub fn new(board_uuid: BoardId, name: impl Into<String>, relation_type: RelationType) -> Self {
        Self {
            board_uuid,
            name: name.into(),
            relation_type,
            position: None,
        }
    }

    pub fn at(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }
}

impl Relation {
    /// Checks every field except `position`, which the position
    /// maintainer validates against the live group size.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        ensure_name("relation", &self.name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_fields()?;
        ensure_position("relation", self.position)
    }
}
