//! Task model. Tasks are ordered per list.

use super::board::BoardId;
use super::list::ListId;
use super::{ensure_name, ensure_position, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: TaskId,
    pub board_uuid: BoardId,
    /// Owning list; changing it is a cross-list move.
    pub list_uuid: ListId,
    pub name: String,
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub list_uuid: ListId,
    pub name: String,
    pub position: Option<i64>,
}

impl NewTask {
    pub fn new(list_uuid: ListId, name: impl Into<String>) -> Self {
        Self {
            list_uuid,
            name: name.into(),
            position: None,
        }
    }

    pub fn at(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }
}

impl Task {
    /// Checks every field except `position`, which the position
    /// maintainer validates against the live group size.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        ensure_name("task", &self.name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_fields()?;
        ensure_position("task", self.position)
    }
}
