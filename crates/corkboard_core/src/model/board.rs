//! Board model.

use super::team::TeamId;
use super::user::UserId;
use super::{ensure_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BoardId = Uuid;

/// Kanban board owned by one user and optionally shared with a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub uuid: BoardId,
    pub owner_uuid: UserId,
    /// Team whose members may use this board.
    pub team_uuid: Option<TeamId>,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Board {
    pub fn new(owner_uuid: UserId, name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            owner_uuid,
            team_uuid: None,
            name: name.into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_name("board", &self.name)
    }
}
