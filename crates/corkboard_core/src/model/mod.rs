//! Board domain model.
//!
//! # Responsibility
//! - Define the records persisted by the board backend.
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Every record is identified by a stable UUID assigned at creation.
//! - Positioned records (`List`, `Task`, `Relation`, `Item`) keep a
//!   non-negative `position`; density per group is enforced by
//!   [`crate::ordering`].

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod board;
pub mod item;
pub mod list;
pub mod relation;
pub mod task;
pub mod team;
pub mod user;

/// Field-level validation failure raised before any SQL mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is empty after trimming.
    BlankName { entity: &'static str },
    /// Position is below zero.
    NegativePosition { entity: &'static str, position: i64 },
    /// Email does not look like `local@domain`.
    InvalidEmail(String),
    /// Username contains characters outside `[a-z0-9_.-]`.
    InvalidUsername(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName { entity } => write!(f, "{entity} name must not be blank"),
            Self::NegativePosition { entity, position } => {
                write!(f, "{entity} position must be >= 0, got {position}")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
            Self::InvalidUsername(value) => write!(f, "invalid username `{value}`"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn ensure_name(entity: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::BlankName { entity });
    }
    Ok(())
}

pub(crate) fn ensure_position(entity: &'static str, position: i64) -> Result<(), ValidationError> {
    if position < 0 {
        return Err(ValidationError::NegativePosition { entity, position });
    }
    Ok(())
}
