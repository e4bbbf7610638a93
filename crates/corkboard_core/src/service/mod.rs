//! Core use-case services.
//!
//! # Responsibility
//! - Check board and team permissions before touching repositories.
//! - Translate partial updates into full repository writes.
//! - Keep callers decoupled from SQL and ordering details.
//!
//! # Invariants
//! - Every user-facing write runs with `OrderingChecks::Enforce`; only the
//!   import reconciliation skips checks, with pre-computed dense positions.

use crate::import::ExtractError;
use crate::model::team::TeamError;
use crate::repo::board_repo::SqliteBoardRepository;
use crate::repo::item_repo::SqliteItemRepository;
use crate::repo::list_repo::SqliteListRepository;
use crate::repo::relation_repo::SqliteRelationRepository;
use crate::repo::task_repo::SqliteTaskRepository;
use crate::repo::team_repo::SqliteTeamRepository;
use crate::repo::user_repo::SqliteUserRepository;
use crate::repo::{RepoError, RepoResult};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod access;
pub mod board_service;
pub mod card_service;
pub mod import_service;
pub mod team_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error shared by board, card, team and import use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Target record does not exist or is soft-deleted.
    NotFound { entity: &'static str, id: Uuid },
    /// No user matches the lookup query (email or username).
    UserNotFound(String),
    /// Caller may not use the board or team.
    Unauthorized {
        user_uuid: Uuid,
        entity: &'static str,
        id: Uuid,
    },
    /// Request is well-formed but not acceptable.
    InvalidInput(String),
    /// Board extraction failed.
    Extract(ExtractError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ServiceError {
    /// True when a positioned write was rejected for an out-of-range position.
    pub fn is_invalid_range(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_invalid_range())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UserNotFound(query) => write!(f, "user not found: `{query}`"),
            Self::Unauthorized {
                user_uuid,
                entity,
                id,
            } => write!(f, "user {user_uuid} is not allowed to use {entity} {id}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Extract(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Extract(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<TeamError> for ServiceError {
    fn from(value: TeamError) -> Self {
        Self::Repo(RepoError::Team(value))
    }
}

impl From<ExtractError> for ServiceError {
    fn from(value: ExtractError) -> Self {
        Self::Extract(value)
    }
}

/// SQLite repositories sharing one connection.
pub struct Repositories<'conn> {
    pub users: SqliteUserRepository<'conn>,
    pub teams: SqliteTeamRepository<'conn>,
    pub boards: SqliteBoardRepository<'conn>,
    pub lists: SqliteListRepository<'conn>,
    pub tasks: SqliteTaskRepository<'conn>,
    pub relations: SqliteRelationRepository<'conn>,
    pub items: SqliteItemRepository<'conn>,
}

impl<'conn> Repositories<'conn> {
    /// Fails with `RepoError::UninitializedConnection` on unmigrated connections.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            users: SqliteUserRepository::try_new(conn)?,
            teams: SqliteTeamRepository::try_new(conn)?,
            boards: SqliteBoardRepository::try_new(conn)?,
            lists: SqliteListRepository::try_new(conn)?,
            tasks: SqliteTaskRepository::try_new(conn)?,
            relations: SqliteRelationRepository::try_new(conn)?,
            items: SqliteItemRepository::try_new(conn)?,
        })
    }
}

/// Trimmed name, or `InvalidInput` when blank.
pub(crate) fn normalize_name(entity: &str, name: &str) -> ServiceResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "{entity} name must not be blank"
        )));
    }
    Ok(trimmed.to_string())
}
