//! Core domain logic for Corkboard, a collaborative kanban board backend.
//! This crate is the single source of truth for board invariants, most
//! notably the dense `0..N` ordering of lists, tasks, relations and items.

pub mod config;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod service;

pub use config::{load_config, ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use import::{BoardExtractor, ExtractError, ExtractedBoard, ProcessExtractor};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::board::{Board, BoardId};
pub use model::item::{Item, ItemId, NewItem};
pub use model::list::{List, ListId, NewList};
pub use model::relation::{NewRelation, Relation, RelationId, RelationType};
pub use model::task::{NewTask, Task, TaskId};
pub use model::team::{Team, TeamError, TeamId, TeamMember};
pub use model::user::{User, UserId};
pub use model::ValidationError;
pub use ordering::{OrderingChecks, OrderingError};
pub use repo::{RepoError, RepoResult};
pub use service::board_service::{BoardService, BoardView, ListPatch, ListView, RelationPatch};
pub use service::card_service::{CardService, ItemPatch, TaskPatch};
pub use service::import_service::{ImportService, ImportSummary};
pub use service::team_service::TeamService;
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
