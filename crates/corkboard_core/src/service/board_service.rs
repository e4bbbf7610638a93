//! Board use-case service: boards, lists and relations.
//!
//! # Invariants
//! - Every call resolves permissions through [`AccessService`] first.
//! - List and relation positions stay dense; out-of-range requests fail
//!   with an `InvalidRange` ordering error and change nothing.

use super::access::AccessService;
use super::{normalize_name, Repositories, ServiceResult};
use crate::model::board::{Board, BoardId};
use crate::model::item::Item;
use crate::model::list::{List, ListId, NewList};
use crate::model::relation::{NewRelation, Relation, RelationId, RelationType};
use crate::model::task::Task;
use crate::model::team::TeamId;
use crate::model::user::UserId;
use crate::ordering::OrderingChecks;
use crate::repo::board_repo::BoardRepository;
use crate::repo::item_repo::ItemRepository;
use crate::repo::list_repo::ListRepository;
use crate::repo::relation_repo::RelationRepository;
use crate::repo::task_repo::TaskRepository;
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

/// Partial list update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPatch {
    pub name: Option<String>,
    pub position: Option<i64>,
}

/// Partial relation update. A type change without a position appends the
/// relation to the other group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationPatch {
    pub name: Option<String>,
    pub relation_type: Option<RelationType>,
    pub position: Option<i64>,
}

/// One list with its tasks and items, both ordered by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListView {
    #[serde(flatten)]
    pub list: List,
    pub tasks: Vec<Task>,
    pub items: Vec<Item>,
}

/// Full board read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub board: Board,
    pub lists: Vec<ListView>,
    pub relations: Vec<Relation>,
}

pub struct BoardService<'conn> {
    repos: Repositories<'conn>,
}

impl<'conn> BoardService<'conn> {
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self {
            repos: Repositories::try_new(conn)?,
        })
    }

    fn access(&self) -> AccessService<'_, 'conn> {
        AccessService::new(&self.repos)
    }

    /// Creates a board owned by `user_uuid`, optionally shared with a team
    /// the user belongs to.
    pub fn create_board(
        &self,
        user_uuid: UserId,
        name: &str,
        team_uuid: Option<TeamId>,
    ) -> ServiceResult<Board> {
        if let Some(team_uuid) = team_uuid {
            self.access().team(user_uuid, team_uuid)?;
        }
        let mut board = Board::new(user_uuid, normalize_name("board", name)?);
        board.team_uuid = team_uuid;

        let board = self.repos.boards.create_board(&board)?;
        info!("event=board_create module=service status=ok shared={}", team_uuid.is_some());
        Ok(board)
    }

    pub fn rename_board(
        &self,
        user_uuid: UserId,
        board_uuid: BoardId,
        name: &str,
    ) -> ServiceResult<Board> {
        let mut board = self.access().board(user_uuid, board_uuid)?;
        board.name = normalize_name("board", name)?;
        Ok(self.repos.boards.update_board(&board)?)
    }

    /// Shares the board with a team (or stops sharing with `None`). Owner only.
    pub fn share_board(
        &self,
        user_uuid: UserId,
        board_uuid: BoardId,
        team_uuid: Option<TeamId>,
    ) -> ServiceResult<Board> {
        let mut board = self.access().owned_board(user_uuid, board_uuid)?;
        if let Some(team_uuid) = team_uuid {
            self.access().team(user_uuid, team_uuid)?;
        }
        board.team_uuid = team_uuid;
        Ok(self.repos.boards.update_board(&board)?)
    }

    /// Boards the user owns or reaches through a team.
    pub fn list_boards(&self, user_uuid: UserId) -> ServiceResult<Vec<Board>> {
        Ok(self.repos.boards.list_boards_for_user(user_uuid)?)
    }

    pub fn delete_board(&self, user_uuid: UserId, board_uuid: BoardId) -> ServiceResult<()> {
        self.access().owned_board(user_uuid, board_uuid)?;
        self.repos.boards.soft_delete_board(board_uuid)?;
        info!("event=board_delete module=service status=ok");
        Ok(())
    }

    /// Board with lists (each carrying tasks and items) and relations.
    pub fn board_view(&self, user_uuid: UserId, board_uuid: BoardId) -> ServiceResult<BoardView> {
        let board = self.access().board(user_uuid, board_uuid)?;

        let mut tasks: HashMap<ListId, Vec<Task>> = HashMap::new();
        for task in self.repos.tasks.list_tasks_of_board(board_uuid)? {
            tasks.entry(task.list_uuid).or_default().push(task);
        }
        let mut items: HashMap<ListId, Vec<Item>> = HashMap::new();
        for item in self.repos.items.list_items_of_board(board_uuid)? {
            items.entry(item.list_uuid).or_default().push(item);
        }

        let lists = self
            .repos
            .lists
            .list_lists_of_board(board_uuid)?
            .into_iter()
            .map(|list| ListView {
                tasks: tasks.remove(&list.uuid).unwrap_or_default(),
                items: items.remove(&list.uuid).unwrap_or_default(),
                list,
            })
            .collect();

        Ok(BoardView {
            board,
            lists,
            relations: self.repos.relations.list_relations_of_board(board_uuid)?,
        })
    }

    pub fn create_list(
        &self,
        user_uuid: UserId,
        board_uuid: BoardId,
        name: &str,
        position: Option<i64>,
    ) -> ServiceResult<List> {
        self.access().board(user_uuid, board_uuid)?;
        let draft = NewList {
            board_uuid,
            name: normalize_name("list", name)?,
            position,
        };
        Ok(self.repos.lists.create_list(&draft, OrderingChecks::Enforce)?)
    }

    pub fn update_list(
        &self,
        user_uuid: UserId,
        list_uuid: ListId,
        patch: ListPatch,
    ) -> ServiceResult<List> {
        let mut list = self.access().list(user_uuid, list_uuid)?;
        if let Some(name) = patch.name {
            list.name = normalize_name("list", &name)?;
        }
        if let Some(position) = patch.position {
            list.position = position;
        }
        Ok(self.repos.lists.update_list(&list, OrderingChecks::Enforce)?)
    }

    /// Deletes the list with its tasks and items.
    pub fn delete_list(&self, user_uuid: UserId, list_uuid: ListId) -> ServiceResult<()> {
        self.access().list(user_uuid, list_uuid)?;
        Ok(self.repos.lists.delete_list(list_uuid)?)
    }

    pub fn lists(&self, user_uuid: UserId, board_uuid: BoardId) -> ServiceResult<Vec<List>> {
        self.access().board(user_uuid, board_uuid)?;
        Ok(self.repos.lists.list_lists_of_board(board_uuid)?)
    }

    pub fn create_relation(
        &self,
        user_uuid: UserId,
        board_uuid: BoardId,
        name: &str,
        relation_type: RelationType,
        position: Option<i64>,
    ) -> ServiceResult<Relation> {
        self.access().board(user_uuid, board_uuid)?;
        let draft = NewRelation {
            board_uuid,
            name: normalize_name("relation", name)?,
            relation_type,
            position,
        };
        Ok(self
            .repos
            .relations
            .create_relation(&draft, OrderingChecks::Enforce)?)
    }

    pub fn update_relation(
        &self,
        user_uuid: UserId,
        relation_uuid: RelationId,
        patch: RelationPatch,
    ) -> ServiceResult<Relation> {
        let mut relation = self.access().relation(user_uuid, relation_uuid)?;
        if let Some(name) = patch.name {
            relation.name = normalize_name("relation", &name)?;
        }
        if let Some(relation_type) = patch.relation_type {
            relation.relation_type = relation_type;
        }
        Ok(self
            .repos
            .relations
            .save_relation(&relation, patch.position, OrderingChecks::Enforce)?)
    }

    pub fn delete_relation(
        &self,
        user_uuid: UserId,
        relation_uuid: RelationId,
    ) -> ServiceResult<()> {
        self.access().relation(user_uuid, relation_uuid)?;
        Ok(self.repos.relations.delete_relation(relation_uuid)?)
    }

    pub fn relations(
        &self,
        user_uuid: UserId,
        board_uuid: BoardId,
    ) -> ServiceResult<Vec<Relation>> {
        self.access().board(user_uuid, board_uuid)?;
        Ok(self.repos.relations.list_relations_of_board(board_uuid)?)
    }
}
