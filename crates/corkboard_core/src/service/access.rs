//! Permission checks for boards, teams and everything positioned under a
//! board.
//!
//! A user may use a board when they own it or belong to the board's team.
//! Lists, tasks, relations and items resolve to their board.

use super::{Repositories, ServiceError, ServiceResult};
use crate::model::board::{Board, BoardId};
use crate::model::item::{Item, ItemId};
use crate::model::list::{List, ListId};
use crate::model::relation::{Relation, RelationId};
use crate::model::task::{Task, TaskId};
use crate::model::team::{Team, TeamId};
use crate::model::user::UserId;
use crate::repo::board_repo::BoardRepository;
use crate::repo::item_repo::ItemRepository;
use crate::repo::list_repo::ListRepository;
use crate::repo::relation_repo::RelationRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::team_repo::TeamRepository;
use log::warn;

pub struct AccessService<'r, 'conn> {
    repos: &'r Repositories<'conn>,
}

impl<'r, 'conn> AccessService<'r, 'conn> {
    pub fn new(repos: &'r Repositories<'conn>) -> Self {
        Self { repos }
    }

    /// Returns the board when `user_uuid` may use it.
    pub fn board(&self, user_uuid: UserId, board_uuid: BoardId) -> ServiceResult<Board> {
        let board = self
            .repos
            .boards
            .get_board(board_uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "board",
                id: board_uuid,
            })?;
        if board.owner_uuid == user_uuid {
            return Ok(board);
        }
        if let Some(team_uuid) = board.team_uuid {
            let shared = self
                .repos
                .teams
                .get_team(team_uuid)?
                .map(|team| team.is_member(user_uuid))
                .unwrap_or(false);
            if shared {
                return Ok(board);
            }
        }

        warn!("event=access_denied module=service entity=board");
        Err(ServiceError::Unauthorized {
            user_uuid,
            entity: "board",
            id: board_uuid,
        })
    }

    /// Board operations that change ownership or sharing are owner-only.
    pub fn owned_board(&self, user_uuid: UserId, board_uuid: BoardId) -> ServiceResult<Board> {
        let board = self.board(user_uuid, board_uuid)?;
        if board.owner_uuid != user_uuid {
            warn!("event=access_denied module=service entity=board reason=not_owner");
            return Err(ServiceError::Unauthorized {
                user_uuid,
                entity: "board",
                id: board_uuid,
            });
        }
        Ok(board)
    }

    pub fn list(&self, user_uuid: UserId, list_uuid: ListId) -> ServiceResult<List> {
        let list = self
            .repos
            .lists
            .get_list(list_uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "list",
                id: list_uuid,
            })?;
        self.board(user_uuid, list.board_uuid)?;
        Ok(list)
    }

    pub fn task(&self, user_uuid: UserId, task_uuid: TaskId) -> ServiceResult<Task> {
        let task = self
            .repos
            .tasks
            .get_task(task_uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "task",
                id: task_uuid,
            })?;
        self.board(user_uuid, task.board_uuid)?;
        Ok(task)
    }

    pub fn relation(
        &self,
        user_uuid: UserId,
        relation_uuid: RelationId,
    ) -> ServiceResult<Relation> {
        let relation = self
            .repos
            .relations
            .get_relation(relation_uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "relation",
                id: relation_uuid,
            })?;
        self.board(user_uuid, relation.board_uuid)?;
        Ok(relation)
    }

    pub fn item(&self, user_uuid: UserId, item_uuid: ItemId) -> ServiceResult<Item> {
        let item = self
            .repos
            .items
            .get_item(item_uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "item",
                id: item_uuid,
            })?;
        self.board(user_uuid, item.board_uuid)?;
        Ok(item)
    }

    /// Returns the team when `user_uuid` is one of its members.
    pub fn team(&self, user_uuid: UserId, team_uuid: TeamId) -> ServiceResult<Team> {
        let team = self
            .repos
            .teams
            .get_team(team_uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "team",
                id: team_uuid,
            })?;
        if !team.is_member(user_uuid) {
            warn!("event=access_denied module=service entity=team");
            return Err(ServiceError::Unauthorized {
                user_uuid,
                entity: "team",
                id: team_uuid,
            });
        }
        Ok(team)
    }
}
