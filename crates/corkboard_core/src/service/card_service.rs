//! Card use-case service: tasks and items.
//!
//! # Invariants
//! - A card moves only between lists of its own board, and the caller must
//!   be allowed to use the target list.
//! - A list change without a position appends the card to the target list.

use super::access::AccessService;
use super::{normalize_name, Repositories, ServiceError, ServiceResult};
use crate::model::item::{Item, ItemId, NewItem};
use crate::model::list::ListId;
use crate::model::task::{NewTask, Task, TaskId};
use crate::model::user::UserId;
use crate::ordering::OrderingChecks;
use crate::repo::item_repo::ItemRepository;
use crate::repo::task_repo::TaskRepository;
use rusqlite::Connection;
use uuid::Uuid;

/// Partial task update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub list_uuid: Option<ListId>,
    pub position: Option<i64>,
}

/// Partial item update. `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub list_uuid: Option<ListId>,
    pub position: Option<i64>,
}

pub struct CardService<'conn> {
    repos: Repositories<'conn>,
}

impl<'conn> CardService<'conn> {
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self {
            repos: Repositories::try_new(conn)?,
        })
    }

    fn access(&self) -> AccessService<'_, 'conn> {
        AccessService::new(&self.repos)
    }

    /// Resolves the list a card should end up in, checking access and board.
    fn target_list(
        &self,
        user_uuid: UserId,
        card_board: Uuid,
        current: ListId,
        requested: Option<ListId>,
    ) -> ServiceResult<ListId> {
        let Some(list_uuid) = requested.filter(|list_uuid| *list_uuid != current) else {
            return Ok(current);
        };
        let list = self.access().list(user_uuid, list_uuid)?;
        if list.board_uuid != card_board {
            return Err(ServiceError::InvalidInput(format!(
                "list {list_uuid} belongs to another board"
            )));
        }
        Ok(list.uuid)
    }

    pub fn create_task(
        &self,
        user_uuid: UserId,
        list_uuid: ListId,
        name: &str,
        position: Option<i64>,
    ) -> ServiceResult<Task> {
        self.access().list(user_uuid, list_uuid)?;
        let draft = NewTask {
            list_uuid,
            name: normalize_name("task", name)?,
            position,
        };
        Ok(self.repos.tasks.create_task(&draft, OrderingChecks::Enforce)?)
    }

    pub fn get_task(&self, user_uuid: UserId, task_uuid: TaskId) -> ServiceResult<Task> {
        self.access().task(user_uuid, task_uuid)
    }

    pub fn update_task(
        &self,
        user_uuid: UserId,
        task_uuid: TaskId,
        patch: TaskPatch,
    ) -> ServiceResult<Task> {
        let mut task = self.access().task(user_uuid, task_uuid)?;
        if let Some(name) = patch.name {
            task.name = normalize_name("task", &name)?;
        }
        task.list_uuid =
            self.target_list(user_uuid, task.board_uuid, task.list_uuid, patch.list_uuid)?;
        Ok(self
            .repos
            .tasks
            .save_task(&task, patch.position, OrderingChecks::Enforce)?)
    }

    /// Moves a task within its list or to another list of the same board.
    pub fn move_task(
        &self,
        user_uuid: UserId,
        task_uuid: TaskId,
        list_uuid: ListId,
        position: Option<i64>,
    ) -> ServiceResult<Task> {
        self.update_task(
            user_uuid,
            task_uuid,
            TaskPatch {
                list_uuid: Some(list_uuid),
                position,
                ..TaskPatch::default()
            },
        )
    }

    pub fn delete_task(&self, user_uuid: UserId, task_uuid: TaskId) -> ServiceResult<()> {
        self.access().task(user_uuid, task_uuid)?;
        Ok(self.repos.tasks.delete_task(task_uuid)?)
    }

    pub fn tasks(&self, user_uuid: UserId, list_uuid: ListId) -> ServiceResult<Vec<Task>> {
        self.access().list(user_uuid, list_uuid)?;
        Ok(self.repos.tasks.list_tasks_of_list(list_uuid)?)
    }

    pub fn create_item(
        &self,
        user_uuid: UserId,
        list_uuid: ListId,
        name: &str,
        description: Option<&str>,
        position: Option<i64>,
    ) -> ServiceResult<Item> {
        self.access().list(user_uuid, list_uuid)?;
        let draft = NewItem {
            list_uuid,
            name: normalize_name("item", name)?,
            description: description.map(str::to_string),
            position,
        };
        Ok(self.repos.items.create_item(&draft, OrderingChecks::Enforce)?)
    }

    pub fn get_item(&self, user_uuid: UserId, item_uuid: ItemId) -> ServiceResult<Item> {
        self.access().item(user_uuid, item_uuid)
    }

    pub fn update_item(
        &self,
        user_uuid: UserId,
        item_uuid: ItemId,
        patch: ItemPatch,
    ) -> ServiceResult<Item> {
        let mut item = self.access().item(user_uuid, item_uuid)?;
        if let Some(name) = patch.name {
            item.name = normalize_name("item", &name)?;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        item.list_uuid =
            self.target_list(user_uuid, item.board_uuid, item.list_uuid, patch.list_uuid)?;
        Ok(self
            .repos
            .items
            .save_item(&item, patch.position, OrderingChecks::Enforce)?)
    }

    /// Moves an item within its list or to another list of the same board.
    pub fn move_item(
        &self,
        user_uuid: UserId,
        item_uuid: ItemId,
        list_uuid: ListId,
        position: Option<i64>,
    ) -> ServiceResult<Item> {
        self.update_item(
            user_uuid,
            item_uuid,
            ItemPatch {
                list_uuid: Some(list_uuid),
                position,
                ..ItemPatch::default()
            },
        )
    }

    pub fn delete_item(&self, user_uuid: UserId, item_uuid: ItemId) -> ServiceResult<()> {
        self.access().item(user_uuid, item_uuid)?;
        Ok(self.repos.items.delete_item(item_uuid)?)
    }

    pub fn items(&self, user_uuid: UserId, list_uuid: ListId) -> ServiceResult<Vec<Item>> {
        self.access().list(user_uuid, list_uuid)?;
        Ok(self.repos.items.list_items_of_list(list_uuid)?)
    }
}
