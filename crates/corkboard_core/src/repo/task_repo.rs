//! Task repository contracts and SQLite implementation.
//!
//! Tasks follow the same per-list ordering rules as items; see
//! [`super::item_repo`] for the move semantics.

use super::list_repo::load_required_list;
use super::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use crate::model::board::BoardId;
use crate::model::list::ListId;
use crate::model::task::{NewTask, Task, TaskId};
use crate::ordering::{
    place_new, release, relocate, target_placement, GroupScope, OrderingChecks, Placement,
    Relocation, SqlitePositionStore,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    board_uuid,
    list_uuid,
    name,
    position,
    created_at,
    updated_at
FROM tasks";

pub trait TaskRepository {
    fn create_task(&self, draft: &NewTask, checks: OrderingChecks) -> RepoResult<Task>;
    /// Persists name, list and position of an existing task.
    fn update_task(&self, task: &Task, checks: OrderingChecks) -> RepoResult<Task>;
    /// Like `update_task`, but `position: None` keeps the slot in the same
    /// list and appends when the list changes.
    fn save_task(
        &self,
        task: &Task,
        position: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Task>;
    fn move_task(
        &self,
        id: TaskId,
        list_uuid: ListId,
        position: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Task>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks_of_list(&self, list_uuid: ListId) -> RepoResult<Vec<Task>>;
    fn list_tasks_of_board(&self, board_uuid: BoardId) -> RepoResult<Vec<Task>>;
}

pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn write(
        &self,
        next: &Task,
        requested: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Task> {
        next.validate_fields()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_required_task(&tx, next.uuid)?;
        if next.list_uuid != current.list_uuid {
            let target = load_required_list(&tx, next.list_uuid)?;
            if target.board_uuid != current.board_uuid {
                return Err(RepoError::Conflict(format!(
                    "task {} cannot move to list {} of another board",
                    current.uuid, target.uuid
                )));
            }
        }

        let store = SqlitePositionStore::new(&tx);
        let before = Placement::new(GroupScope::tasks_of(current.list_uuid), current.position);
        let after = target_placement(
            &store,
            &before,
            GroupScope::tasks_of(next.list_uuid),
            requested,
        )?;
        let outcome = relocate(&store, next.uuid, &before, &after, checks)?;

        let stored = Task {
            position: after.position,
            board_uuid: current.board_uuid,
            ..next.clone()
        };
        stored.validate()?;
        tx.execute(
            "UPDATE tasks
             SET list_uuid = ?2,
                 name = ?3,
                 position = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                stored.uuid.to_string(),
                stored.list_uuid.to_string(),
                stored.name.trim(),
                stored.position,
            ],
        )?;
        tx.commit()?;

        if let Relocation::AcrossGroups { closed, opened } = outcome {
            info!(
                "event=task_move module=repo status=ok kind=across_lists to={} closed={} opened={}",
                after.position, closed, opened
            );
        }
        load_required_task(self.conn, stored.uuid)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, draft: &NewTask, checks: OrderingChecks) -> RepoResult<Task> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let list = load_required_list(&tx, draft.list_uuid)?;

        let mut task = Task {
            uuid: Uuid::new_v4(),
            board_uuid: list.board_uuid,
            list_uuid: list.uuid,
            name: draft.name.trim().to_string(),
            position: 0,
            created_at: 0,
            updated_at: 0,
        };
        task.validate_fields()?;

        let store = SqlitePositionStore::new(&tx);
        let scope = GroupScope::tasks_of(list.uuid);
        task.position = place_new(&store, &scope, draft.position, checks)?;
        task.validate()?;

        tx.execute(
            "INSERT INTO tasks (uuid, board_uuid, list_uuid, name, position, is_deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                task.uuid.to_string(),
                task.board_uuid.to_string(),
                task.list_uuid.to_string(),
                task.name.as_str(),
                task.position,
            ],
        )?;
        tx.commit()?;

        info!(
            "event=task_create module=repo status=ok position={}",
            task.position
        );
        load_required_task(self.conn, task.uuid)
    }

    fn update_task(&self, task: &Task, checks: OrderingChecks) -> RepoResult<Task> {
        self.write(task, Some(task.position), checks)
    }

    fn save_task(
        &self,
        task: &Task,
        position: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Task> {
        self.write(task, position, checks)
    }

    fn move_task(
        &self,
        id: TaskId,
        list_uuid: ListId,
        position: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Task> {
        let mut next = load_required_task(self.conn, id)?;
        next.list_uuid = list_uuid;
        self.write(&next, position, checks)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_required_task(&tx, id)?;

        tx.execute(
            "UPDATE tasks
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        let store = SqlitePositionStore::new(&tx);
        let placement = Placement::new(GroupScope::tasks_of(current.list_uuid), current.position);
        release(&store, id, &placement, OrderingChecks::Enforce)?;
        tx.commit()?;

        info!(
            "event=task_delete module=repo status=ok position={}",
            current.position
        );
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        load_task(self.conn, id)
    }

    fn list_tasks_of_list(&self, list_uuid: ListId) -> RepoResult<Vec<Task>> {
        query_tasks(
            self.conn,
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE list_uuid = ?1
                   AND is_deleted = 0
                 ORDER BY position ASC, uuid ASC;"
            ),
            list_uuid,
        )
    }

    fn list_tasks_of_board(&self, board_uuid: BoardId) -> RepoResult<Vec<Task>> {
        query_tasks(
            self.conn,
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE board_uuid = ?1
                   AND is_deleted = 0
                 ORDER BY list_uuid ASC, position ASC, uuid ASC;"
            ),
            board_uuid,
        )
    }
}

fn query_tasks(conn: &Connection, sql: &str, key: Uuid) -> RepoResult<Vec<Task>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([key.to_string()])?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

fn load_required_task(conn: &Connection, id: TaskId) -> RepoResult<Task> {
    load_task(conn, id)?.ok_or(RepoError::NotFound { entity: "task", id })
}

fn load_task(conn: &Connection, id: TaskId) -> RepoResult<Option<Task>> {
    let task = conn
        .query_row(
            &format!("{TASK_SELECT_SQL} WHERE uuid = ?1 AND is_deleted = 0;"),
            [id.to_string()],
            |row| Ok(parse_task_row(row)),
        )
        .optional()?;
    task.transpose()
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let board_text: String = row.get("board_uuid")?;
    let list_text: String = row.get("list_uuid")?;
    Ok(Task {
        uuid: parse_uuid(&uuid_text, "tasks.uuid")?,
        board_uuid: parse_uuid(&board_text, "tasks.board_uuid")?,
        list_uuid: parse_uuid(&list_text, "tasks.list_uuid")?,
        name: row.get("name")?,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
