//! List repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist board lists and keep their positions dense per board.
//! - Cascade soft deletes from a list to its tasks and items.
//!
//! # Invariants
//! - Lists never change board; a position change is an in-group move.
//! - Child listing is deterministic: `position ASC, uuid ASC`.

use super::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use crate::model::board::BoardId;
use crate::model::list::{List, ListId, NewList};
use crate::ordering::{
    place_new, release, relocate, target_placement, GroupScope, OrderingChecks, Placement,
    SqlitePositionStore,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const LIST_SELECT_SQL: &str = "SELECT
    uuid,
    board_uuid,
    name,
    position,
    created_at,
    updated_at
FROM lists";

/// Repository interface for board lists.
pub trait ListRepository {
    /// Creates a list at the requested position (append when `None`).
    fn create_list(&self, draft: &NewList, checks: OrderingChecks) -> RepoResult<List>;
    /// Persists name and position of an existing list.
    fn update_list(&self, list: &List, checks: OrderingChecks) -> RepoResult<List>;
    /// Soft-deletes the list (and its tasks/items) and closes the gap.
    fn delete_list(&self, id: ListId) -> RepoResult<()>;
    fn get_list(&self, id: ListId) -> RepoResult<Option<List>>;
    fn list_lists_of_board(&self, board_uuid: BoardId) -> RepoResult<Vec<List>>;
}

/// SQLite-backed list repository.
pub struct SqliteListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteListRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ListRepository for SqliteListRepository<'_> {
    fn create_list(&self, draft: &NewList, checks: OrderingChecks) -> RepoResult<List> {
        let mut list = List {
            uuid: Uuid::new_v4(),
            board_uuid: draft.board_uuid,
            name: draft.name.trim().to_string(),
            position: draft.position.unwrap_or(0),
            created_at: 0,
            updated_at: 0,
        };
        list.validate_fields()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_active_board(&tx, draft.board_uuid)?;

        let store = SqlitePositionStore::new(&tx);
        let scope = GroupScope::lists_of(draft.board_uuid);
        list.position = place_new(&store, &scope, draft.position, checks)?;
        list.validate()?;

        tx.execute(
            "INSERT INTO lists (uuid, board_uuid, name, position, is_deleted)
             VALUES (?1, ?2, ?3, ?4, 0);",
            params![
                list.uuid.to_string(),
                list.board_uuid.to_string(),
                list.name.as_str(),
                list.position,
            ],
        )?;
        tx.commit()?;

        info!(
            "event=list_create module=repo status=ok position={}",
            list.position
        );
        load_required_list(self.conn, list.uuid)
    }

    fn update_list(&self, list: &List, checks: OrderingChecks) -> RepoResult<List> {
        list.validate_fields()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_required_list(&tx, list.uuid)?;
        let before = Placement::new(GroupScope::lists_of(current.board_uuid), current.position);
        let store = SqlitePositionStore::new(&tx);
        let after = target_placement(
            &store,
            &before,
            GroupScope::lists_of(current.board_uuid),
            Some(list.position),
        )?;
        relocate(&store, list.uuid, &before, &after, checks)?;
        list.validate()?;

        tx.execute(
            "UPDATE lists
             SET name = ?2,
                 position = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![list.uuid.to_string(), list.name.trim(), after.position],
        )?;
        tx.commit()?;

        load_required_list(self.conn, list.uuid)
    }

    fn delete_list(&self, id: ListId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_required_list(&tx, id)?;

        tx.execute(
            "UPDATE lists
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        for table in ["tasks", "items"] {
            tx.execute(
                &format!(
                    "UPDATE {table}
                     SET is_deleted = 1,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE list_uuid = ?1
                       AND is_deleted = 0;"
                ),
                [id.to_string()],
            )?;
        }

        let store = SqlitePositionStore::new(&tx);
        let placement = Placement::new(GroupScope::lists_of(current.board_uuid), current.position);
        release(&store, id, &placement, OrderingChecks::Enforce)?;
        tx.commit()?;

        info!(
            "event=list_delete module=repo status=ok position={}",
            current.position
        );
        Ok(())
    }

    fn get_list(&self, id: ListId) -> RepoResult<Option<List>> {
        load_list(self.conn, id)
    }

    fn list_lists_of_board(&self, board_uuid: BoardId) -> RepoResult<Vec<List>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL}
             WHERE board_uuid = ?1
               AND is_deleted = 0
             ORDER BY position ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([board_uuid.to_string()])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(row)?);
        }
        Ok(lists)
    }
}

pub(crate) fn ensure_active_board(conn: &Connection, board_uuid: BoardId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM boards WHERE uuid = ?1 AND is_deleted = 0);",
        [board_uuid.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::NotFound {
            entity: "board",
            id: board_uuid,
        })
    }
}

pub(crate) fn load_required_list(conn: &Connection, id: ListId) -> RepoResult<List> {
    load_list(conn, id)?.ok_or(RepoError::NotFound { entity: "list", id })
}

fn load_list(conn: &Connection, id: ListId) -> RepoResult<Option<List>> {
    let list = conn
        .query_row(
            &format!("{LIST_SELECT_SQL} WHERE uuid = ?1 AND is_deleted = 0;"),
            [id.to_string()],
            |row| Ok(parse_list_row(row)),
        )
        .optional()?;
    list.transpose()
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<List> {
    let uuid_text: String = row.get("uuid")?;
    let board_text: String = row.get("board_uuid")?;
    Ok(List {
        uuid: parse_uuid(&uuid_text, "lists.uuid")?,
        board_uuid: parse_uuid(&board_text, "lists.board_uuid")?,
        name: row.get("name")?,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
