//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist board items and keep their positions dense per list.
//! - Carry out in-list and cross-list moves with explicit before/after
//!   placements.
//!
//! # Invariants
//! - Items only move between lists of their own board.
//! - Validate, old-list gap close, new-list slot open and the row write
//!   commit together or not at all.

use super::list_repo::load_required_list;
use super::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use crate::model::board::BoardId;
use crate::model::item::{Item, ItemId, NewItem};
use crate::model::list::ListId;
use crate::ordering::{
    place_new, release, relocate, target_placement, GroupScope, OrderingChecks, Placement,
    Relocation, SqlitePositionStore,
};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    board_uuid,
    list_uuid,
    name,
    description,
    position,
    created_at,
    updated_at
FROM items";

/// Repository interface for board items.
pub trait ItemRepository {
    /// Creates an item at the requested position (append when `None`).
    fn create_item(&self, draft: &NewItem, checks: OrderingChecks) -> RepoResult<Item>;
    /// Persists name, description, list and position of an existing item.
    fn update_item(&self, item: &Item, checks: OrderingChecks) -> RepoResult<Item>;
    /// Like `update_item`, but `position: None` keeps the slot in the same
    /// list and appends when the list changes.
    fn save_item(
        &self,
        item: &Item,
        position: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Item>;
    /// Moves an item to `list_uuid`; `None` keeps the slot in the same list
    /// and appends in another list.
    fn move_item(
        &self,
        id: ItemId,
        list_uuid: ListId,
        position: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Item>;
    /// Soft-deletes the item and closes the gap in its list.
    fn delete_item(&self, id: ItemId) -> RepoResult<()>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    fn list_items_of_list(&self, list_uuid: ListId) -> RepoResult<Vec<Item>>;
    /// All live items of a board, grouped by list then position.
    fn list_items_of_board(&self, board_uuid: BoardId) -> RepoResult<Vec<Item>>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn write(
        &self,
        next: &Item,
        requested: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Item> {
        next.validate_fields()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_required_item(&tx, next.uuid)?;
        if next.list_uuid != current.list_uuid {
            let target = load_required_list(&tx, next.list_uuid)?;
            if target.board_uuid != current.board_uuid {
                return Err(RepoError::Conflict(format!(
                    "item {} cannot move to list {} of another board",
                    current.uuid, target.uuid
                )));
            }
        }

        let store = SqlitePositionStore::new(&tx);
        let before = Placement::new(GroupScope::items_of(current.list_uuid), current.position);
        let after = target_placement(
            &store,
            &before,
            GroupScope::items_of(next.list_uuid),
            requested,
        )?;
        let outcome = relocate(&store, next.uuid, &before, &after, checks)?;

        let stored = Item {
            position: after.position,
            board_uuid: current.board_uuid,
            ..next.clone()
        };
        stored.validate()?;
        tx.execute(
            "UPDATE items
             SET list_uuid = ?2,
                 name = ?3,
                 description = ?4,
                 position = ?5,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                stored.uuid.to_string(),
                stored.list_uuid.to_string(),
                stored.name.trim(),
                stored.description.as_deref(),
                stored.position,
            ],
        )?;
        tx.commit()?;

        log_relocation(outcome, &before, &after);
        load_required_item(self.conn, stored.uuid)
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, draft: &NewItem, checks: OrderingChecks) -> RepoResult<Item> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let list = load_required_list(&tx, draft.list_uuid)?;

        let mut item = Item {
            uuid: Uuid::new_v4(),
            board_uuid: list.board_uuid,
            list_uuid: list.uuid,
            name: draft.name.trim().to_string(),
            description: draft.description.clone(),
            position: 0,
            created_at: 0,
            updated_at: 0,
        };
        item.validate_fields()?;

        let store = SqlitePositionStore::new(&tx);
        let scope = GroupScope::items_of(list.uuid);
        item.position = place_new(&store, &scope, draft.position, checks)?;
        item.validate()?;

        tx.execute(
            "INSERT INTO items (uuid, board_uuid, list_uuid, name, description, position, is_deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0);",
            params![
                item.uuid.to_string(),
                item.board_uuid.to_string(),
                item.list_uuid.to_string(),
                item.name.as_str(),
                item.description.as_deref(),
                item.position,
            ],
        )?;
        tx.commit()?;

        info!(
            "event=item_create module=repo status=ok position={}",
            item.position
        );
        load_required_item(self.conn, item.uuid)
    }

    fn update_item(&self, item: &Item, checks: OrderingChecks) -> RepoResult<Item> {
        self.write(item, Some(item.position), checks)
    }

    fn save_item(
        &self,
        item: &Item,
        position: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Item> {
        self.write(item, position, checks)
    }

    fn move_item(
        &self,
        id: ItemId,
        list_uuid: ListId,
        position: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Item> {
        let mut next = load_required_item(self.conn, id)?;
        next.list_uuid = list_uuid;
        self.write(&next, position, checks)
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_required_item(&tx, id)?;

        tx.execute(
            "UPDATE items
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        let store = SqlitePositionStore::new(&tx);
        let placement = Placement::new(GroupScope::items_of(current.list_uuid), current.position);
        let closed = release(&store, id, &placement, OrderingChecks::Enforce)?;
        tx.commit()?;

        info!(
            "event=item_delete module=repo status=ok position={} shifted={}",
            current.position, closed
        );
        Ok(())
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        load_item(self.conn, id)
    }

    fn list_items_of_list(&self, list_uuid: ListId) -> RepoResult<Vec<Item>> {
        query_items(
            self.conn,
            &format!(
                "{ITEM_SELECT_SQL}
                 WHERE list_uuid = ?1
                   AND is_deleted = 0
                 ORDER BY position ASC, uuid ASC;"
            ),
            list_uuid,
        )
    }

    fn list_items_of_board(&self, board_uuid: BoardId) -> RepoResult<Vec<Item>> {
        query_items(
            self.conn,
            &format!(
                "{ITEM_SELECT_SQL}
                 WHERE board_uuid = ?1
                   AND is_deleted = 0
                 ORDER BY list_uuid ASC, position ASC, uuid ASC;"
            ),
            board_uuid,
        )
    }
}

fn log_relocation(outcome: Relocation, before: &Placement, after: &Placement) {
    match outcome {
        Relocation::Unchanged => {}
        Relocation::WithinGroup { shifted } => debug!(
            "event=item_move module=repo status=ok kind=within_list from={} to={} shifted={}",
            before.position, after.position, shifted
        ),
        Relocation::AcrossGroups { closed, opened } => info!(
            "event=item_move module=repo status=ok kind=across_lists from={} to={} closed={} opened={}",
            before.position, after.position, closed, opened
        ),
    }
}

fn query_items(conn: &Connection, sql: &str, key: Uuid) -> RepoResult<Vec<Item>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([key.to_string()])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_item_row(row)?);
    }
    Ok(items)
}

fn load_required_item(conn: &Connection, id: ItemId) -> RepoResult<Item> {
    load_item(conn, id)?.ok_or(RepoError::NotFound { entity: "item", id })
}

fn load_item(conn: &Connection, id: ItemId) -> RepoResult<Option<Item>> {
    let item = conn
        .query_row(
            &format!("{ITEM_SELECT_SQL} WHERE uuid = ?1 AND is_deleted = 0;"),
            [id.to_string()],
            |row| Ok(parse_item_row(row)),
        )
        .optional()?;
    item.transpose()
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let uuid_text: String = row.get("uuid")?;
    let board_text: String = row.get("board_uuid")?;
    let list_text: String = row.get("list_uuid")?;
    Ok(Item {
        uuid: parse_uuid(&uuid_text, "items.uuid")?,
        board_uuid: parse_uuid(&board_text, "items.board_uuid")?,
        list_uuid: parse_uuid(&list_text, "items.list_uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
