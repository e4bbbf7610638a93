//! Relation repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Ordering group is `(board_uuid, relation_type)`; vertical and
//!   horizontal relations of a board are numbered independently.
//! - Changing `relation_type` is a cross-group move.

use super::list_repo::ensure_active_board;
use super::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use crate::model::board::BoardId;
use crate::model::relation::{NewRelation, Relation, RelationId, RelationType};
use crate::ordering::{
    place_new, release, relocate, target_placement, GroupScope, OrderingChecks, Placement,
    SqlitePositionStore,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const RELATION_SELECT_SQL: &str = "SELECT
    uuid,
    board_uuid,
    name,
    relation_type,
    position,
    created_at,
    updated_at
FROM relations";

/// Repository interface for board relations.
pub trait RelationRepository {
    /// Creates a relation; `position: None` appends to its type group.
    fn create_relation(&self, draft: &NewRelation, checks: OrderingChecks)
        -> RepoResult<Relation>;
    /// Persists name, type and position of an existing relation.
    fn update_relation(&self, relation: &Relation, checks: OrderingChecks)
        -> RepoResult<Relation>;
    /// Like `update_relation`, but `position: None` keeps the slot when the
    /// type is unchanged and appends when it changes.
    fn save_relation(
        &self,
        relation: &Relation,
        position: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Relation>;
    fn delete_relation(&self, id: RelationId) -> RepoResult<()>;
    fn get_relation(&self, id: RelationId) -> RepoResult<Option<Relation>>;
    /// Live relations of one board, vertical first, each group by position.
    fn list_relations_of_board(&self, board_uuid: BoardId) -> RepoResult<Vec<Relation>>;
}

/// SQLite-backed relation repository.
pub struct SqliteRelationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRelationRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RelationRepository for SqliteRelationRepository<'_> {
    fn create_relation(
        &self,
        draft: &NewRelation,
        checks: OrderingChecks,
    ) -> RepoResult<Relation> {
        let mut relation = Relation {
            uuid: Uuid::new_v4(),
            board_uuid: draft.board_uuid,
            name: draft.name.trim().to_string(),
            relation_type: draft.relation_type,
            position: 0,
            created_at: 0,
            updated_at: 0,
        };
        relation.validate_fields()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_active_board(&tx, draft.board_uuid)?;

        let store = SqlitePositionStore::new(&tx);
        let scope = GroupScope::relations_of(draft.board_uuid, draft.relation_type);
        relation.position = place_new(&store, &scope, draft.position, checks)?;
        relation.validate()?;

        tx.execute(
            "INSERT INTO relations (uuid, board_uuid, name, relation_type, position, is_deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                relation.uuid.to_string(),
                relation.board_uuid.to_string(),
                relation.name.as_str(),
                relation.relation_type.as_str(),
                relation.position,
            ],
        )?;
        tx.commit()?;

        info!(
            "event=relation_create module=repo status=ok type={} position={}",
            relation.relation_type.as_str(),
            relation.position
        );
        load_required_relation(self.conn, relation.uuid)
    }

    fn update_relation(
        &self,
        relation: &Relation,
        checks: OrderingChecks,
    ) -> RepoResult<Relation> {
        self.save_relation(relation, Some(relation.position), checks)
    }

    fn save_relation(
        &self,
        relation: &Relation,
        position: Option<i64>,
        checks: OrderingChecks,
    ) -> RepoResult<Relation> {
        relation.validate_fields()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_required_relation(&tx, relation.uuid)?;
        let store = SqlitePositionStore::new(&tx);
        let before = Placement::new(
            GroupScope::relations_of(current.board_uuid, current.relation_type),
            current.position,
        );
        let after = target_placement(
            &store,
            &before,
            GroupScope::relations_of(current.board_uuid, relation.relation_type),
            position,
        )?;
        relocate(&store, relation.uuid, &before, &after, checks)?;
        let stored = Relation {
            position: after.position,
            board_uuid: current.board_uuid,
            ..relation.clone()
        };
        stored.validate()?;

        tx.execute(
            "UPDATE relations
             SET name = ?2,
                 relation_type = ?3,
                 position = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                stored.uuid.to_string(),
                stored.name.trim(),
                stored.relation_type.as_str(),
                stored.position,
            ],
        )?;
        tx.commit()?;

        load_required_relation(self.conn, stored.uuid)
    }

    fn delete_relation(&self, id: RelationId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_required_relation(&tx, id)?;

        tx.execute(
            "UPDATE relations
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        let store = SqlitePositionStore::new(&tx);
        let placement = Placement::new(
            GroupScope::relations_of(current.board_uuid, current.relation_type),
            current.position,
        );
        release(&store, id, &placement, OrderingChecks::Enforce)?;
        tx.commit()?;

        info!(
            "event=relation_delete module=repo status=ok type={} position={}",
            current.relation_type.as_str(),
            current.position
        );
        Ok(())
    }

    fn get_relation(&self, id: RelationId) -> RepoResult<Option<Relation>> {
        load_relation(self.conn, id)
    }

    fn list_relations_of_board(&self, board_uuid: BoardId) -> RepoResult<Vec<Relation>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RELATION_SELECT_SQL}
             WHERE board_uuid = ?1
               AND is_deleted = 0
             ORDER BY CASE relation_type WHEN 'vertical' THEN 0 ELSE 1 END,
                      position ASC,
                      uuid ASC;"
        ))?;
        let mut rows = stmt.query([board_uuid.to_string()])?;
        let mut relations = Vec::new();
        while let Some(row) = rows.next()? {
            relations.push(parse_relation_row(row)?);
        }
        Ok(relations)
    }
}

fn load_required_relation(conn: &Connection, id: RelationId) -> RepoResult<Relation> {
    load_relation(conn, id)?.ok_or(RepoError::NotFound {
        entity: "relation",
        id,
    })
}

fn load_relation(conn: &Connection, id: RelationId) -> RepoResult<Option<Relation>> {
    let relation = conn
        .query_row(
            &format!("{RELATION_SELECT_SQL} WHERE uuid = ?1 AND is_deleted = 0;"),
            [id.to_string()],
            |row| Ok(parse_relation_row(row)),
        )
        .optional()?;
    relation.transpose()
}

fn parse_relation_row(row: &Row<'_>) -> RepoResult<Relation> {
    let uuid_text: String = row.get("uuid")?;
    let board_text: String = row.get("board_uuid")?;
    let type_text: String = row.get("relation_type")?;
    let relation_type = RelationType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid relation type `{type_text}` in relations.relation_type"
        ))
    })?;
    Ok(Relation {
        uuid: parse_uuid(&uuid_text, "relations.uuid")?,
        board_uuid: parse_uuid(&board_text, "relations.board_uuid")?,
        name: row.get("name")?,
        relation_type,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
