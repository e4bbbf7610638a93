//! Board repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Only active boards are returned.
//! - A user's visible boards are the ones they own plus the boards of every
//!   team they belong to.

use super::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use crate::model::board::{Board, BoardId};
use crate::model::user::UserId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const BOARD_SELECT_SQL: &str = "SELECT
    uuid,
    owner_uuid,
    team_uuid,
    name,
    created_at,
    updated_at
FROM boards";

/// Repository interface for boards.
pub trait BoardRepository {
    fn create_board(&self, board: &Board) -> RepoResult<Board>;
    /// Persists name and team assignment.
    fn update_board(&self, board: &Board) -> RepoResult<Board>;
    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>>;
    /// Boards owned by the user or shared through one of their teams.
    fn list_boards_for_user(&self, user_uuid: UserId) -> RepoResult<Vec<Board>>;
    fn soft_delete_board(&self, id: BoardId) -> RepoResult<()>;
}

/// SQLite-backed board repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn load_required(&self, id: BoardId) -> RepoResult<Board> {
        self.get_board(id)?
            .ok_or(RepoError::NotFound { entity: "board", id })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn create_board(&self, board: &Board) -> RepoResult<Board> {
        board.validate()?;

        self.conn.execute(
            "INSERT INTO boards (uuid, owner_uuid, team_uuid, name, is_deleted)
             VALUES (?1, ?2, ?3, ?4, 0);",
            params![
                board.uuid.to_string(),
                board.owner_uuid.to_string(),
                board.team_uuid.map(|value| value.to_string()),
                board.name.trim(),
            ],
        )?;
        self.load_required(board.uuid)
    }

    fn update_board(&self, board: &Board) -> RepoResult<Board> {
        board.validate()?;

        let changed = self.conn.execute(
            "UPDATE boards
             SET name = ?2,
                 team_uuid = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                board.uuid.to_string(),
                board.name.trim(),
                board.team_uuid.map(|value| value.to_string()),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "board",
                id: board.uuid,
            });
        }
        self.load_required(board.uuid)
    }

    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>> {
        let board = self
            .conn
            .query_row(
                &format!("{BOARD_SELECT_SQL} WHERE uuid = ?1 AND is_deleted = 0;"),
                [id.to_string()],
                |row| Ok(parse_board_row(row)),
            )
            .optional()?;
        board.transpose()
    }

    fn list_boards_for_user(&self, user_uuid: UserId) -> RepoResult<Vec<Board>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BOARD_SELECT_SQL}
             WHERE is_deleted = 0
               AND (
                 owner_uuid = ?1
                 OR team_uuid IN (
                   SELECT team_uuid FROM team_members WHERE user_uuid = ?1
                 )
               )
             ORDER BY created_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([user_uuid.to_string()])?;
        let mut boards = Vec::new();
        while let Some(row) = rows.next()? {
            boards.push(parse_board_row(row)?);
        }
        Ok(boards)
    }

    fn soft_delete_board(&self, id: BoardId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE boards
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "board", id });
        }
        Ok(())
    }
}

fn parse_board_row(row: &Row<'_>) -> RepoResult<Board> {
    let uuid_text: String = row.get("uuid")?;
    let owner_text: String = row.get("owner_uuid")?;
    let team_uuid = row
        .get::<_, Option<String>>("team_uuid")?
        .map(|value| parse_uuid(&value, "boards.team_uuid"))
        .transpose()?;

    Ok(Board {
        uuid: parse_uuid(&uuid_text, "boards.uuid")?,
        owner_uuid: parse_uuid(&owner_text, "boards.owner_uuid")?,
        team_uuid,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
