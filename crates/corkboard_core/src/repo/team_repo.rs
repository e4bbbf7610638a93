//! Team repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Team writes call `Team::validate()` (single owner, unique members)
//!   before SQL mutation.
//! - Membership rows are replaced as a whole inside one transaction.

use super::{
    bool_to_int, ensure_schema_ready, parse_flag, parse_uuid, RepoError, RepoResult,
};
use crate::model::team::{Team, TeamId, TeamMember};
use crate::model::user::UserId;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Repository interface for teams and their members.
pub trait TeamRepository {
    fn create_team(&self, team: &Team) -> RepoResult<Team>;
    /// Persists name and full member list.
    fn update_team(&self, team: &Team) -> RepoResult<Team>;
    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>>;
    /// Teams where the user is the owner, newest first.
    fn list_teams_owned_by(&self, user_uuid: UserId) -> RepoResult<Vec<Team>>;
    /// Ids of every team the user belongs to.
    fn team_ids_of_member(&self, user_uuid: UserId) -> RepoResult<Vec<TeamId>>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeamRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TeamRepository for SqliteTeamRepository<'_> {
    fn create_team(&self, team: &Team) -> RepoResult<Team> {
        team.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO teams (uuid, name) VALUES (?1, ?2);",
            params![team.uuid.to_string(), team.name.trim()],
        )?;
        insert_members(&tx, team)?;
        tx.commit()?;

        load_required_team(self.conn, team.uuid)
    }

    fn update_team(&self, team: &Team) -> RepoResult<Team> {
        team.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE teams
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![team.uuid.to_string(), team.name.trim()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "team",
                id: team.uuid,
            });
        }
        tx.execute(
            "DELETE FROM team_members WHERE team_uuid = ?1;",
            [team.uuid.to_string()],
        )?;
        insert_members(&tx, team)?;
        tx.commit()?;

        load_required_team(self.conn, team.uuid)
    }

    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>> {
        load_team(self.conn, id)
    }

    fn list_teams_owned_by(&self, user_uuid: UserId) -> RepoResult<Vec<Team>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.uuid
             FROM teams t
             INNER JOIN team_members m ON m.team_uuid = t.uuid
             WHERE m.user_uuid = ?1
               AND m.is_owner = 1
             ORDER BY t.created_at DESC, t.uuid ASC;",
        )?;
        let mut rows = stmt.query([user_uuid.to_string()])?;
        let mut teams = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            let team_uuid = parse_uuid(&value, "teams.uuid")?;
            teams.push(load_required_team(self.conn, team_uuid)?);
        }
        Ok(teams)
    }

    fn team_ids_of_member(&self, user_uuid: UserId) -> RepoResult<Vec<TeamId>> {
        let mut stmt = self.conn.prepare(
            "SELECT team_uuid
             FROM team_members
             WHERE user_uuid = ?1
             ORDER BY team_uuid ASC;",
        )?;
        let mut rows = stmt.query([user_uuid.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "team_members.team_uuid")?);
        }
        Ok(ids)
    }
}

fn insert_members(conn: &Connection, team: &Team) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO team_members (team_uuid, user_uuid, initials, is_owner, member_order)
         VALUES (?1, ?2, ?3, ?4, ?5);",
    )?;
    for (index, member) in team.members.iter().enumerate() {
        stmt.execute(params![
            team.uuid.to_string(),
            member.user_uuid.to_string(),
            member.initials.as_str(),
            bool_to_int(member.is_owner),
            index as i64,
        ])?;
    }
    Ok(())
}

fn load_required_team(conn: &Connection, id: TeamId) -> RepoResult<Team> {
    load_team(conn, id)?.ok_or(RepoError::NotFound { entity: "team", id })
}

fn load_team(conn: &Connection, id: TeamId) -> RepoResult<Option<Team>> {
    let header: Option<(String, i64)> = conn
        .query_row(
            "SELECT name, created_at FROM teams WHERE uuid = ?1;",
            [id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((name, created_at)) = header else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT user_uuid, initials, is_owner
         FROM team_members
         WHERE team_uuid = ?1
         ORDER BY member_order ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        let user_text: String = row.get(0)?;
        members.push(TeamMember {
            user_uuid: parse_uuid(&user_text, "team_members.user_uuid")?,
            initials: row.get(1)?,
            is_owner: parse_flag(row.get(2)?, "team_members.is_owner")?,
        });
    }

    Ok(Some(Team {
        uuid: id,
        name,
        members,
        created_at,
    }))
}
