//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Email and username lookups are case-insensitive (stored lowercase).
//! - Duplicate email/username surfaces as `RepoError::Conflict`.

use super::{ensure_schema_ready, map_constraint, parse_uuid, RepoError, RepoResult};
use crate::model::user::{User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    username,
    email,
    first_name,
    last_name,
    created_at
FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<User>;
    fn update_user(&self, user: &User) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn find_one(&self, column: &'static str, value: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE {column} = ?1;"),
                [value.trim().to_lowercase()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?;
        user.transpose()
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<User> {
        user.validate()?;

        self.conn
            .execute(
                "INSERT INTO users (uuid, username, email, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    user.uuid.to_string(),
                    user.username.as_deref(),
                    user.email.as_str(),
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                ],
            )
            .map_err(|err| map_constraint(err, format!("user `{}` already exists", user.email)))?;

        self.get_user(user.uuid)?.ok_or(RepoError::NotFound {
            entity: "user",
            id: user.uuid,
        })
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        user.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE users
                 SET username = ?2,
                     email = ?3,
                     first_name = ?4,
                     last_name = ?5,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![
                    user.uuid.to_string(),
                    user.username.as_deref(),
                    user.email.as_str(),
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                ],
            )
            .map_err(|err| map_constraint(err, format!("user `{}` already exists", user.email)))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "user",
                id: user.uuid,
            });
        }
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?;
        user.transpose()
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.find_one("email", email)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.find_one("username", username)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    Ok(User {
        uuid: parse_uuid(&uuid_text, "users.uuid")?,
        username: row.get("username")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        created_at: row.get("created_at")?,
    })
}
