//! Team use-case service.
//!
//! # Invariants
//! - The creator is the first member and therefore the single owner.
//! - Only members may read, rename or grow a team.
//! - Member lookups are trimmed and lowercased; a query containing `@` is
//!   an email, anything else a username.

use super::access::AccessService;
use super::{normalize_name, Repositories, ServiceError, ServiceResult};
use crate::model::team::{Team, TeamId};
use crate::model::user::{User, UserId};
use crate::repo::team_repo::TeamRepository;
use crate::repo::user_repo::UserRepository;
use log::info;
use rusqlite::Connection;

pub struct TeamService<'conn> {
    repos: Repositories<'conn>,
}

impl<'conn> TeamService<'conn> {
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self {
            repos: Repositories::try_new(conn)?,
        })
    }

    fn access(&self) -> AccessService<'_, 'conn> {
        AccessService::new(&self.repos)
    }

    fn load_user(&self, user_uuid: UserId) -> ServiceResult<User> {
        self.repos
            .users
            .get_user(user_uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "user",
                id: user_uuid,
            })
    }

    pub fn create_team(&self, creator_uuid: UserId, name: &str) -> ServiceResult<Team> {
        let creator = self.load_user(creator_uuid)?;
        let mut team = Team::new(normalize_name("team", name)?);
        team.add_member(&creator)?;

        let team = self.repos.teams.create_team(&team)?;
        info!("event=team_create module=service status=ok");
        Ok(team)
    }

    pub fn get_team(&self, user_uuid: UserId, team_uuid: TeamId) -> ServiceResult<Team> {
        self.access().team(user_uuid, team_uuid)
    }

    pub fn rename_team(
        &self,
        user_uuid: UserId,
        team_uuid: TeamId,
        name: &str,
    ) -> ServiceResult<Team> {
        let mut team = self.access().team(user_uuid, team_uuid)?;
        team.name = normalize_name("team", name)?;
        Ok(self.repos.teams.update_team(&team)?)
    }

    /// Adds the user matching `query` (email or username) to the team.
    pub fn add_member(
        &self,
        user_uuid: UserId,
        team_uuid: TeamId,
        query: &str,
    ) -> ServiceResult<Team> {
        let mut team = self.access().team(user_uuid, team_uuid)?;

        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Err(ServiceError::InvalidInput(
                "member query must not be blank".to_string(),
            ));
        }
        let found = if query.contains('@') {
            self.repos.users.find_by_email(&query)?
        } else {
            self.repos.users.find_by_username(&query)?
        };
        let member = found.ok_or_else(|| ServiceError::UserNotFound(query.clone()))?;

        team.add_member(&member)?;
        let team = self.repos.teams.update_team(&team)?;
        info!(
            "event=team_add_member module=service status=ok members={}",
            team.members.len()
        );
        Ok(team)
    }

    pub fn teams_owned_by(&self, user_uuid: UserId) -> ServiceResult<Vec<Team>> {
        Ok(self.repos.teams.list_teams_owned_by(user_uuid)?)
    }
}
