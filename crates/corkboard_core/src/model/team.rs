//! Team model and membership rules.
//!
//! # Responsibility
//! - Track which users share team boards.
//! - Assign short, unique, lowercase initials to every member.
//!
//! # Invariants
//! - A persisted team has exactly one owner.
//! - A user appears at most once in `members`.
//! - Member initials are unique inside one team.

use super::user::{User, UserId};
use super::{ensure_name, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type TeamId = Uuid;

/// Membership rule violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamError {
    Validation(ValidationError),
    /// The user is already a member of the team.
    DuplicateMember(UserId),
    /// Every one- and two-letter initial is taken.
    TeamFull,
    /// Team does not have exactly one owner.
    OwnerCount(usize),
}

impl Display for TeamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateMember(id) => write!(f, "user {id} is already a team member"),
            Self::TeamFull => write!(f, "team has no free member initials left"),
            Self::OwnerCount(count) => {
                write!(f, "team must have exactly one owner, found {count}")
            }
        }
    }
}

impl Error for TeamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for TeamError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One team membership row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_uuid: UserId,
    /// Lowercase short label shown on shared boards.
    pub initials: String,
    pub is_owner: bool,
}

/// Group of users sharing boards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub uuid: TeamId,
    pub name: String,
    /// Members in join order.
    pub members: Vec<TeamMember>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

impl Team {
    /// Creates an empty team. Call [`Team::add_member`] before persisting.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            members: Vec::new(),
            created_at: 0,
        }
    }

    /// Adds `user` to the team.
    ///
    /// The first member added becomes the owner.
    ///
    /// # Errors
    /// - `DuplicateMember` when the user already belongs to the team.
    /// - `TeamFull` when no initials are left.
    pub fn add_member(&mut self, user: &User) -> Result<&TeamMember, TeamError> {
        if self.is_member(user.uuid) {
            return Err(TeamError::DuplicateMember(user.uuid));
        }
        let initials = self.next_initials(user)?;
        let is_owner = !self.members.iter().any(|member| member.is_owner);
        self.members.push(TeamMember {
            user_uuid: user.uuid,
            initials,
            is_owner,
        });
        let last = self.members.len() - 1;
        Ok(&self.members[last])
    }

    pub fn is_member(&self, user_uuid: UserId) -> bool {
        self.members.iter().any(|member| member.user_uuid == user_uuid)
    }

    pub fn owner(&self) -> Option<&TeamMember> {
        self.members.iter().find(|member| member.is_owner)
    }

    pub fn validate(&self) -> Result<(), TeamError> {
        ensure_name("team", &self.name)?;

        let owners = self.members.iter().filter(|member| member.is_owner).count();
        if owners != 1 {
            return Err(TeamError::OwnerCount(owners));
        }

        let mut seen = HashSet::new();
        for member in &self.members {
            if !seen.insert(member.user_uuid) {
                return Err(TeamError::DuplicateMember(member.user_uuid));
            }
        }
        Ok(())
    }

    fn next_initials(&self, user: &User) -> Result<String, TeamError> {
        let taken: HashSet<&str> = self
            .members
            .iter()
            .map(|member| member.initials.as_str())
            .collect();

        if let Some(found) = preferred_initials(user)
            .into_iter()
            .find(|candidate| !taken.contains(candidate.as_str()))
        {
            return Ok(found);
        }

        let letters = || (b'a'..=b'z').map(char::from);
        letters()
            .map(String::from)
            .chain(letters().flat_map(|x| letters().map(move |y| format!("{x}{y}"))))
            .find(|candidate| !taken.contains(candidate.as_str()))
            .ok_or(TeamError::TeamFull)
    }
}

/// Initials derived from the user's names, best first, deduplicated.
fn preferred_initials(user: &User) -> Vec<String> {
    let username = user.username.as_deref().unwrap_or_default();
    let first = user.first_name.trim();
    let last = user.last_name.trim();
    let email = user.email.as_str();

    let both = if first.is_empty() || last.is_empty() {
        String::new()
    } else {
        format!("{}{}", prefix(first, 1), prefix(last, 1))
    };

    let raw = [
        prefix(username, 1),
        prefix(first, 1),
        prefix(last, 1),
        prefix(email, 1),
        both,
        prefix(username, 2),
        prefix(first, 2),
        prefix(last, 2),
        prefix(email, 2),
    ];

    let mut result: Vec<String> = Vec::new();
    for candidate in raw {
        let candidate = candidate.to_lowercase();
        if !candidate.is_empty() && !result.contains(&candidate) {
            result.push(candidate);
        }
    }
    result
}

fn prefix(value: &str, chars: usize) -> String {
    value.chars().take(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::{Team, TeamError, TeamMember};
    use crate::model::user::User;
    use uuid::Uuid;

    fn user(email: &str, username: &str, first: &str, last: &str) -> User {
        User::new(email, Some(username.to_string())).with_names(first, last)
    }

    #[test]
    fn first_member_becomes_owner() {
        let mut team = Team::new("Core");
        let ada = user("ada@example.com", "ada", "Ada", "Lovelace");
        let bob = user("bob@example.com", "bob", "Bob", "Stone");

        assert!(team.add_member(&ada).unwrap().is_owner);
        assert!(!team.add_member(&bob).unwrap().is_owner);
        assert_eq!(team.owner().unwrap().user_uuid, ada.uuid);
        assert!(team.validate().is_ok());
    }

    #[test]
    fn initials_fall_through_preferred_candidates() {
        let mut team = Team::new("Core");
        let first = user("anna@example.com", "anna", "Anna", "Lee");
        let second = user("alex@example.com", "alex", "Alex", "Lamb");
        let third = user("al@example.com", "al", "Al", "Lu");

        assert_eq!(team.add_member(&first).unwrap().initials, "a");
        // "a" is taken, so the first-name initial is skipped too.
        assert_eq!(team.add_member(&second).unwrap().initials, "l");
        assert_eq!(team.add_member(&third).unwrap().initials, "al");
    }

    #[test]
    fn initials_fall_back_to_alphabet_when_names_collide() {
        let mut team = Team::new("Core");
        team.members = ["z", "za", "zz"]
            .iter()
            .enumerate()
            .map(|(index, initials)| TeamMember {
                user_uuid: Uuid::new_v4(),
                initials: initials.to_string(),
                is_owner: index == 0,
            })
            .collect();

        let zed = user("zz@example.com", "zz", "Z", "Z");
        assert_eq!(team.add_member(&zed).unwrap().initials, "a");
    }

    #[test]
    fn adding_same_user_twice_is_rejected() {
        let mut team = Team::new("Core");
        let ada = user("ada@example.com", "ada", "Ada", "Lovelace");
        team.add_member(&ada).unwrap();

        assert_eq!(
            team.add_member(&ada).unwrap_err(),
            TeamError::DuplicateMember(ada.uuid)
        );
    }

    #[test]
    fn full_team_rejects_new_member() {
        let mut team = Team::new("Crowd");
        let letters: Vec<char> = (b'a'..=b'z').map(char::from).collect();
        let mut all = Vec::new();
        for x in &letters {
            all.push(x.to_string());
        }
        for x in &letters {
            for y in &letters {
                all.push(format!("{x}{y}"));
            }
        }
        team.members = all
            .into_iter()
            .enumerate()
            .map(|(index, initials)| TeamMember {
                user_uuid: Uuid::new_v4(),
                initials,
                is_owner: index == 0,
            })
            .collect();

        let late = user("late@example.com", "late", "Late", "Comer");
        assert_eq!(team.add_member(&late).unwrap_err(), TeamError::TeamFull);
    }

    #[test]
    fn validate_requires_single_owner() {
        let team = Team::new("Nobody");
        assert_eq!(team.validate(), Err(TeamError::OwnerCount(0)));
    }
}
