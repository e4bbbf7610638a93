//! User account model.
//!
//! # Invariants
//! - `email` is required, lowercase and unique.
//! - `username` is optional, lowercase and unique when present.

use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_.\-]+$").expect("valid username regex"));

/// Registered board user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: UserId,
    pub username: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

impl User {
    /// Builds a new user; email and username are normalized to lowercase.
    pub fn new(email: impl Into<String>, username: Option<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            username: username.map(|value| value.trim().to_lowercase()),
            email: email.into().trim().to_lowercase(),
            first_name: String::new(),
            last_name: String::new(),
            created_at: 0,
        }
    }

    /// Sets first and last name.
    pub fn with_names(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !EMAIL_RE.is_match(&self.email) || self.email != self.email.to_lowercase() {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        if let Some(username) = self.username.as_deref() {
            if !USERNAME_RE.is_match(username) {
                return Err(ValidationError::InvalidUsername(username.to_string()));
            }
        }
        Ok(())
    }
}
