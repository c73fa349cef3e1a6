//! Team members.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fields::Role;

/// Identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A team member. Users are fixed once the store has been seeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub role: Role,
}

impl User {
    /// First letter of the display name, used where an avatar would be shown.
    pub fn initial(&self) -> char {
        self.name.chars().next().unwrap_or('?')
    }
}
