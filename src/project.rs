//! Project data structures.
//!
//! A project groups tasks under an owner and a member list. The project does not
//! hold its tasks: the task set is derived by filtering the store's task collection
//! on `Task::project_id` (see [`crate::views::tasks_for_project`]).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// Identifier of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Colour given to projects created without one.
pub const DEFAULT_COLOR: &str = "#3B82F6";

/// Palette offered when creating a project.
pub const COLOR_OPTIONS: [(&str, &str); 8] = [
    ("#3B82F6", "Blue"),
    ("#8B5CF6", "Purple"),
    ("#10B981", "Green"),
    ("#F59E0B", "Yellow"),
    ("#EF4444", "Red"),
    ("#EC4899", "Pink"),
    ("#6366F1", "Indigo"),
    ("#14B8A6", "Teal"),
];

/// A named grouping of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    pub owner_id: UserId,
    pub member_ids: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Whether the user owns or is a member of this project.
    pub fn involves(&self, user: UserId) -> bool {
        self.owner_id == user || self.member_ids.contains(&user)
    }

    /// Parse the `#RRGGBB` colour into its components.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        parse_hex_color(&self.color)
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub owner_id: UserId,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>, owner_id: UserId) -> Self {
        ProjectDraft {
            name: name.into(),
            description: None,
            color: DEFAULT_COLOR.to_string(),
            owner_id,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// Parse a `#RRGGBB` string.
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#3B82F6"), Some((0x3B, 0x82, 0xF6)));
        assert_eq!(parse_hex_color("#10b981"), Some((0x10, 0xB9, 0x81)));
        assert_eq!(parse_hex_color("3B82F6"), None);
        assert_eq!(parse_hex_color("#3B82F"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
    }

    #[test]
    fn test_palette_colours_parse() {
        for (hex, _) in COLOR_OPTIONS {
            assert!(parse_hex_color(hex).is_some(), "{hex}");
        }
    }
}
