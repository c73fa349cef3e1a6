//! Task data structures.
//!
//! This module defines the `Task` work item, its append-only `Comment` list,
//! and the draft/patch types callers hand to the store to create or change a task.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{Priority, Status};
use crate::project::ProjectId;
use crate::user::UserId;

/// Identifier of a task, unique within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a comment, unique within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work owned by exactly one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub project_id: ProjectId,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note left on a task. Never edited or removed once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub assignee_id: Option<UserId>,
    pub due_date: Option<NaiveDate>,
    pub project_id: ProjectId,
}

impl TaskDraft {
    /// A draft with the add-task dialog defaults: todo, medium, unassigned, no due date.
    pub fn new(title: impl Into<String>, project_id: ProjectId) -> Self {
        TaskDraft {
            title: title.into(),
            description: None,
            status: Status::Todo,
            priority: Priority::Medium,
            assignee_id: None,
            due_date: None,
            project_id,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assignee_id = Some(assignee);
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }
}

/// A partial update to a task.
///
/// `None` leaves a field untouched. For the optional fields, `Some(None)`
/// clears the value. The owning project is deliberately absent: tasks are
/// never moved between projects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<Option<UserId>>,
    pub due_date: Option<Option<NaiveDate>>,
}

/// Trim optional free text, mapping blank input to `None`.
pub fn normalise_optional_text(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_defaults() {
        let draft = TaskDraft::new("Write docs", ProjectId(1));
        assert_eq!(draft.status, Status::Todo);
        assert_eq!(draft.priority, Priority::Medium);
        assert!(draft.assignee_id.is_none());
        assert!(draft.due_date.is_none());
    }

    #[test]
    fn test_normalise_optional_text() {
        assert_eq!(normalise_optional_text(None), None);
        assert_eq!(normalise_optional_text(Some("   ".into())), None);
        assert_eq!(normalise_optional_text(Some(" hi ".into())), Some("hi".into()));
    }
}
