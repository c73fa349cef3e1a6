//! Startup dataset.
//!
//! The store is populated exactly once, either from the built-in demo data or
//! from a JSON file with the same shape:
//!
//! ```json
//! { "users": [...], "projects": [...], "tasks": [...], "activity": [...] }
//! ```
//!
//! Nothing is ever written back.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::error::SeedError;
use crate::fields::{Priority, Role, Status};
use crate::format::local_now;
use crate::project::{Project, ProjectId};
use crate::task::{Comment, CommentId, Task, TaskId};
use crate::user::{User, UserId};

/// Initial collections handed to [`crate::store::TaskStore::from_seed`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub activity: Vec<Activity>,
}

impl Seed {
    /// Read a seed from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let buf = fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&buf).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The demo dataset, with dates laid out around `now` so the dashboard and
    /// timeline always have something to show.
    pub fn builtin(now: DateTime<Utc>) -> Self {
        let today = local_now(now).date();
        let days_ago = |d: i64| now - Duration::days(d);
        let due_in = |d: i64| Some(today + Duration::days(d));

        let users = vec![
            user(1, "Sarah Chen", "sarah@example.com", Role::Admin),
            user(2, "Alex Rivera", "alex@example.com", Role::Member),
            user(3, "Jordan Lee", "jordan@example.com", Role::Member),
            user(4, "Taylor Kim", "taylor@example.com", Role::Viewer),
        ];

        let projects = vec![
            Project {
                id: ProjectId(1),
                name: "Website Redesign".into(),
                description: Some("Refresh the marketing site and component library".into()),
                color: "#3B82F6".into(),
                owner_id: UserId(1),
                member_ids: vec![UserId(1), UserId(2), UserId(3)],
                created_at: days_ago(30),
                updated_at: days_ago(1),
            },
            Project {
                id: ProjectId(2),
                name: "Mobile App".into(),
                description: Some("First release of the iOS and Android client".into()),
                color: "#8B5CF6".into(),
                owner_id: UserId(2),
                member_ids: vec![UserId(2), UserId(3), UserId(4)],
                created_at: days_ago(21),
                updated_at: days_ago(2),
            },
            Project {
                id: ProjectId(3),
                name: "Marketing Campaign".into(),
                description: None,
                color: "#10B981".into(),
                owner_id: UserId(1),
                member_ids: vec![UserId(1), UserId(4)],
                created_at: days_ago(10),
                updated_at: days_ago(3),
            },
        ];

        let t = TaskBuilder { now };
        let tasks = vec![
            t.task(1, "Design new homepage layout", 1, Status::Done, Priority::High, Some(1), due_in(-4))
                .described("Hero, feature grid and pricing sections")
                .commented(vec![comment(1, "Mockups are in the shared folder", 2, days_ago(6))]),
            t.task(2, "Build component library", 1, Status::InProgress, Priority::High, Some(2), due_in(3))
                .described("Buttons, inputs, cards and dialogs"),
            t.task(3, "Write copy for about page", 1, Status::Review, Priority::Medium, Some(3), due_in(-1))
                .commented(vec![
                    comment(2, "First draft ready for review", 3, days_ago(2)),
                    comment(3, "Looks good, a few tweaks to the intro", 1, days_ago(1)),
                ]),
            t.task(4, "Set up analytics", 1, Status::Todo, Priority::Low, None, due_in(8)),
            t.task(5, "Authentication flow", 2, Status::InProgress, Priority::High, Some(3), due_in(1))
                .described("Email and social sign-in"),
            t.task(6, "Push notifications", 2, Status::Todo, Priority::Medium, Some(2), due_in(6)),
            t.task(7, "App store screenshots", 2, Status::Todo, Priority::Low, Some(4), None),
            t.task(8, "Offline caching", 2, Status::Review, Priority::Medium, Some(2), due_in(11)),
            t.task(9, "Campaign landing page", 3, Status::Todo, Priority::High, Some(1), due_in(-2)),
            t.task(10, "Social media calendar", 3, Status::Done, Priority::Medium, Some(4), due_in(2)),
        ];

        let activity = vec![
            activity(1, "completed \"Design new homepage layout\"", 1, Some(1), days_ago(3)),
            activity(2, "commented on \"Write copy for about page\"", 3, Some(3), days_ago(2)),
            activity(3, "moved \"Offline caching\" to Review", 2, Some(8), days_ago(1)),
            activity(4, "created task \"Set up analytics\"", 1, Some(4), now - Duration::hours(5)),
        ];

        Seed { users, projects, tasks, activity }
    }
}

fn user(id: u64, name: &str, email: &str, role: Role) -> User {
    User {
        id: UserId(id),
        name: name.into(),
        email: email.into(),
        avatar: None,
        role,
    }
}

fn comment(id: u64, content: &str, author: u64, at: DateTime<Utc>) -> Comment {
    Comment {
        id: CommentId(id),
        content: content.into(),
        author_id: UserId(author),
        created_at: at,
    }
}

fn activity(id: u64, action: &str, user: u64, task: Option<u64>, at: DateTime<Utc>) -> Activity {
    Activity {
        id,
        action: action.into(),
        user_id: Some(UserId(user)),
        task_id: task.map(TaskId),
        created_at: at,
    }
}

struct TaskBuilder {
    now: DateTime<Utc>,
}

impl TaskBuilder {
    #[allow(clippy::too_many_arguments)]
    fn task(
        &self,
        id: u64,
        title: &str,
        project: u64,
        status: Status,
        priority: Priority,
        assignee: Option<u64>,
        due: Option<NaiveDate>,
    ) -> Task {
        let created = self.now - Duration::days(14 - id as i64);
        Task {
            id: TaskId(id),
            title: title.into(),
            description: None,
            status,
            priority,
            assignee_id: assignee.map(UserId),
            due_date: due,
            project_id: ProjectId(project),
            comments: Vec::new(),
            created_at: created,
            updated_at: created,
        }
    }
}

trait TaskSeedExt {
    fn described(self, text: &str) -> Self;
    fn commented(self, comments: Vec<Comment>) -> Self;
}

impl TaskSeedExt for Task {
    fn described(mut self, text: &str) -> Self {
        self.description = Some(text.into());
        self
    }

    fn commented(mut self, comments: Vec<Comment>) -> Self {
        if let Some(last) = comments.last() {
            self.updated_at = self.updated_at.max(last.created_at);
        }
        self.comments = comments;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SystemClock, TaskStore};
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn test_builtin_seed_is_consistent() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let store = TaskStore::from_seed(Seed::builtin(now), SystemClock).unwrap();
        assert_eq!(store.users().len(), 4);
        assert_eq!(store.projects().len(), 3);
        assert_eq!(store.tasks().len(), 10);
        for task in store.tasks() {
            assert!(task.updated_at >= task.created_at, "task {}", task.id);
        }
    }

    #[test]
    fn test_builtin_due_dates_follow_local_date() {
        // Late evening UTC is already the next day east of Greenwich.
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        let today = local_now(now).date();
        let seed = Seed::builtin(now);
        assert_eq!(seed.tasks[2].due_date, Some(today - Duration::days(1)));
        assert_eq!(seed.tasks[4].due_date, Some(today + Duration::days(1)));
    }

    #[test]
    fn test_load_seed_file() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string_pretty(&Seed::builtin(now)).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let seed = Seed::load(file.path()).unwrap();
        assert_eq!(seed.tasks.len(), 10);
        assert_eq!(seed.tasks[2].comments.len(), 2);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ \"tasks\": [ { \"status\": \"blocked\" } ] }").unwrap();
        assert!(matches!(Seed::load(file.path()), Err(SeedError::Parse { .. })));
    }

    #[test]
    fn test_dangling_project_reference_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let mut seed = Seed::builtin(now);
        seed.tasks[0].project_id = ProjectId(99);
        let err = TaskStore::from_seed(seed, SystemClock).unwrap_err();
        assert!(matches!(
            err,
            SeedError::Invalid(crate::error::StoreError::ProjectNotFound(ProjectId(99)))
        ));
    }
}
