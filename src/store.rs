//! The task store: the single owner of users, projects, tasks and the activity log.
//!
//! Every change to the dataset goes through one of the mutation methods on
//! [`TaskStore`]. A mutation either applies completely and notifies listeners, or
//! is rejected with a [`StoreError`] and leaves the store untouched.
//!
//! Views never hold on to derived state; they recompute from the store's
//! collections via [`crate::views`] after every change.

use std::cell::Cell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::activity::Activity;
use crate::error::{SeedError, StoreError, StoreResult};
use crate::fields::{format_status, Status};
use crate::project::{parse_hex_color, Project, ProjectDraft, ProjectId};
use crate::seed::Seed;
use crate::task::{normalise_optional_text, Comment, CommentId, Task, TaskDraft, TaskId, TaskPatch};
use crate::user::{User, UserId};

/// Source of the current time for timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock(Rc<Cell<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock(Rc::new(Cell::new(start)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.0.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

/// Change notification sent to listeners after a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    TaskAdded(TaskId),
    TaskUpdated(TaskId),
    TaskMoved { id: TaskId, from: Status, to: Status },
    CommentAdded { task: TaskId, comment: CommentId },
    ProjectAdded(ProjectId),
}

/// Result of [`TaskStore::move_task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: Status, to: Status },
    /// The task already had the requested status; nothing changed.
    Unchanged,
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// In-memory store for one session.
pub struct TaskStore {
    users: Vec<User>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    activity: Vec<Activity>,
    current_user: Option<UserId>,
    next_task_id: u64,
    next_project_id: u64,
    next_comment_id: u64,
    next_activity_id: u64,
    clock: Box<dyn Clock>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore")
            .field("users", &self.users.len())
            .field("projects", &self.projects.len())
            .field("tasks", &self.tasks.len())
            .field("activity", &self.activity.len())
            .field("current_user", &self.current_user)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        TaskStore::new(SystemClock)
    }
}

impl TaskStore {
    /// An empty store.
    pub fn new(clock: impl Clock + 'static) -> Self {
        TaskStore {
            users: Vec::new(),
            projects: Vec::new(),
            tasks: Vec::new(),
            activity: Vec::new(),
            current_user: None,
            next_task_id: 1,
            next_project_id: 1,
            next_comment_id: 1,
            next_activity_id: 1,
            clock: Box::new(clock),
            listeners: Vec::new(),
        }
    }

    /// Build a store from seed data, checking ids are unique and every reference resolves.
    ///
    /// The first seeded user becomes the current user.
    pub fn from_seed(seed: Seed, clock: impl Clock + 'static) -> Result<Self, SeedError> {
        let Seed { users, projects, tasks, activity } = seed;

        let user_ids = unique_ids("user", users.iter().map(|u| u.id.0))?;
        let project_ids = unique_ids("project", projects.iter().map(|p| p.id.0))?;
        let task_ids = unique_ids("task", tasks.iter().map(|t| t.id.0))?;
        let comment_ids = unique_ids(
            "comment",
            tasks.iter().flat_map(|t| t.comments.iter().map(|c| c.id.0)),
        )?;
        unique_ids("activity", activity.iter().map(|a| a.id))?;

        let user_exists = |id: UserId| -> Result<(), StoreError> {
            if user_ids.contains(&id.0) {
                Ok(())
            } else {
                Err(StoreError::UserNotFound(id))
            }
        };

        for p in &projects {
            user_exists(p.owner_id)?;
            for &m in &p.member_ids {
                user_exists(m)?;
            }
        }
        for t in &tasks {
            if !project_ids.contains(&t.project_id.0) {
                return Err(StoreError::ProjectNotFound(t.project_id).into());
            }
            if let Some(a) = t.assignee_id {
                user_exists(a)?;
            }
            for c in &t.comments {
                user_exists(c.author_id)?;
            }
        }
        for a in &activity {
            if let Some(u) = a.user_id {
                user_exists(u)?;
            }
            if let Some(t) = a.task_id {
                if !task_ids.contains(&t.0) {
                    return Err(StoreError::TaskNotFound(t).into());
                }
            }
        }

        let next = |ids: &HashSet<u64>| ids.iter().max().map_or(1, |m| m + 1);
        let store = TaskStore {
            current_user: users.first().map(|u| u.id),
            next_task_id: next(&task_ids),
            next_project_id: next(&project_ids),
            next_comment_id: next(&comment_ids),
            next_activity_id: activity.iter().map(|a| a.id).max().map_or(1, |m| m + 1),
            users,
            projects,
            tasks,
            activity,
            clock: Box::new(clock),
            listeners: Vec::new(),
        };
        info!(
            users = store.users.len(),
            projects = store.projects.len(),
            tasks = store.tasks.len(),
            "store seeded"
        );
        Ok(store)
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Register a listener called after every successful mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// The user recorded as the actor of store-initiated activity.
    pub fn current_user(&self) -> Option<UserId> {
        self.current_user
    }

    /// Change the acting user.
    pub fn set_current_user(&mut self, id: UserId) -> StoreResult<()> {
        self.require_user(id)?;
        self.current_user = Some(id);
        Ok(())
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Activity in the order it was recorded (oldest first).
    pub fn activity(&self) -> &[Activity] {
        &self.activity
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Create a task from a draft.
    ///
    /// The title and description are trimmed; a blank description becomes `None`.
    pub fn add_task(&mut self, draft: TaskDraft) -> StoreResult<&Task> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            debug!(project_id = %draft.project_id, "rejected task with empty title");
            return Err(StoreError::EmptyTitle);
        }
        self.require_project(draft.project_id)?;
        if let Some(assignee) = draft.assignee_id {
            self.require_user(assignee)?;
        }

        let now = self.clock.now();
        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;

        let action = format!("created task \"{}\"", title);
        self.tasks.push(Task {
            id,
            title,
            description: normalise_optional_text(draft.description),
            status: draft.status,
            priority: draft.priority,
            assignee_id: draft.assignee_id,
            due_date: draft.due_date,
            project_id: draft.project_id,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        self.record(self.current_user, Some(id), action, now);
        info!(task_id = %id, project_id = %draft.project_id, status = ?draft.status, "task added");
        self.emit(StoreEvent::TaskAdded(id));

        let idx = self.tasks.len() - 1;
        Ok(&self.tasks[idx])
    }

    /// Apply a partial update. `updated_at` is refreshed even when the patch is empty.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> StoreResult<&Task> {
        let idx = self.index_of(id)?;
        let title = match patch.title {
            Some(ref t) => {
                let t = t.trim();
                if t.is_empty() {
                    debug!(task_id = %id, "rejected update with empty title");
                    return Err(StoreError::EmptyTitle);
                }
                Some(t.to_string())
            }
            None => None,
        };
        if let Some(Some(assignee)) = patch.assignee_id {
            self.require_user(assignee)?;
        }

        let stamp = self.stamp_after(self.tasks[idx].updated_at);
        let task = &mut self.tasks[idx];
        if let Some(t) = title {
            task.title = t;
        }
        if let Some(d) = patch.description {
            task.description = normalise_optional_text(d);
        }
        if let Some(s) = patch.status {
            task.status = s;
        }
        if let Some(p) = patch.priority {
            task.priority = p;
        }
        if let Some(a) = patch.assignee_id {
            task.assignee_id = a;
        }
        if let Some(d) = patch.due_date {
            task.due_date = d;
        }
        task.updated_at = stamp;

        let action = format!("updated \"{}\"", task.title);
        self.record(self.current_user, Some(id), action, stamp);
        info!(task_id = %id, "task updated");
        self.emit(StoreEvent::TaskUpdated(id));
        Ok(&self.tasks[idx])
    }

    /// Change only the status of a task, as a board drag does.
    ///
    /// Moving a task onto its own column changes nothing, not even `updated_at`.
    pub fn move_task(&mut self, id: TaskId, status: Status) -> StoreResult<MoveOutcome> {
        let idx = self.index_of(id)?;
        let from = self.tasks[idx].status;
        if from == status {
            debug!(task_id = %id, ?status, "move onto same column ignored");
            return Ok(MoveOutcome::Unchanged);
        }

        let stamp = self.stamp_after(self.tasks[idx].updated_at);
        let task = &mut self.tasks[idx];
        task.status = status;
        task.updated_at = stamp;

        let action = format!("moved \"{}\" to {}", task.title, format_status(status));
        self.record(self.current_user, Some(id), action, stamp);
        info!(task_id = %id, ?from, to = ?status, "task moved");
        self.emit(StoreEvent::TaskMoved { id, from, to: status });
        Ok(MoveOutcome::Moved { from, to: status })
    }

    /// Append a comment. The text is trimmed and must not be blank.
    pub fn add_comment(&mut self, task_id: TaskId, author: UserId, text: &str) -> StoreResult<&Comment> {
        let content = text.trim();
        if content.is_empty() {
            debug!(%task_id, "rejected empty comment");
            return Err(StoreError::EmptyComment);
        }
        let idx = self.index_of(task_id)?;
        self.require_user(author)?;

        let stamp = self.stamp_after(self.tasks[idx].updated_at);
        let comment_id = CommentId(self.next_comment_id);
        self.next_comment_id += 1;

        let task = &mut self.tasks[idx];
        task.comments.push(Comment {
            id: comment_id,
            content: content.to_string(),
            author_id: author,
            created_at: stamp,
        });
        task.updated_at = stamp;

        let action = format!("commented on \"{}\"", task.title);
        self.record(Some(author), Some(task_id), action, stamp);
        info!(%task_id, %comment_id, "comment added");
        self.emit(StoreEvent::CommentAdded { task: task_id, comment: comment_id });

        let task = &self.tasks[idx];
        Ok(&task.comments[task.comments.len() - 1])
    }

    /// Create a project owned by `draft.owner_id`, who also becomes its only member.
    pub fn add_project(&mut self, draft: ProjectDraft) -> StoreResult<&Project> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            debug!("rejected project with empty name");
            return Err(StoreError::EmptyProjectName);
        }
        if parse_hex_color(&draft.color).is_none() {
            return Err(StoreError::InvalidColor(draft.color));
        }
        self.require_user(draft.owner_id)?;

        let now = self.clock.now();
        let id = ProjectId(self.next_project_id);
        self.next_project_id += 1;

        let action = format!("created project \"{}\"", name);
        self.projects.push(Project {
            id,
            name,
            description: normalise_optional_text(draft.description),
            color: draft.color,
            owner_id: draft.owner_id,
            member_ids: vec![draft.owner_id],
            created_at: now,
            updated_at: now,
        });
        self.record(Some(draft.owner_id), None, action, now);
        info!(project_id = %id, "project added");
        self.emit(StoreEvent::ProjectAdded(id));

        let idx = self.projects.len() - 1;
        Ok(&self.projects[idx])
    }

    fn index_of(&self, id: TaskId) -> StoreResult<usize> {
        self.tasks.iter().position(|t| t.id == id).ok_or_else(|| {
            debug!(task_id = %id, "task not found");
            StoreError::TaskNotFound(id)
        })
    }

    fn require_user(&self, id: UserId) -> StoreResult<()> {
        match self.user(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::UserNotFound(id)),
        }
    }

    fn require_project(&self, id: ProjectId) -> StoreResult<()> {
        match self.project(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::ProjectNotFound(id)),
        }
    }

    /// A timestamp strictly after `prev`, using the clock when it has moved on.
    fn stamp_after(&self, prev: DateTime<Utc>) -> DateTime<Utc> {
        let now = self.clock.now();
        if now > prev {
            now
        } else {
            prev + Duration::microseconds(1)
        }
    }

    fn record(&mut self, user_id: Option<UserId>, task_id: Option<TaskId>, action: String, at: DateTime<Utc>) {
        let id = self.next_activity_id;
        self.next_activity_id += 1;
        self.activity.push(Activity { id, action, user_id, task_id, created_at: at });
    }

    fn emit(&mut self, event: StoreEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

fn unique_ids(kind: &'static str, ids: impl Iterator<Item = u64>) -> Result<HashSet<u64>, SeedError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SeedError::DuplicateId { kind, id });
        }
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Role};
    use chrono::TimeZone;
    use std::cell::RefCell;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()
    }

    fn store_with(clock: ManualClock) -> TaskStore {
        let seed = Seed {
            users: vec![User {
                id: UserId(1),
                name: "Ada".into(),
                email: "ada@example.com".into(),
                avatar: None,
                role: Role::Admin,
            }],
            projects: vec![Project {
                id: ProjectId(1),
                name: "Website".into(),
                description: None,
                color: "#3B82F6".into(),
                owner_id: UserId(1),
                member_ids: vec![UserId(1)],
                created_at: start(),
                updated_at: start(),
            }],
            tasks: Vec::new(),
            activity: Vec::new(),
        };
        TaskStore::from_seed(seed, clock).unwrap()
    }

    #[test]
    fn test_add_task_trims_and_assigns_ids() {
        let mut store = store_with(ManualClock::new(start()));
        let first = store
            .add_task(TaskDraft::new("  Landing page  ", ProjectId(1)).with_description("   "))
            .unwrap()
            .clone();
        assert_eq!(first.id, TaskId(1));
        assert_eq!(first.title, "Landing page");
        assert_eq!(first.description, None);
        assert_eq!(first.created_at, first.updated_at);
        assert!(first.comments.is_empty());

        let second = store.add_task(TaskDraft::new("Footer", ProjectId(1))).unwrap();
        assert_eq!(second.id, TaskId(2));
    }

    #[test]
    fn test_add_task_rejections_leave_store_unchanged() {
        let mut store = store_with(ManualClock::new(start()));
        assert_eq!(
            store.add_task(TaskDraft::new("   ", ProjectId(1))).unwrap_err(),
            StoreError::EmptyTitle
        );
        assert_eq!(
            store.add_task(TaskDraft::new("x", ProjectId(9))).unwrap_err(),
            StoreError::ProjectNotFound(ProjectId(9))
        );
        assert_eq!(
            store
                .add_task(TaskDraft::new("x", ProjectId(1)).with_assignee(UserId(7)))
                .unwrap_err(),
            StoreError::UserNotFound(UserId(7))
        );
        assert!(store.tasks().is_empty());
        assert!(store.activity().is_empty());
    }

    #[test]
    fn test_update_task_applies_patch_and_bumps_timestamp() {
        let clock = ManualClock::new(start());
        let mut store = store_with(clock.clone());
        let id = store.add_task(TaskDraft::new("Draft", ProjectId(1))).unwrap().id;

        clock.advance(Duration::minutes(5));
        let patch = TaskPatch {
            title: Some("Final".into()),
            priority: Some(Priority::High),
            assignee_id: Some(Some(UserId(1))),
            ..Default::default()
        };
        let task = store.update_task(id, patch).unwrap();
        assert_eq!(task.title, "Final");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.assignee_id, Some(UserId(1)));
        assert_eq!(task.updated_at, start() + Duration::minutes(5));

        let cleared = store
            .update_task(id, TaskPatch { assignee_id: Some(None), ..Default::default() })
            .unwrap();
        assert_eq!(cleared.assignee_id, None);
    }

    #[test]
    fn test_update_task_does_not_touch_other_tasks() {
        let clock = ManualClock::new(start());
        let mut store = store_with(clock.clone());
        let a = store.add_task(TaskDraft::new("A", ProjectId(1))).unwrap().id;
        let b = store.add_task(TaskDraft::new("B", ProjectId(1))).unwrap().clone();

        clock.advance(Duration::seconds(1));
        store
            .update_task(a, TaskPatch { status: Some(Status::Review), ..Default::default() })
            .unwrap();
        assert_eq!(store.task(b.id), Some(&b));
    }

    #[test]
    fn test_update_missing_task() {
        let mut store = store_with(ManualClock::new(start()));
        assert_eq!(
            store.update_task(TaskId(42), TaskPatch::default()).unwrap_err(),
            StoreError::TaskNotFound(TaskId(42))
        );
    }

    #[test]
    fn test_timestamps_strictly_increase_on_frozen_clock() {
        let mut store = store_with(ManualClock::new(start()));
        let id = store.add_task(TaskDraft::new("A", ProjectId(1))).unwrap().id;
        let before = store.task(id).unwrap().updated_at;
        store.move_task(id, Status::Done).unwrap();
        let after = store.task(id).unwrap().updated_at;
        assert!(after > before);
    }

    #[test]
    fn test_listeners_receive_events_in_order() {
        let mut store = store_with(ManualClock::new(start()));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |e| sink.borrow_mut().push(*e));

        let id = store.add_task(TaskDraft::new("A", ProjectId(1))).unwrap().id;
        store.move_task(id, Status::Todo).unwrap();
        store.move_task(id, Status::Review).unwrap();
        let _ = store.add_comment(id, UserId(1), "  ");

        assert_eq!(
            *seen.borrow(),
            vec![
                StoreEvent::TaskAdded(id),
                StoreEvent::TaskMoved { id, from: Status::Todo, to: Status::Review },
            ]
        );
    }

    #[test]
    fn test_add_project() {
        let mut store = store_with(ManualClock::new(start()));
        let p = store
            .add_project(ProjectDraft::new(" Mobile App ", UserId(1)).with_color("#10B981"))
            .unwrap();
        assert_eq!(p.id, ProjectId(2));
        assert_eq!(p.name, "Mobile App");
        assert_eq!(p.member_ids, vec![UserId(1)]);

        assert_eq!(
            store.add_project(ProjectDraft::new("  ", UserId(1))).unwrap_err(),
            StoreError::EmptyProjectName
        );
        assert_eq!(
            store.add_project(ProjectDraft::new("X", UserId(1)).with_color("blue")).unwrap_err(),
            StoreError::InvalidColor("blue".into())
        );
        assert_eq!(
            store.add_project(ProjectDraft::new("X", UserId(5))).unwrap_err(),
            StoreError::UserNotFound(UserId(5))
        );
        assert_eq!(store.projects().len(), 2);
    }

    #[test]
    fn test_seed_rejects_duplicates_and_dangling_references() {
        let mut seed = Seed::default();
        seed.users.push(User {
            id: UserId(1),
            name: "A".into(),
            email: "a@x".into(),
            avatar: None,
            role: Role::Member,
        });
        seed.users.push(seed.users[0].clone());
        assert!(matches!(
            TaskStore::from_seed(seed, SystemClock),
            Err(SeedError::DuplicateId { kind: "user", id: 1 })
        ));
    }

    #[test]
    fn test_set_current_user() {
        let mut store = store_with(ManualClock::new(start()));
        assert_eq!(store.current_user(), Some(UserId(1)));
        assert_eq!(
            store.set_current_user(UserId(3)).unwrap_err(),
            StoreError::UserNotFound(UserId(3))
        );
        assert_eq!(store.current_user(), Some(UserId(1)));
    }
}
