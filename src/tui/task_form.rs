//! Task and project forms for the board.
//!
//! A form holds raw input only. Turning it into a [`TaskDraft`], [`TaskPatch`]
//! or [`ProjectDraft`] parses the due date; everything else (blank titles,
//! unknown users, bad colours) is left for the store to reject.

use chrono::NaiveDate;
use thiserror::Error;

use crate::fields::{format_priority, format_status, Priority, Status};
use crate::format::parse_due_input;
use crate::project::{Project, ProjectDraft, ProjectId, COLOR_OPTIONS};
use crate::task::{normalise_optional_text, Task, TaskDraft, TaskId, TaskPatch};
use crate::tui::input::InputField;
use crate::user::{User, UserId};

/// Field order for the task form.
pub const TITLE_FIELD: usize = 0;
pub const DESCRIPTION_FIELD: usize = 1;
pub const DUE_FIELD: usize = 2;
pub const STATUS_FIELD: usize = 3;
pub const PRIORITY_FIELD: usize = 4;
pub const ASSIGNEE_FIELD: usize = 5;
/// Only present when creating; tasks never change project.
pub const PROJECT_FIELD: usize = 6;

/// Field order for the project form.
pub const NAME_FIELD: usize = 0;
pub const PROJECT_DESCRIPTION_FIELD: usize = 1;
pub const COLOR_FIELD: usize = 2;

/// Form input the store never sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unrecognised due date `{0}` (try YYYY-MM-DD, tomorrow, in 3d, friday)")]
    BadDueDate(String),
    #[error("no project to add the task to")]
    NoProject,
}

fn cycle(index: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        0
    } else if forward {
        (index + 1) % len
    } else if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

/// Add/edit task form.
pub struct TaskForm {
    pub editing: Option<TaskId>,
    pub title: InputField,
    pub description: InputField,
    pub due: InputField,
    pub status: usize,
    pub priority: usize,
    pub assignee: usize,
    pub project: usize,
    pub current_field: usize,
    pub statuses: Vec<Status>,
    pub priorities: Vec<Priority>,
    /// `None` first, for "Unassigned".
    pub assignees: Vec<(Option<UserId>, String)>,
    pub projects: Vec<(ProjectId, String)>,
}

impl TaskForm {
    /// Empty form for a new task in `status`, preselecting `project` when given.
    pub fn new(users: &[User], projects: &[Project], project: Option<ProjectId>, status: Status) -> Self {
        let mut assignees = vec![(None, "Unassigned".to_string())];
        assignees.extend(users.iter().map(|u| (Some(u.id), u.name.clone())));
        let projects: Vec<(ProjectId, String)> = projects.iter().map(|p| (p.id, p.name.clone())).collect();
        let statuses = Status::ALL.to_vec();
        let priorities = Priority::ALL.to_vec();

        let mut form = Self {
            editing: None,
            title: InputField::new(),
            description: InputField::new(),
            due: InputField::new(),
            status: statuses.iter().position(|&s| s == status).unwrap_or(0),
            priority: priorities.iter().position(|&p| p == Priority::Medium).unwrap_or(0),
            assignee: 0,
            project: project
                .and_then(|id| projects.iter().position(|(p, _)| *p == id))
                .unwrap_or(0),
            current_field: TITLE_FIELD,
            statuses,
            priorities,
            assignees,
            projects,
        };
        form.update_active_field();
        form
    }

    /// Form pre-filled from an existing task.
    pub fn from_task(task: &Task, users: &[User], projects: &[Project]) -> Self {
        let mut form = Self::new(users, projects, Some(task.project_id), task.status);
        form.editing = Some(task.id);
        form.title = InputField::with_value(&task.title);
        form.description = InputField::with_value(task.description.as_deref().unwrap_or_default());
        form.due = InputField::with_value(&task.due_date.map(|d| d.to_string()).unwrap_or_default());
        form.priority = form.priorities.iter().position(|&p| p == task.priority).unwrap_or(0);
        form.assignee = form
            .assignees
            .iter()
            .position(|(id, _)| *id == task.assignee_id)
            .unwrap_or(0);
        form.update_active_field();
        form
    }

    pub fn field_count(&self) -> usize {
        if self.editing.is_some() {
            PROJECT_FIELD
        } else {
            PROJECT_FIELD + 1
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = cycle(self.current_field, self.field_count(), false);
        self.update_active_field();
    }

    fn update_active_field(&mut self) {
        self.title.active = self.current_field == TITLE_FIELD;
        self.description.active = self.current_field == DESCRIPTION_FIELD;
        self.due.active = self.current_field == DUE_FIELD;
    }

    /// The text input under focus, if the focused field is not a selector.
    pub fn active_input(&self) -> Option<&InputField> {
        match self.current_field {
            TITLE_FIELD => Some(&self.title),
            DESCRIPTION_FIELD => Some(&self.description),
            DUE_FIELD => Some(&self.due),
            _ => None,
        }
    }

    fn active_input_mut(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_FIELD => Some(&mut self.title),
            DESCRIPTION_FIELD => Some(&mut self.description),
            DUE_FIELD => Some(&mut self.due),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.active_input_mut() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input_mut() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.active_input_mut() {
            field.handle_delete();
        }
    }

    /// Left/right moves the cursor in text fields and cycles selectors.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            STATUS_FIELD => self.status = cycle(self.status, self.statuses.len(), right),
            PRIORITY_FIELD => self.priority = cycle(self.priority, self.priorities.len(), right),
            ASSIGNEE_FIELD => self.assignee = cycle(self.assignee, self.assignees.len(), right),
            PROJECT_FIELD => self.project = cycle(self.project, self.projects.len(), right),
            _ => {
                if let Some(field) = self.active_input_mut() {
                    field.move_cursor(right);
                }
            }
        }
    }

    pub fn selected_status(&self) -> Status {
        self.statuses.get(self.status).copied().unwrap_or(Status::Todo)
    }

    pub fn selected_priority(&self) -> Priority {
        self.priorities.get(self.priority).copied().unwrap_or(Priority::Medium)
    }

    pub fn selected_assignee(&self) -> Option<UserId> {
        self.assignees.get(self.assignee).and_then(|(id, _)| *id)
    }

    pub fn selected_project(&self) -> Option<ProjectId> {
        self.projects.get(self.project).map(|(id, _)| *id)
    }

    /// Text shown for a selector field.
    pub fn selector_label(&self, field: usize) -> &str {
        match field {
            STATUS_FIELD => format_status(self.selected_status()),
            PRIORITY_FIELD => format_priority(self.selected_priority()),
            ASSIGNEE_FIELD => self.assignees.get(self.assignee).map_or("Unassigned", |(_, n)| n.as_str()),
            PROJECT_FIELD => self.projects.get(self.project).map_or("None", |(_, n)| n.as_str()),
            _ => "",
        }
    }

    fn parse_due(&self, today: NaiveDate) -> Result<Option<NaiveDate>, FormError> {
        let raw = self.due.value.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        parse_due_input(raw, today)
            .map(Some)
            .ok_or_else(|| FormError::BadDueDate(raw.to_string()))
    }

    pub fn to_draft(&self, today: NaiveDate) -> Result<TaskDraft, FormError> {
        let project = self.selected_project().ok_or(FormError::NoProject)?;
        let mut draft = TaskDraft::new(self.title.value.clone(), project)
            .with_status(self.selected_status())
            .with_priority(self.selected_priority());
        draft.description = normalise_optional_text(Some(self.description.value.clone()));
        draft.assignee_id = self.selected_assignee();
        draft.due_date = self.parse_due(today)?;
        Ok(draft)
    }

    /// A patch naming every editable field.
    pub fn to_patch(&self, today: NaiveDate) -> Result<TaskPatch, FormError> {
        Ok(TaskPatch {
            title: Some(self.title.value.clone()),
            description: Some(normalise_optional_text(Some(self.description.value.clone()))),
            status: Some(self.selected_status()),
            priority: Some(self.selected_priority()),
            assignee_id: Some(self.selected_assignee()),
            due_date: Some(self.parse_due(today)?),
        })
    }
}

/// New project form.
pub struct ProjectForm {
    pub name: InputField,
    pub description: InputField,
    pub color: usize,
    pub current_field: usize,
}

impl Default for ProjectForm {
    fn default() -> Self {
        let mut form = Self {
            name: InputField::new(),
            description: InputField::new(),
            color: 0,
            current_field: NAME_FIELD,
        };
        form.name.active = true;
        form
    }
}

impl ProjectForm {
    pub fn field_count(&self) -> usize {
        COLOR_FIELD + 1
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = cycle(self.current_field, self.field_count(), false);
        self.update_active_field();
    }

    fn update_active_field(&mut self) {
        self.name.active = self.current_field == NAME_FIELD;
        self.description.active = self.current_field == PROJECT_DESCRIPTION_FIELD;
    }

    pub fn active_input(&self) -> Option<&InputField> {
        match self.current_field {
            NAME_FIELD => Some(&self.name),
            PROJECT_DESCRIPTION_FIELD => Some(&self.description),
            _ => None,
        }
    }

    fn active_input_mut(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            NAME_FIELD => Some(&mut self.name),
            PROJECT_DESCRIPTION_FIELD => Some(&mut self.description),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.active_input_mut() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input_mut() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.active_input_mut() {
            field.handle_delete();
        }
    }

    pub fn handle_left_right(&mut self, right: bool) {
        if self.current_field == COLOR_FIELD {
            self.color = cycle(self.color, COLOR_OPTIONS.len(), right);
        } else if let Some(field) = self.active_input_mut() {
            field.move_cursor(right);
        }
    }

    /// `(hex, name)` of the selected palette entry.
    pub fn selected_color(&self) -> (&'static str, &'static str) {
        COLOR_OPTIONS[self.color % COLOR_OPTIONS.len()]
    }

    pub fn to_draft(&self, owner: UserId) -> ProjectDraft {
        let mut draft = ProjectDraft::new(self.name.value.clone(), owner).with_color(self.selected_color().0);
        draft.description = normalise_optional_text(Some(self.description.value.clone()));
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::Seed;
    use chrono::{TimeZone, Utc};

    fn seed() -> Seed {
        Seed::builtin(Utc.with_ymd_and_hms(2024, 3, 13, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_new_form_defaults() {
        let s = seed();
        let form = TaskForm::new(&s.users, &s.projects, Some(ProjectId(2)), Status::Review);
        let today = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        let draft = form.to_draft(today).unwrap();
        assert_eq!(draft.project_id, ProjectId(2));
        assert_eq!(draft.status, Status::Review);
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.assignee_id, None);
        assert_eq!(draft.due_date, None);
    }

    #[test]
    fn test_selectors_cycle() {
        let s = seed();
        let mut form = TaskForm::new(&s.users, &s.projects, None, Status::Todo);
        form.current_field = ASSIGNEE_FIELD;
        form.handle_left_right(false);
        assert_eq!(form.selected_assignee(), Some(UserId(4)));
        form.handle_left_right(true);
        form.handle_left_right(true);
        assert_eq!(form.selected_assignee(), Some(UserId(1)));
        assert_eq!(form.selector_label(ASSIGNEE_FIELD), "Sarah Chen");
    }

    #[test]
    fn test_edit_form_round_trips_task() {
        let s = seed();
        let task = &s.tasks[1];
        let mut form = TaskForm::from_task(task, &s.users, &s.projects);
        assert_eq!(form.field_count(), 6);
        form.current_field = DUE_FIELD;
        form.due.clear();
        "tomorrow".chars().for_each(|c| form.handle_char(c));

        let today = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        let patch = form.to_patch(today).unwrap();
        assert_eq!(patch.title.as_deref(), Some(task.title.as_str()));
        assert_eq!(patch.assignee_id, Some(task.assignee_id));
        assert_eq!(patch.due_date, Some(NaiveDate::from_ymd_opt(2024, 3, 14)));
    }

    #[test]
    fn test_bad_due_date() {
        let s = seed();
        let mut form = TaskForm::new(&s.users, &s.projects, None, Status::Todo);
        form.due = InputField::with_value("whenever");
        let today = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        assert_eq!(form.to_draft(today), Err(FormError::BadDueDate("whenever".into())));
    }

    #[test]
    fn test_project_form() {
        let mut form = ProjectForm::default();
        "Docs Site".chars().for_each(|c| form.handle_char(c));
        form.next_field();
        form.next_field();
        form.handle_left_right(true);
        let draft = form.to_draft(UserId(2));
        assert_eq!(draft.name, "Docs Site");
        assert_eq!(draft.color, "#8B5CF6");
        assert_eq!(draft.description, None);
    }
}
