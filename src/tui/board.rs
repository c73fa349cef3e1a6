//! Kanban board interface.
//!
//! Tasks are laid out in four columns by status. Cards move between columns
//! with Ctrl+Left/Right (or `<`/`>`), and every edit goes through the store.
//! The board subscribes to store events and recomputes its columns whenever
//! something changed, so it never holds stale copies of tasks.

use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::debug;

use crate::activity::format_ago;
use crate::fields::*;
use crate::format::{format_due_relative, local_now, wrap_words};
use crate::project::ProjectId;
use crate::store::{MoveOutcome, TaskStore};
use crate::task::{Task, TaskId};
use crate::tui::colors::{priority_color, project_color, status_color, GOLD, RED};
use crate::tui::enums::Mode;
use crate::tui::input::InputField;
use crate::tui::task_form::*;
use crate::views;

const CARD_HEIGHT: usize = 5;

/// Board state on top of the store.
pub struct BoardApp {
    store: TaskStore,
    project_filter: Option<ProjectId>,
    mode: Mode,
    selected_column: usize,
    selected_card: usize,
    column_scroll_offsets: [usize; 4],
    columns: [Vec<TaskId>; 4],
    status_message: String,
    filter: InputField,
    task_form: Option<TaskForm>,
    project_form: ProjectForm,
    comment: InputField,
    /// Mode the comment popup was opened from.
    comment_return: Mode,
    dirty: Rc<Cell<bool>>,
}

impl BoardApp {
    pub fn new(mut store: TaskStore, project_filter: Option<ProjectId>) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        store.subscribe(move |event| {
            debug!(?event, "store changed");
            flag.set(true);
        });

        let mut app = BoardApp {
            store,
            project_filter,
            mode: Mode::Board,
            selected_column: 0,
            selected_card: 0,
            column_scroll_offsets: [0; 4],
            columns: Default::default(),
            status_message: String::new(),
            filter: InputField::new(),
            task_form: None,
            project_form: ProjectForm::default(),
            comment: InputField::new(),
            comment_return: Mode::Board,
            dirty,
        };
        app.update_columns();
        app
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Task ids per column, in board order.
    pub fn columns(&self) -> &[Vec<TaskId>; 4] {
        &self.columns
    }

    fn local_now(&self) -> NaiveDateTime {
        local_now(self.store.now())
    }

    fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    /// Recompute columns from the store under the project and text filters.
    fn update_columns(&mut self) {
        let filter = self.filter.value.as_str();
        let project = self.project_filter;
        let buckets = views::group_by_status(
            self.store
                .tasks()
                .iter()
                .filter(|t| project.map_or(true, |p| t.project_id == p))
                .filter(|t| views::matches_filter(t, filter)),
        );
        for (status, tasks) in buckets.iter() {
            self.columns[status.column()] = tasks.iter().map(|t| t.id).collect();
        }
        self.clamp_selection();
    }

    fn refresh_if_dirty(&mut self) {
        if self.dirty.replace(false) {
            self.update_columns();
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.columns[self.selected_column].len();
        if len == 0 {
            self.selected_card = 0;
            self.column_scroll_offsets[self.selected_column] = 0;
        } else if self.selected_card >= len {
            self.selected_card = len - 1;
        }
    }

    fn selected_task_id(&self) -> Option<TaskId> {
        self.columns[self.selected_column].get(self.selected_card).copied()
    }

    fn selected_task(&self) -> Option<&Task> {
        self.selected_task_id().and_then(|id| self.store.task(id))
    }

    fn select_task(&mut self, id: TaskId) {
        for (col, ids) in self.columns.iter().enumerate() {
            if let Some(pos) = ids.iter().position(|&t| t == id) {
                self.selected_column = col;
                self.selected_card = pos;
                return;
            }
        }
        self.clamp_selection();
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn project_label(&self) -> String {
        match self.project_filter.and_then(|id| self.store.project(id)) {
            Some(p) => p.name.clone(),
            None => "All Projects".to_string(),
        }
    }

    /// Step through All Projects → each project → All Projects.
    fn cycle_project_filter(&mut self) {
        let ids: Vec<ProjectId> = self.store.projects().iter().map(|p| p.id).collect();
        self.project_filter = match self.project_filter {
            None => ids.first().copied(),
            Some(current) => ids
                .iter()
                .position(|&id| id == current)
                .and_then(|i| ids.get(i + 1).copied()),
        };
        self.update_columns();
        self.set_status_message(format!("Showing {}", self.project_label()));
    }

    /// Move the selected card one column left or right.
    fn move_selected(&mut self, right: bool) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let (id, from) = (task.id, task.status);
        let to = if right { from.next() } else { from.prev() };
        let Some(to) = to else {
            return;
        };

        match self.store.move_task(id, to) {
            Ok(MoveOutcome::Moved { to, .. }) => {
                self.refresh_if_dirty();
                self.select_task(id);
                self.set_status_message(format!("Moved task to {}", format_status(to)));
            }
            Ok(MoveOutcome::Unchanged) => {}
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    /// Handle one key press. Returns true when the board should close.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        match self.mode {
            Mode::Board => return self.handle_board_key(key),
            Mode::Detail => self.handle_detail_key(key),
            Mode::Filter => self.handle_filter_key(key),
            Mode::AddTask | Mode::EditTask => self.handle_task_form_key(key),
            Mode::AddComment => self.handle_comment_key(key),
            Mode::AddProject => self.handle_project_form_key(key),
            Mode::Help => self.mode = Mode::Board,
        }
        false
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> bool {
        self.status_message.clear();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,

            KeyCode::Left if ctrl => self.move_selected(false),
            KeyCode::Right if ctrl => self.move_selected(true),
            KeyCode::Char('<') => self.move_selected(false),
            KeyCode::Char('>') => self.move_selected(true),

            KeyCode::Left => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right => {
                if self.selected_column < self.columns.len() - 1 {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up => {
                self.selected_card = self.selected_card.saturating_sub(1);
            }
            KeyCode::Down => {
                let len = self.columns[self.selected_column].len();
                if self.selected_card + 1 < len {
                    self.selected_card += 1;
                }
            }

            KeyCode::Enter => {
                if self.selected_task_id().is_some() {
                    self.mode = Mode::Detail;
                }
            }
            KeyCode::Char('n') => self.open_add_task(),
            KeyCode::Char('e') => self.open_edit_task(),
            KeyCode::Char('c') => self.open_comment(),
            KeyCode::Char('P') => {
                self.project_form = ProjectForm::default();
                self.mode = Mode::AddProject;
            }
            KeyCode::Char('p') => self.cycle_project_filter(),
            KeyCode::Char('/') => {
                self.mode = Mode::Filter;
            }
            KeyCode::Char('h') | KeyCode::Char('?') => self.mode = Mode::Help,
            _ => {}
        }
        false
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => self.mode = Mode::Board,
            KeyCode::Char('e') => self.open_edit_task(),
            KeyCode::Char('c') => self.open_comment(),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.filter.clear();
                self.mode = Mode::Board;
                self.status_message.clear();
            }
            KeyCode::Enter => {
                self.mode = Mode::Board;
                if self.filter.value.trim().is_empty() {
                    self.set_status_message("Filter cleared");
                } else {
                    let shown: usize = self.columns.iter().map(Vec::len).sum();
                    self.set_status_message(format!("Filter: '{}' ({} tasks shown)", self.filter.value, shown));
                }
                return;
            }
            KeyCode::Backspace => self.filter.handle_backspace(),
            KeyCode::Left => self.filter.move_cursor_left(),
            KeyCode::Right => self.filter.move_cursor_right(),
            KeyCode::Char(c) => self.filter.handle_char(c),
            _ => return,
        }
        self.update_columns();
    }

    fn open_add_task(&mut self) {
        if self.store.projects().is_empty() {
            self.set_status_message("Create a project first (P)");
            return;
        }
        let status = Status::ALL[self.selected_column];
        self.task_form = Some(TaskForm::new(
            self.store.users(),
            self.store.projects(),
            self.project_filter,
            status,
        ));
        self.mode = Mode::AddTask;
    }

    fn open_edit_task(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let form = TaskForm::from_task(task, self.store.users(), self.store.projects());
        self.task_form = Some(form);
        self.mode = Mode::EditTask;
    }

    fn open_comment(&mut self) {
        if self.selected_task_id().is_none() {
            return;
        }
        self.comment.clear();
        self.comment_return = self.mode;
        self.mode = Mode::AddComment;
    }

    fn handle_task_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.task_form.as_mut() else {
            self.mode = Mode::Board;
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.task_form = None;
                self.mode = Mode::Board;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.handle_left_right(false),
            KeyCode::Right => form.handle_left_right(true),
            KeyCode::Backspace => form.handle_backspace(),
            KeyCode::Delete => form.handle_delete(),
            KeyCode::Enter => self.submit_task_form(),
            KeyCode::Char(c) => form.handle_char(c),
            _ => {}
        }
    }

    fn submit_task_form(&mut self) {
        let Some(form) = self.task_form.as_ref() else {
            return;
        };
        let today = self.today();

        let result = match form.editing {
            Some(id) => match form.to_patch(today) {
                Ok(patch) => self.store.update_task(id, patch).map(|t| (t.id, "Task updated")),
                Err(e) => {
                    self.set_status_message(format!("Error: {e}"));
                    return;
                }
            },
            None => match form.to_draft(today) {
                Ok(draft) => self.store.add_task(draft).map(|t| (t.id, "Task created")),
                Err(e) => {
                    self.set_status_message(format!("Error: {e}"));
                    return;
                }
            },
        };

        match result {
            Ok((id, msg)) => {
                self.task_form = None;
                self.mode = Mode::Board;
                self.refresh_if_dirty();
                self.select_task(id);
                self.set_status_message(msg);
            }
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn handle_comment_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = self.comment_return,
            KeyCode::Enter => self.submit_comment(),
            KeyCode::Backspace => self.comment.handle_backspace(),
            KeyCode::Delete => self.comment.handle_delete(),
            KeyCode::Left => self.comment.move_cursor_left(),
            KeyCode::Right => self.comment.move_cursor_right(),
            KeyCode::Char(c) => self.comment.handle_char(c),
            _ => {}
        }
    }

    fn submit_comment(&mut self) {
        let Some(task_id) = self.selected_task_id() else {
            self.mode = Mode::Board;
            return;
        };
        let Some(author) = self.store.current_user() else {
            self.set_status_message("Error: no current user to comment as");
            return;
        };
        match self.store.add_comment(task_id, author, &self.comment.value).map(|c| c.id) {
            Ok(_) => {
                self.comment.clear();
                self.mode = self.comment_return;
                self.refresh_if_dirty();
                self.select_task(task_id);
                self.set_status_message("Comment added");
            }
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn handle_project_form_key(&mut self, key: KeyEvent) {
        let form = &mut self.project_form;
        match key.code {
            KeyCode::Esc => self.mode = Mode::Board,
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.handle_left_right(false),
            KeyCode::Right => form.handle_left_right(true),
            KeyCode::Backspace => form.handle_backspace(),
            KeyCode::Delete => form.handle_delete(),
            KeyCode::Enter => self.submit_project_form(),
            KeyCode::Char(c) => form.handle_char(c),
            _ => {}
        }
    }

    fn submit_project_form(&mut self) {
        let Some(owner) = self.store.current_user() else {
            self.set_status_message("Error: no current user to own the project");
            return;
        };
        let draft = self.project_form.to_draft(owner);
        match self.store.add_project(draft).map(|p| (p.id, p.name.clone())) {
            Ok((id, name)) => {
                self.project_filter = Some(id);
                self.mode = Mode::Board;
                self.dirty.set(false);
                self.update_columns();
                self.set_status_message(format!("Created project {name}"));
            }
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(self.handle_key(key));
            }
        }
        Ok(false)
    }

    /// Main event loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.refresh_if_dirty();
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        match self.mode {
            Mode::Detail => self.render_detail_popup(f),
            Mode::AddTask | Mode::EditTask => self.render_task_form(f),
            Mode::AddComment => self.render_comment_popup(f),
            Mode::AddProject => self.render_project_form(f),
            Mode::Help => self.render_help(f),
            Mode::Board | Mode::Filter => {}
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled("TASK BOARD", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
        ];
        match self.project_filter.and_then(|id| self.store.project(id)) {
            Some(p) => {
                let progress = views::project_progress(self.store.tasks(), p.id);
                spans.push(Span::styled(
                    p.name.clone(),
                    Style::default().fg(project_color(p)).add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::styled(
                    format!("  {}% complete", progress),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
                ));
            }
            None => spans.push(Span::styled(
                "All Projects",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            )),
        }
        if let Some(user) = self.store.current_user().and_then(|id| self.store.user(id)) {
            spans.push(Span::raw(format!("  [{}]", user.name)));
        }

        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        for (i, &column_area) in columns_layout.iter().enumerate() {
            self.render_column(f, column_area, Status::ALL[i]);
        }
    }

    fn render_column(&mut self, f: &mut Frame, area: Rect, status: Status) {
        let column_index = status.column();
        let is_selected = column_index == self.selected_column && self.mode == Mode::Board;
        let accent = status_color(status);

        let border_style = if column_index == self.selected_column {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let title = format!("{} ({})", format_status(status), self.columns[column_index].len());
        let block = Block::default().borders(Borders::ALL).title(title).border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        if self.columns[column_index].is_empty() {
            let empty = Paragraph::new("No tasks")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            f.render_widget(empty, inner);
            return;
        }

        let available_height = inner.height as usize;
        let visible_cards = (available_height / CARD_HEIGHT).max(1);

        let scroll_offset = if column_index == self.selected_column {
            let start = self.column_scroll_offsets[column_index];
            if self.selected_card < start {
                self.selected_card
            } else if self.selected_card >= start + visible_cards {
                self.selected_card + 1 - visible_cards
            } else {
                start
            }
        } else {
            self.column_scroll_offsets[column_index]
        };
        self.column_scroll_offsets[column_index] = scroll_offset;

        let cards = &self.columns[column_index];
        let mut current_y = 0;
        let mut rendered = 0;
        for (card_index, &task_id) in cards.iter().enumerate().skip(scroll_offset) {
            if current_y + CARD_HEIGHT > available_height {
                break;
            }
            let Some(task) = self.store.task(task_id) else {
                continue;
            };
            let card_area = Rect {
                x: inner.x,
                y: inner.y + current_y as u16,
                width: inner.width,
                height: CARD_HEIGHT as u16,
            };
            let selected = is_selected && card_index == self.selected_card;
            self.render_card(f, card_area, task, selected, accent);
            current_y += CARD_HEIGHT;
            rendered += 1;
        }

        if scroll_offset > 0 {
            let indicator = Paragraph::new(format!("▲ +{} above", scroll_offset)).style(Style::default().fg(Color::Cyan));
            f.render_widget(indicator, Rect { height: 1, ..inner });
        }
        let remaining = cards.len().saturating_sub(scroll_offset + rendered);
        if remaining > 0 && inner.height > 0 {
            let indicator = Paragraph::new(format!("▼ +{} below", remaining)).style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    y: inner.y + inner.height - 1,
                    height: 1,
                    ..inner
                },
            );
        }
    }

    fn render_card(&self, f: &mut Frame, area: Rect, task: &Task, is_selected: bool, accent: Color) {
        let style = if is_selected {
            Style::default().bg(accent).fg(Color::Black).add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(Color::DarkGray)
        };
        let local = self.local_now();
        let today = local.date();

        let mut lines = vec![Line::from(vec![
            Span::raw(format!("#{} ", task.id)),
            Span::styled(
                format_priority(task.priority),
                Style::default().fg(if is_selected { Color::Black } else { priority_color(task.priority) }),
            ),
        ])];

        let width = area.width.saturating_sub(2) as usize;
        lines.extend(wrap_words(&task.title, width, 2).into_iter().map(Line::from));

        let assignee = task
            .assignee_id
            .and_then(|id| self.store.user(id))
            .map_or('-', |u| u.initial());
        let mut footer = vec![Span::raw(format!("{} ", assignee))];
        if task.due_date.is_some() {
            let due = format_due_relative(task.due_date, today);
            if views::is_overdue(task, local) {
                footer.push(Span::styled(due, Style::default().fg(RED).add_modifier(Modifier::BOLD)));
            } else {
                footer.push(Span::raw(due));
            }
        }
        if !task.comments.is_empty() {
            footer.push(Span::raw(format!("  {} comments", task.comments.len())));
        }
        lines.push(Line::from(footer));

        let card = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .style(style);
        f.render_widget(card, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if self.mode == Mode::Filter {
            format!("Filter: {} | Enter to apply, Esc to clear", self.filter.value)
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.mode.is_text_entry() {
            "Tab: Next field | ←/→: Change selection | Enter: Save | Esc: Cancel".to_string()
        } else {
            let shown: usize = self.columns.iter().map(Vec::len).sum();
            let filter = if self.filter.value.trim().is_empty() {
                String::new()
            } else {
                format!(" [Filter: {}]", self.filter.value)
            };
            format!(
                "Tasks: {}{} | n: New | e: Edit | c: Comment | Ctrl+←/→: Move | p: Project | /: Filter | h: Help",
                shown, filter
            )
        };
        let bg = if self.status_message.starts_with("Error") { RED } else { Color::Blue };
        let status = Paragraph::new(text).style(Style::default().bg(bg).fg(Color::White));
        f.render_widget(status, area);
    }

    fn render_detail_popup(&self, f: &mut Frame) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let area = centered_rect(80, 80, f.area());
        f.render_widget(Clear, area);

        let local = self.local_now();
        let today = local.date();
        let now = self.store.now();
        let user_name = |id| self.store.user(id).map_or_else(|| format!("user {id}"), |u| u.name.clone());
        let project = self
            .store
            .project(task.project_id)
            .map_or_else(|| task.project_id.to_string(), |p| p.name.clone());
        let due = match task.due_date {
            Some(d) if views::is_overdue(task, local) => {
                format!("{} ({}, overdue)", d.format("%b %-d, %Y"), format_due_relative(Some(d), today))
            }
            Some(d) => format!("{} ({})", d.format("%b %-d, %Y"), format_due_relative(Some(d), today)),
            None => "-".to_string(),
        };

        let mut lines = vec![
            Line::from(Span::styled(
                format!("Task #{}: {}", task.id, task.title),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Project:   {}", project)),
            Line::from(vec![
                Span::raw("Status:    "),
                Span::styled(format_status(task.status), Style::default().fg(status_color(task.status))),
            ]),
            Line::from(vec![
                Span::raw("Priority:  "),
                Span::styled(format_priority(task.priority), Style::default().fg(priority_color(task.priority))),
            ]),
            Line::from(format!(
                "Assignee:  {}",
                task.assignee_id.map_or_else(|| "Unassigned".to_string(), user_name)
            )),
            Line::from(format!("Due:       {}", due)),
            Line::from(format!("Created:   {}", format_ago(task.created_at, now))),
            Line::from(format!("Updated:   {}", format_ago(task.updated_at, now))),
            Line::from(""),
            Line::from(Span::styled("Description", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(task.description.as_deref().unwrap_or("No description provided.").to_string()),
            Line::from(""),
            Line::from(Span::styled(
                format!("Comments ({})", task.comments.len()),
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ];
        if task.comments.is_empty() {
            lines.push(Line::from("No comments yet."));
        }
        for c in &task.comments {
            lines.push(Line::from(Span::styled(
                format!("{} · {}", user_name(c.author_id), format_ago(c.created_at, now)),
                Style::default().fg(Color::Cyan),
            )));
            lines.push(Line::from(format!("  {}", c.content)));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Task Details (Enter: close | e: Edit | c: Comment)")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(status_color(task.status)).add_modifier(Modifier::BOLD));
        let popup = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, area);
    }

    fn render_task_form(&self, f: &mut Frame) {
        let Some(form) = self.task_form.as_ref() else {
            return;
        };
        let count = form.field_count();
        let area = centered_rect(60, 90, f.area());
        f.render_widget(Clear, area);

        let title = if form.editing.is_some() { "Edit Task" } else { "New Task" };
        let outer = Block::default().borders(Borders::ALL).title(title).title_alignment(Alignment::Center);
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let mut constraints = vec![Constraint::Length(3); count];
        constraints.push(Constraint::Min(0));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let labels = ["Title *", "Description", "Due (e.g. tomorrow, in 3d, 2024-05-01)", "Status", "Priority", "Assignee", "Project"];
        for (field, label) in labels.iter().enumerate().take(count) {
            let value = match field {
                TITLE_FIELD => form.title.value.clone(),
                DESCRIPTION_FIELD => form.description.value.clone(),
                DUE_FIELD => form.due.value.clone(),
                _ => format!("< {} >", form.selector_label(field)),
            };
            let border = if form.current_field == field {
                Style::default().fg(GOLD)
            } else {
                Style::default()
            };
            let widget = Paragraph::new(value).block(Block::default().borders(Borders::ALL).title(*label).border_style(border));
            f.render_widget(widget, rows[field]);
        }

        if let Some(input) = form.active_input() {
            set_input_cursor(f, rows[form.current_field], input);
        }
    }

    fn render_project_form(&self, f: &mut Frame) {
        let form = &self.project_form;
        let area = centered_rect(50, 50, f.area());
        f.render_widget(Clear, area);

        let outer = Block::default().borders(Borders::ALL).title("New Project").title_alignment(Alignment::Center);
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
            .split(inner);

        let focus = |field: usize| {
            if form.current_field == field {
                Style::default().fg(GOLD)
            } else {
                Style::default()
            }
        };
        let (hex, name) = form.selected_color();
        let swatch = crate::project::parse_hex_color(hex).map_or(Color::Blue, |(r, g, b)| Color::Rgb(r, g, b));

        f.render_widget(
            Paragraph::new(form.name.value.as_str())
                .block(Block::default().borders(Borders::ALL).title("Name *").border_style(focus(NAME_FIELD))),
            rows[0],
        );
        f.render_widget(
            Paragraph::new(form.description.value.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Description")
                    .border_style(focus(PROJECT_DESCRIPTION_FIELD)),
            ),
            rows[1],
        );
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::raw("< "),
                Span::styled("■ ", Style::default().fg(swatch)),
                Span::raw(format!("{} >", name)),
            ]))
            .block(Block::default().borders(Borders::ALL).title("Color").border_style(focus(COLOR_FIELD))),
            rows[2],
        );

        if let Some(input) = form.active_input() {
            set_input_cursor(f, rows[form.current_field], input);
        }
    }

    fn render_comment_popup(&self, f: &mut Frame) {
        let area = centered_rect(60, 20, f.area());
        f.render_widget(Clear, area);
        let title = match self.selected_task() {
            Some(t) => format!("Comment on #{} (Enter: post | Esc: cancel)", t.id),
            None => "Comment".to_string(),
        };
        let input_area = Rect { height: 3.min(area.height), ..area };
        f.render_widget(
            Paragraph::new(self.comment.value.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(GOLD)),
            ),
            input_area,
        );
        set_input_cursor(f, input_area, &self.comment);
    }

    fn render_help(&self, f: &mut Frame) {
        let area = centered_rect(60, 80, f.area());
        f.render_widget(Clear, area);
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::from(Span::styled("Board", bold)),
            Line::from("  ←/→ ↑/↓          Select column / card"),
            Line::from("  Ctrl+←/→  < >    Move card to previous / next column"),
            Line::from("  Enter            Task details"),
            Line::from("  n                New task in this column"),
            Line::from("  e                Edit selected task"),
            Line::from("  c                Comment on selected task"),
            Line::from("  p                Cycle project filter"),
            Line::from("  P                New project"),
            Line::from("  /                Filter by title or description"),
            Line::from("  q/Esc/Ctrl+C     Quit"),
            Line::from(""),
            Line::from(Span::styled("Forms", bold)),
            Line::from("  Tab/↑/↓          Next / previous field"),
            Line::from("  ←/→              Move cursor or change selection"),
            Line::from("  Enter            Save"),
            Line::from("  Esc              Cancel"),
            Line::from(""),
            Line::from(Span::styled("Due dates", bold)),
            Line::from("  today, tomorrow, eow, in 3d, in 2w, friday, next monday, YYYY-MM-DD"),
        ];
        let help = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Help - press any key to return"))
            .wrap(Wrap { trim: false });
        f.render_widget(help, area);
    }
}

/// Place the terminal cursor inside a bordered single-line input.
fn set_input_cursor(f: &mut Frame, area: Rect, input: &InputField) {
    let max = area.width.saturating_sub(2);
    let x = area.x + 1 + (input.cursor as u16).min(max);
    f.set_cursor_position((x, area.y + 1));
}

/// A rect of `percent_x` by `percent_y` centred in `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = (area.width as u32 * percent_x as u32 / 100) as u16;
    let height = (area.height as u32 * percent_y as u32 / 100) as u16;
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::Seed;
    use crate::store::ManualClock;
    use crate::user::UserId;
    use chrono::{TimeZone, Utc};

    fn board(project: Option<ProjectId>) -> BoardApp {
        let now = Utc.with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap();
        let store = TaskStore::from_seed(Seed::builtin(now), ManualClock::new(now)).unwrap();
        BoardApp::new(store, project)
    }

    fn press(app: &mut BoardApp, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(app: &mut BoardApp, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut BoardApp, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn column_ids(app: &BoardApp, status: Status) -> Vec<u64> {
        app.columns()[status.column()].iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_columns_follow_project_filter() {
        let app = board(Some(ProjectId(1)));
        assert_eq!(column_ids(&app, Status::Todo), vec![4]);
        assert_eq!(column_ids(&app, Status::InProgress), vec![2]);
        assert_eq!(column_ids(&app, Status::Review), vec![3]);
        assert_eq!(column_ids(&app, Status::Done), vec![1]);
    }

    #[test]
    fn test_move_card_right_and_back() {
        let mut app = board(Some(ProjectId(1)));
        ctrl(&mut app, KeyCode::Right);
        assert_eq!(app.store().task(TaskId(4)).unwrap().status, Status::InProgress);
        assert_eq!(column_ids(&app, Status::InProgress), vec![2, 4]);
        assert_eq!(app.status_message(), "Moved task to In Progress");

        // Selection follows the card.
        press(&mut app, KeyCode::Char('<'));
        assert_eq!(app.store().task(TaskId(4)).unwrap().status, Status::Todo);
        assert_eq!(column_ids(&app, Status::Todo), vec![4]);
    }

    #[test]
    fn test_move_past_last_column_is_ignored() {
        let mut app = board(Some(ProjectId(1)));
        for _ in 0..3 {
            press(&mut app, KeyCode::Right);
        }
        let before = app.store().activity().len();
        ctrl(&mut app, KeyCode::Right);
        assert_eq!(app.store().task(TaskId(1)).unwrap().status, Status::Done);
        assert_eq!(app.store().activity().len(), before);
    }

    #[test]
    fn test_add_task_through_form() {
        let mut app = board(Some(ProjectId(3)));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode(), Mode::AddTask);
        type_text(&mut app, "Press release");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode(), Mode::Board);
        let task = app.store().tasks().last().unwrap();
        assert_eq!(task.title, "Press release");
        assert_eq!(task.project_id, ProjectId(3));
        assert_eq!(task.status, Status::Todo);
        assert!(column_ids(&app, Status::Todo).contains(&task.id.0));
    }

    #[test]
    fn test_blank_title_keeps_form_open() {
        let mut app = board(None);
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode(), Mode::AddTask);
        assert_eq!(app.status_message(), "Error: task title cannot be empty");
        assert_eq!(app.store().tasks().len(), 10);
    }

    #[test]
    fn test_comment_from_detail() {
        let mut app = board(Some(ProjectId(1)));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode(), Mode::Detail);
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "On it");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode(), Mode::Detail);
        let task = app.store().task(TaskId(4)).unwrap();
        assert_eq!(task.comments.len(), 1);
        assert_eq!(task.comments[0].author_id, UserId(1));
    }

    #[test]
    fn test_comment_cancel_returns_to_opening_view() {
        let mut app = board(Some(ProjectId(1)));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.mode(), Mode::AddComment);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode(), Mode::Detail);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode(), Mode::Board);
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode(), Mode::Board);
        assert!(app.store().task(TaskId(4)).unwrap().comments.is_empty());
    }

    #[test]
    fn test_filter_narrows_columns() {
        let mut app = board(None);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "offline");
        press(&mut app, KeyCode::Enter);
        let shown: usize = app.columns().iter().map(Vec::len).sum();
        assert_eq!(shown, 1);
        assert_eq!(column_ids(&app, Status::Review), vec![8]);
    }

    #[test]
    fn test_cycle_project_filter() {
        let mut app = board(None);
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.status_message(), "Showing Website Redesign");
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.status_message(), "Showing All Projects");
    }

    #[test]
    fn test_add_project_switches_filter() {
        let mut app = board(None);
        press(&mut app, KeyCode::Char('P'));
        type_text(&mut app, "Docs");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode(), Mode::Board);
        assert_eq!(app.store().projects().len(), 4);
        assert!(app.columns().iter().all(Vec::is_empty));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = board(None);
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(ctrl(&mut app, KeyCode::Char('c')));
    }
}
