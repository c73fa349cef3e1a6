//! Command implementations for the CLI interface.
//!
//! Every command builds a fresh store from the seed, then either hands it to the
//! interactive board or prints one of the read-only projections.

use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use serde_json::json;
use tracing::{info, warn};

use crate::activity::format_ago;
use crate::config::Config;
use crate::error::{AppResult, StoreError};
use crate::fields::*;
use crate::format::{format_due_relative, local_now, progress_bar, truncate};
use crate::project::ProjectId;
use crate::seed::Seed;
use crate::store::{SystemClock, TaskStore};
use crate::task::{Task, TaskId};
use crate::tui::run::run_board_tui;
use crate::user::UserId;
use crate::views::{self, TimelineWindow, TIMELINE_DAYS};

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive kanban board.
    Board {
        /// Show only this project's tasks.
        #[arg(long)]
        project: Option<u64>,
    },

    /// List tasks with optional filters.
    List {
        /// Filter by project ID.
        #[arg(long)]
        project: Option<u64>,
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by assignee user ID.
        #[arg(long, conflicts_with = "unassigned")]
        assignee: Option<u64>,
        /// Only tasks with no assignee.
        #[arg(long)]
        unassigned: bool,
        /// Only overdue tasks.
        #[arg(long)]
        overdue: bool,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// View a single task with its comments.
    View {
        /// Task ID.
        id: u64,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Status counts, overdue tasks, project progress and recent activity.
    Dashboard {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Two-week timeline of tasks by due date.
    Timeline {
        /// First day of the window (overrides config).
        #[arg(long, value_enum)]
        week_start: Option<WeekStart>,
    },

    /// Team roster.
    Team,

    /// Projects with task counts and progress.
    Projects,

    /// Generate shell completions.
    Completions {
        /// Shell type.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Seed a store according to the config.
pub fn open_store(config: &Config) -> AppResult<TaskStore> {
    let seed = match &config.seed {
        Some(path) => {
            info!(path = %path.display(), "loading seed file");
            Seed::load(path)?
        }
        None => Seed::builtin(Utc::now()),
    };
    let mut store = TaskStore::from_seed(seed, SystemClock)?;
    if let Err(e) = store.set_current_user(config.current_user) {
        warn!(user_id = %config.current_user, error = %e, "configured current user unknown, keeping default");
    }
    Ok(store)
}

/// Run a command against a freshly seeded store.
pub fn dispatch(command: Commands, config: &Config) -> AppResult<()> {
    if let Commands::Completions { shell } = command {
        cmd_completions(shell);
        return Ok(());
    }

    let store = open_store(config)?;
    let now = local_now(Utc::now());

    match command {
        Commands::Board { project } => {
            let project = project.map(ProjectId).or(config.default_project);
            cmd_board(store, config, project)
        }
        Commands::List { project, status, assignee, unassigned, overdue, json } => {
            let filter = ListFilter {
                project: project.map(ProjectId),
                status,
                assignee: assignee.map(UserId),
                unassigned,
                overdue,
            };
            cmd_list(&store, &filter, now, json)
        }
        Commands::View { id, json } => cmd_view(&store, TaskId(id), now, json),
        Commands::Dashboard { json } => cmd_dashboard(&store, now, json),
        Commands::Timeline { week_start } => {
            cmd_timeline(&store, now.date(), week_start.unwrap_or(config.week_start));
            Ok(())
        }
        Commands::Team => {
            cmd_team(&store);
            Ok(())
        }
        Commands::Projects => {
            cmd_projects(&store);
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

pub fn cmd_board(store: TaskStore, config: &Config, project: Option<ProjectId>) -> AppResult<()> {
    if let Some(p) = project {
        if store.project(p).is_none() {
            return Err(StoreError::ProjectNotFound(p).into());
        }
    }
    run_board_tui(store, config, project)?;
    Ok(())
}

/// Filters for `list`.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub project: Option<ProjectId>,
    pub status: Option<Status>,
    pub assignee: Option<UserId>,
    pub unassigned: bool,
    pub overdue: bool,
}

impl ListFilter {
    pub fn matches(&self, t: &Task, now: NaiveDateTime) -> bool {
        if self.project.is_some_and(|p| t.project_id != p) {
            return false;
        }
        if self.status.is_some_and(|s| t.status != s) {
            return false;
        }
        if self.assignee.is_some() && t.assignee_id != self.assignee {
            return false;
        }
        if self.unassigned && t.assignee_id.is_some() {
            return false;
        }
        if self.overdue && !views::is_overdue(t, now) {
            return false;
        }
        true
    }
}

pub fn cmd_list(store: &TaskStore, filter: &ListFilter, now: NaiveDateTime, as_json: bool) -> AppResult<()> {
    let today = now.date();
    let tasks: Vec<&Task> = store.tasks().iter().filter(|t| filter.matches(t, now)).collect();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    println!(
        "{:<5} {:<12} {:<7} {:<10} {:<14} {:<18} {}",
        "ID", "Status", "Pri", "Due", "Assignee", "Project", "Title"
    );
    for t in &tasks {
        let assignee = t
            .assignee_id
            .and_then(|id| store.user(id))
            .map_or_else(|| "-".to_string(), |u| u.name.clone());
        let project = store.project(t.project_id).map_or("-", |p| p.name.as_str());
        let mut due = format_due_relative(t.due_date, today);
        if views::is_overdue(t, now) {
            due.push('!');
        }
        println!(
            "{:<5} {:<12} {:<7} {:<10} {:<14} {:<18} {}",
            t.id,
            format_status(t.status),
            format_priority(t.priority),
            due,
            truncate(&assignee, 14),
            truncate(project, 18),
            t.title
        );
    }
    if tasks.is_empty() {
        println!("No tasks match.");
    }
    Ok(())
}

pub fn cmd_view(store: &TaskStore, id: TaskId, now: NaiveDateTime, as_json: bool) -> AppResult<()> {
    let today = now.date();
    let task = store.task(id).ok_or(StoreError::TaskNotFound(id))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(task)?);
        return Ok(());
    }

    let user_name = |uid: UserId| store.user(uid).map_or_else(|| format!("user {uid}"), |u| u.name.clone());
    let project = store
        .project(task.project_id)
        .map_or_else(|| task.project_id.to_string(), |p| p.name.clone());

    println!("Task #{}: {}", task.id, task.title);
    println!("Project:     {}", project);
    println!("Status:      {}", format_status(task.status));
    println!("Priority:    {}", format_priority(task.priority));
    println!("Assignee:    {}", task.assignee_id.map_or_else(|| "Unassigned".to_string(), user_name));
    match task.due_date {
        Some(d) => {
            let late = if views::is_overdue(task, now) { " (overdue)" } else { "" };
            println!("Due:         {} ({}){}", d.format("%b %-d, %Y"), format_due_relative(Some(d), today), late);
        }
        None => println!("Due:         -"),
    }
    println!("Created:     {}", task.created_at.with_timezone(&Local).format("%b %-d, %Y"));
    println!("Updated:     {}", task.updated_at.with_timezone(&Local).format("%b %-d, %Y %-I:%M %p"));
    println!();
    println!("Description:");
    println!("  {}", task.description.as_deref().unwrap_or("No description provided."));
    println!();
    println!("Comments ({}):", task.comments.len());
    if task.comments.is_empty() {
        println!("  No comments yet.");
    }
    for c in &task.comments {
        println!(
            "  {} · {}",
            user_name(c.author_id),
            c.created_at.with_timezone(&Local).format("%b %-d, %-I:%M %p")
        );
        println!("    {}", c.content);
    }
    Ok(())
}

pub fn cmd_dashboard(store: &TaskStore, now: NaiveDateTime, as_json: bool) -> AppResult<()> {
    let summary = views::dashboard_summary(store.tasks(), now);
    let projects = views::project_summaries(store.projects(), store.tasks());
    let recent = views::recent_activity(store.activity(), 5);

    if as_json {
        let value = json!({
            "summary": summary,
            "projects": projects.iter().map(|p| json!({
                "id": p.project.id,
                "name": p.project.name,
                "taskCount": p.task_count,
                "progress": p.progress,
            })).collect::<Vec<_>>(),
            "recentActivity": recent,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let cards: Vec<String> = Status::ALL
        .iter()
        .map(|&s| {
            let label = if s == Status::Done { "Completed" } else { format_status(s) };
            format!("{label}: {}", summary.counts.get(s))
        })
        .collect();
    println!("{}   Overdue: {}", cards.join("   "), summary.overdue);
    println!();
    println!("Project Progress");
    for p in &projects {
        println!(
            "  {:<22} {} {:>3}%  ({} tasks)",
            truncate(&p.project.name, 22),
            progress_bar(p.progress, 20),
            p.progress,
            p.task_count
        );
    }
    println!();
    println!("Recent Activity");
    let stamp = store.now();
    for a in recent {
        let who = a
            .user_id
            .and_then(|id| store.user(id))
            .map_or("Someone", |u| u.name.as_str());
        println!("  {} {} · {}", who, a.action, format_ago(a.created_at, stamp));
    }
    Ok(())
}

pub fn cmd_timeline(store: &TaskStore, today: NaiveDate, week_start: WeekStart) {
    let window = TimelineWindow::containing(today, week_start);
    let entries = views::timeline(store.tasks(), &window);

    println!("{} - {}", window.start.format("%B %-d"), window.end().format("%B %-d, %Y"));
    let mut header = format!("{:<26}", "");
    for day in window.days() {
        let marker = if day == today { '*' } else { ' ' };
        header.push_str(&format!("{:>2}{}", day.format("%-d"), marker));
    }
    println!("{}", header);

    if entries.is_empty() {
        println!("No tasks scheduled in this period");
        return;
    }
    for e in entries {
        let mut row = format!("{:<26}", truncate(&e.task.title, 25));
        for d in 0..TIMELINE_DAYS as u32 {
            row.push_str(if d >= e.start_day && d <= e.end_day { "███" } else { " · " });
        }
        println!("{} {}", row, format_status(e.task.status));
    }
}

pub fn cmd_team(store: &TaskStore) {
    println!("{:<4} {:<18} {:<24} {:<8} {}", "ID", "Name", "Email", "Role", "Projects");
    for u in store.users() {
        let projects = views::projects_for_user(store.projects(), u.id);
        println!(
            "{:<4} {:<18} {:<24} {:<8} {} active",
            u.id,
            truncate(&u.name, 18),
            truncate(&u.email, 24),
            format_role(u.role),
            projects.len()
        );
    }
}

pub fn cmd_projects(store: &TaskStore) {
    println!("{:<4} {:<22} {:<9} {:<16} {:<8} {:<6} {}", "ID", "Name", "Color", "Owner", "Members", "Tasks", "Progress");
    for s in views::project_summaries(store.projects(), store.tasks()) {
        let owner = store.user(s.project.owner_id).map_or("-", |u| u.name.as_str());
        println!(
            "{:<4} {:<22} {:<9} {:<16} {:<8} {:<6} {} {}%",
            s.project.id,
            truncate(&s.project.name, 22),
            s.project.color,
            truncate(owner, 16),
            s.project.member_ids.len(),
            s.task_count,
            progress_bar(s.progress, 10),
            s.progress
        );
    }
}

pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
