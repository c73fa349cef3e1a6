//! # Taskboard
//!
//! An in-memory project board for the terminal: a kanban view of tasks by
//! status, a dashboard, a two-week timeline and a team roster, all computed
//! from one store.
//!
//! ## Key Features
//!
//! - **Single store**: users, projects, tasks and an activity log, mutated only
//!   through validated operations that return typed errors
//! - **Derived views**: status buckets, progress, overdue counts and timeline
//!   bars are recomputed from the store on every read, never cached
//! - **Kanban board**: move cards between To Do, In Progress, Review and Done,
//!   add and edit tasks, comment, and create projects
//! - **Seeded sessions**: start from built-in demo data or a JSON seed file;
//!   nothing is written back
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the board
//! tb
//!
//! # Board for one project
//! tb board --project 2
//!
//! # Reports
//! tb dashboard
//! tb timeline --week-start monday
//! tb list --overdue
//! tb view 3
//! ```
//!
//! Settings live in `~/.taskboard/config.toml` (see [`config::Config`]).

pub mod activity;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod format;
pub mod logging;
pub mod project;
pub mod seed;
pub mod store;
pub mod task;
pub mod user;
pub mod views;
pub mod tui {
    pub mod board;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
}
