//! Board entry point and terminal setup.

use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::info;

use crate::config::Config;
use crate::project::ProjectId;
use crate::store::TaskStore;
use crate::tui::board::BoardApp;

/// Take over the terminal and run the board until the user quits.
/// The store, and every change made on the board, is dropped on return.
pub fn run_board_tui(store: TaskStore, config: &Config, project: Option<ProjectId>) -> io::Result<()> {
    info!(?project, week_start = ?config.week_start, "starting board");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = BoardApp::new(store, project);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    info!(activity = app.store().activity().len(), "board closed");
    result
}
