//! Color constants for the board.

use ratatui::style::Color;

use crate::fields::{Priority, Status};
use crate::project::Project;

pub const SLATE: Color = Color::Rgb(100, 116, 139);
pub const BLUE: Color = Color::Rgb(59, 130, 246);
pub const AMBER: Color = Color::Rgb(245, 158, 11);
pub const GREEN: Color = Color::Rgb(16, 185, 129);
pub const RED: Color = Color::Rgb(239, 68, 68);
/// Focused form field border.
pub const GOLD: Color = Color::Rgb(255, 215, 0);

/// Column accent for a status.
pub fn status_color(status: Status) -> Color {
    match status {
        Status::Todo => SLATE,
        Status::InProgress => BLUE,
        Status::Review => AMBER,
        Status::Done => GREEN,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => RED,
        Priority::Medium => AMBER,
        Priority::Low => SLATE,
    }
}

/// A project's own colour, falling back to blue for anything unparsable.
pub fn project_color(project: &Project) -> Color {
    project.rgb().map_or(BLUE, |(r, g, b)| Color::Rgb(r, g, b))
}
