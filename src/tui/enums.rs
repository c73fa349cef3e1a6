//! Enumerations for board state.

/// What the board is currently showing on top of the columns.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Board,
    Detail,
    Filter,
    AddTask,
    EditTask,
    AddComment,
    AddProject,
    Help,
}

impl Mode {
    /// Modes that capture typed characters.
    pub fn is_text_entry(self) -> bool {
        matches!(
            self,
            Mode::Filter | Mode::AddTask | Mode::EditTask | Mode::AddComment | Mode::AddProject
        )
    }
}
