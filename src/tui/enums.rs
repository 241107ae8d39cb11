//! Enumerations for TUI state management.

/// Application state for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    TaskList,
    TaskDetail,
    AddTask,
    Help,
    Confirm,
}

/// Which form a country lookup was requested for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FormTarget {
    Add,
    Edit,
}
