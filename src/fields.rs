//! Enumerations and field types for task management.
//!
//! This module defines the structured values used to categorise tasks:
//! the priority level and the completion filter applied to the task list.

use std::fmt;

use clap::ValueEnum;

/// Priority classification for task importance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// Picker order for priority selectors.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Completion filter for the task list.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Done,
    NotDone,
}

impl TaskFilter {
    /// Cycle All -> Done -> Not done -> All.
    pub fn next(self) -> Self {
        match self {
            TaskFilter::All => TaskFilter::Done,
            TaskFilter::Done => TaskFilter::NotDone,
            TaskFilter::NotDone => TaskFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskFilter::All => "All",
            TaskFilter::Done => "Done",
            TaskFilter::NotDone => "Not done",
        }
    }
}
