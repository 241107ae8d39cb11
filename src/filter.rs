//! Completion filtering for the task list.

use crate::{fields::TaskFilter, task::Task};

/// Tasks matching `filter`, in stored order.
pub fn apply_filter(tasks: &[Task], filter: TaskFilter) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| match filter {
            TaskFilter::All => true,
            TaskFilter::Done => t.is_done(),
            TaskFilter::NotDone => !t.is_done(),
        })
        .collect()
}
