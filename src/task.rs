//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct that represents a single to-do
//! item, and `TaskFields`, the editable part of a task that forms read and write.

use std::hash::{Hash, Hasher};

use uuid::Uuid;

use crate::fields::Priority;

/// Country preselected by forms while the lookup is still loading.
pub const DEFAULT_COUNTRY: &str = "France";

/// The editable values of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    pub name: String,
    pub description: Option<String>,
    pub is_done: bool,
    pub priority: Priority,
    pub country: Option<String>,
}

impl TaskFields {
    /// Build fields from raw form text, treating blank description and country as absent.
    pub fn from_input(
        name: &str,
        description: &str,
        is_done: bool,
        priority: Priority,
        country: &str,
    ) -> Self {
        TaskFields {
            name: name.to_string(),
            description: non_blank(description),
            is_done,
            priority,
            country: non_blank(country),
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// A single to-do item.
///
/// Identity is the `id` minted at creation. Equality and hashing look at the
/// id only, so two snapshots of the same task compare equal even when their
/// fields differ.
#[derive(Debug, Clone)]
pub struct Task {
    id: Uuid,
    pub fields: TaskFields,
    pub created_at_utc: i64,
}

impl Task {
    /// Create a task with a fresh random identifier.
    pub fn new(fields: TaskFields) -> Self {
        Task {
            id: Uuid::new_v4(),
            fields,
            created_at_utc: chrono::Utc::now().timestamp(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// A copy of this task carrying the same identity with replaced fields.
    pub fn with_fields(&self, fields: TaskFields) -> Self {
        Task {
            id: self.id,
            fields,
            created_at_utc: self.created_at_utc,
        }
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.description.as_deref()
    }

    pub fn is_done(&self) -> bool {
        self.fields.is_done
    }

    pub fn priority(&self) -> Priority {
        self.fields.priority
    }

    pub fn country(&self) -> Option<&str> {
        self.fields.country.as_deref()
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// The tasks a fresh session starts with.
pub fn seed_tasks() -> Vec<Task> {
    let seed = [
        ("Task 1", "Description of task 1", false, Priority::Low),
        ("Task 2", "Description of task 2", true, Priority::Medium),
        ("Task 3", "Description of task 3", false, Priority::High),
    ];
    seed.iter()
        .map(|&(name, description, is_done, priority)| {
            Task::new(TaskFields::from_input(name, description, is_done, priority, DEFAULT_COUNTRY))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_ignores_fields() {
        let task = Task::new(TaskFields::from_input("Read", "", false, Priority::Low, ""));
        let mut changed = task.fields.clone();
        changed.name = "Write".to_string();
        changed.is_done = true;
        let edited = task.with_fields(changed);

        assert_eq!(task, edited);
        assert_eq!(task.id(), edited.id());
        assert_eq!(edited.name(), "Write");

        let mut set = HashSet::new();
        set.insert(task);
        assert!(!set.insert(edited));
    }

    #[test]
    fn test_same_fields_different_tasks() {
        let fields = TaskFields::from_input("Same", "", false, Priority::Low, "");
        let a = Task::new(fields.clone());
        let b = Task::new(fields);
        assert_ne!(a, b);
    }

    #[test]
    fn test_blank_description_and_country_are_absent() {
        let fields = TaskFields::from_input("", "   ", false, Priority::High, "");
        assert_eq!(fields.name, "");
        assert_eq!(fields.description, None);
        assert_eq!(fields.country, None);
    }

    #[test]
    fn test_present_values_are_kept_verbatim() {
        let fields = TaskFields::from_input(" Shop ", "  Milk, eggs  ", false, Priority::Low, " France");
        assert_eq!(fields.name, " Shop ");
        assert_eq!(fields.description.as_deref(), Some("  Milk, eggs  "));
        assert_eq!(fields.country.as_deref(), Some(" France"));
    }

    #[test]
    fn test_seed_tasks() {
        let tasks = seed_tasks();
        assert_eq!(tasks.len(), 3);
        assert!(tasks[1].is_done());
        assert_eq!(tasks[2].priority(), Priority::High);
        assert!(tasks.iter().all(|t| t.country() == Some(DEFAULT_COUNTRY)));
    }
}
