//! In-memory task store for the session.
//!
//! `TaskStore` owns the ordered collection of tasks. Order is insertion order,
//! which is also display order. Views read it by reference and learn about
//! changes through the `StoreEvent` channel handed out by `subscribe`.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::task::{seed_tasks, Task};

/// Change notification emitted after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added { id: Uuid },
    Updated { id: Uuid },
    Removed { ids: Vec<Uuid> },
}

/// Ordered in-memory collection of tasks, at most one per id.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    observers: Vec<Sender<StoreEvent>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the session's seed tasks.
    pub fn seeded() -> Self {
        TaskStore {
            tasks: seed_tasks(),
            observers: Vec::new(),
        }
    }

    /// Register an observer. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    fn notify(&mut self, event: StoreEvent) {
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get a task by ID.
    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// Current display position of a task.
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|t| t.id() == id)
    }

    /// Append a task to the end of the collection.
    ///
    /// A task whose id is already stored is ignored.
    pub fn add(&mut self, task: Task) {
        let id = task.id();
        if self.position(id).is_some() {
            warn!(%id, "task already stored, ignoring add");
            return;
        }
        debug!(%id, name = task.name(), "task added");
        self.tasks.push(task);
        self.notify(StoreEvent::Added { id });
    }

    /// Replace the stored task with the same id, keeping its position.
    ///
    /// Returns `false` and changes nothing when no task matches.
    pub fn update(&mut self, task: Task) -> bool {
        let id = task.id();
        match self.position(id) {
            Some(idx) => {
                self.tasks[idx] = task;
                debug!(%id, position = idx, "task updated");
                self.notify(StoreEvent::Updated { id });
                true
            }
            None => {
                debug!(%id, "update for unknown task ignored");
                false
            }
        }
    }

    /// Remove the tasks at the given display positions.
    ///
    /// Positions refer to the order at the time of the call. Duplicates are
    /// collapsed and out-of-range positions are skipped. Returns the removed
    /// tasks in their former display order.
    pub fn remove_at<I>(&mut self, positions: I) -> Vec<Task>
    where
        I: IntoIterator<Item = usize>,
    {
        let positions: BTreeSet<usize> = positions.into_iter().collect();
        let mut removed = Vec::new();
        for &pos in positions.iter().rev() {
            if pos < self.tasks.len() {
                removed.push(self.tasks.remove(pos));
            } else {
                debug!(position = pos, len = self.tasks.len(), "remove position out of range");
            }
        }
        removed.reverse();

        if !removed.is_empty() {
            let ids: Vec<Uuid> = removed.iter().map(Task::id).collect();
            debug!(count = ids.len(), "tasks removed");
            self.notify(StoreEvent::Removed { ids });
        }
        removed
    }
}
