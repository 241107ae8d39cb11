//! Detail screen state: viewing a task or editing a detached copy of it.

use tracing::debug;
use uuid::Uuid;

use crate::{store::TaskStore, task::Task, tui::task_form::TaskForm};

#[derive(Debug, Clone)]
pub enum DetailMode {
    Viewing,
    /// Edits go to this working copy and reach the store only on save.
    Editing(TaskForm),
}

/// The task shown on the detail screen and what the user is doing with it.
#[derive(Debug, Clone)]
pub struct DetailView {
    task_id: Uuid,
    pub mode: DetailMode,
}

impl DetailView {
    pub fn new(task_id: Uuid) -> Self {
        DetailView {
            task_id,
            mode: DetailMode::Viewing,
        }
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, DetailMode::Editing(_))
    }

    pub fn form(&self) -> Option<&TaskForm> {
        match &self.mode {
            DetailMode::Editing(form) => Some(form),
            DetailMode::Viewing => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut TaskForm> {
        match &mut self.mode {
            DetailMode::Editing(form) => Some(form),
            DetailMode::Viewing => None,
        }
    }

    /// Switch to editing, seeding the form from `task` as it is right now.
    ///
    /// Returns `false` if already editing.
    pub fn modify(&mut self, task: &Task) -> bool {
        if self.is_editing() {
            return false;
        }
        self.mode = DetailMode::Editing(TaskForm::from_task(task));
        true
    }

    /// Commit the working copy to the store and return to viewing.
    ///
    /// Returns what `TaskStore::update` reported; `false` when the task was
    /// deleted meanwhile or the view was not editing.
    pub fn save(&mut self, store: &mut TaskStore) -> bool {
        let form = match std::mem::replace(&mut self.mode, DetailMode::Viewing) {
            DetailMode::Editing(form) => form,
            DetailMode::Viewing => return false,
        };
        let Some(current) = store.get(self.task_id) else {
            debug!(id = %self.task_id, "save for a task that no longer exists");
            return false;
        };
        let edited = current.with_fields(form.fields());
        store.update(edited)
    }

    /// Drop the working copy.
    pub fn cancel(&mut self) {
        self.mode = DetailMode::Viewing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;

    #[test]
    fn test_edit_is_invisible_until_save() {
        let mut store = TaskStore::seeded();
        let task = store.tasks()[0].clone();
        let mut view = DetailView::new(task.id());

        assert!(view.modify(&task));
        let form = view.form_mut().unwrap();
        form.name.handle_char('!');
        form.is_done = true;
        form.priority = 2;

        assert_eq!(store.get(task.id()).unwrap().name(), "Task 1");
        assert!(!store.get(task.id()).unwrap().is_done());

        assert!(view.save(&mut store));
        assert!(!view.is_editing());

        let saved = store.get(task.id()).unwrap();
        assert_eq!(saved.name(), "Task 1!");
        assert!(saved.is_done());
        assert_eq!(saved.priority(), Priority::High);
        assert_eq!(store.position(task.id()), Some(0));
    }

    #[test]
    fn test_cancel_discards_working_copy() {
        let mut store = TaskStore::seeded();
        let task = store.tasks()[2].clone();
        let mut view = DetailView::new(task.id());

        view.modify(&task);
        view.form_mut().unwrap().name.clear();
        view.cancel();

        assert!(!view.is_editing());
        assert!(!view.save(&mut store));
        assert_eq!(store.get(task.id()).unwrap().name(), "Task 3");
    }

    #[test]
    fn test_modify_twice_keeps_first_copy() {
        let store = TaskStore::seeded();
        let task = store.tasks()[1].clone();
        let mut view = DetailView::new(task.id());

        assert!(view.modify(&task));
        view.form_mut().unwrap().name.handle_char('x');
        assert!(!view.modify(&task));
        assert_eq!(view.form().unwrap().name.value, "Task 2x");
    }

    #[test]
    fn test_save_after_delete_is_noop() {
        let mut store = TaskStore::seeded();
        let task = store.tasks()[1].clone();
        let mut view = DetailView::new(task.id());

        view.modify(&task);
        store.remove_at([1]);

        assert!(!view.save(&mut store));
        assert_eq!(store.len(), 2);
        assert!(!view.is_editing());
    }
}
