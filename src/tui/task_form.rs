//! Task form handling for the terminal user interface.
//!
//! This module provides the `TaskForm` structure used both by the add-task
//! modal and by the edit mode of the detail view, including field ordering
//! and form state management.

use crate::{
    fields::Priority,
    task::{Task, TaskFields, DEFAULT_COUNTRY},
    tui::{countries::CountryPicker, input::InputField},
};

/// Visual order of the form fields.
pub const NAME_FIELD: usize = 0;
pub const DESCRIPTION_FIELD: usize = 1;
pub const DONE_FIELD: usize = 2;
pub const PRIORITY_FIELD: usize = 3;
pub const COUNTRY_FIELD: usize = 4;
pub const SUBMIT_FIELD: usize = 5;
const FIELD_COUNT: usize = 6;

/// Working copy of a task's fields while it is being created or edited.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub name: InputField,
    pub description: InputField,
    pub is_done: bool,
    pub priority: usize,
    pub country: CountryPicker,
    pub current_field: usize,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    /// An empty form with default values.
    pub fn new() -> Self {
        let mut form = Self {
            name: InputField::new(),
            description: InputField::new(),
            is_done: false,
            priority: 0, // Low
            country: CountryPicker::default(),
            current_field: NAME_FIELD,
        };
        form.update_active_field();
        form
    }

    /// A form populated from a snapshot of an existing task.
    pub fn from_task(task: &Task) -> Self {
        let mut form = Self::new();
        form.name = InputField::with_value(task.name());
        form.description = InputField::with_value(task.description().unwrap_or_default());
        form.is_done = task.is_done();
        form.priority = Priority::ALL
            .iter()
            .position(|&p| p == task.priority())
            .unwrap_or(0);
        form.country = CountryPicker::with_preferred(task.country().unwrap_or(DEFAULT_COUNTRY));
        form.update_active_field();
        form
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL[self.priority % Priority::ALL.len()]
    }

    /// The values a submit would commit.
    pub fn fields(&self) -> TaskFields {
        TaskFields::from_input(
            &self.name.value,
            &self.description.value,
            self.is_done,
            self.selected_priority(),
            self.country.selected_name(),
        )
    }

    /// Back to defaults after a submit. The loaded country list is kept.
    pub fn reset(&mut self) {
        self.name.clear();
        self.description.clear();
        self.is_done = false;
        self.priority = 0;
        self.country.prefer(DEFAULT_COUNTRY);
        self.current_field = NAME_FIELD;
        self.update_active_field();
    }

    /// The text input under focus, if the focused field is one.
    pub fn active_input(&self) -> Option<&InputField> {
        match self.current_field {
            NAME_FIELD => Some(&self.name),
            DESCRIPTION_FIELD => Some(&self.description),
            _ => None,
        }
    }

    fn active_input_mut(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            NAME_FIELD => Some(&mut self.name),
            DESCRIPTION_FIELD => Some(&mut self.description),
            _ => None,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            FIELD_COUNT - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    pub fn update_active_field(&mut self) {
        self.name.active = self.current_field == NAME_FIELD;
        self.description.active = self.current_field == DESCRIPTION_FIELD;
    }

    /// Typed characters go to the focused text input; space flips the done toggle.
    pub fn handle_char(&mut self, c: char) {
        if self.current_field == DONE_FIELD {
            if c == ' ' {
                self.is_done = !self.is_done;
            }
            return;
        }
        if let Some(field) = self.active_input_mut() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input_mut() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.active_input_mut() {
            field.handle_delete();
        }
    }

    pub fn handle_home_end(&mut self, end: bool) {
        if let Some(field) = self.active_input_mut() {
            if end {
                field.move_end();
            } else {
                field.move_home();
            }
        }
    }

    /// Left/right move the cursor in text inputs and cycle selectors elsewhere.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            NAME_FIELD | DESCRIPTION_FIELD => {
                if let Some(field) = self.active_input_mut() {
                    if right {
                        field.move_cursor_right();
                    } else {
                        field.move_cursor_left();
                    }
                }
            }
            DONE_FIELD => self.is_done = !self.is_done,
            PRIORITY_FIELD => {
                let len = Priority::ALL.len();
                self.priority = if right {
                    (self.priority + 1) % len
                } else if self.priority == 0 {
                    len - 1
                } else {
                    self.priority - 1
                };
            }
            COUNTRY_FIELD => self.country.cycle(right),
            _ => {}
        }
    }
}
