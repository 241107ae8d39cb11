//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles user input, renders the interface, and coordinates between
//! the task list, the add-task modal and the detail screen.

use std::io;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    fields::TaskFilter,
    filter::apply_filter,
    store::{StoreEvent, TaskStore},
    task::Task,
    tui::{
        colors::{done_icon, priority_color, priority_icon, ALERT_RED, GOLD, LEAF_GREEN},
        countries::{CountryDelivery, CountryLoader, LoadState},
        detail::DetailView,
        enums::{AppState, FormTarget},
        task_form::{
            TaskForm, COUNTRY_FIELD, DESCRIPTION_FIELD, DONE_FIELD, NAME_FIELD, PRIORITY_FIELD,
            SUBMIT_FIELD,
        },
        utils::centered_rect,
    },
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Main application state for the terminal user interface.
///
/// Owns the task store for the session and every piece of screen state.
/// Views re-derive what they show from the store after each `StoreEvent`.
pub struct App {
    state: AppState,
    store: TaskStore,
    store_events: Receiver<StoreEvent>,
    task_list_state: TableState,
    visible_tasks: Vec<Uuid>,
    filter: TaskFilter,
    add_form: TaskForm,
    detail: Option<DetailView>,
    countries: CountryLoader,
    pending_delete: Option<Uuid>,
    return_state: AppState,
    status_message: String,
    tick: usize,
}

impl App {
    /// Create the app around an existing store.
    pub fn new(mut store: TaskStore, countries: CountryLoader, filter: TaskFilter) -> Self {
        let store_events = store.subscribe();
        let mut app = App {
            state: AppState::TaskList,
            store,
            store_events,
            task_list_state: TableState::default(),
            visible_tasks: Vec::new(),
            filter,
            add_form: TaskForm::new(),
            detail: None,
            countries,
            pending_delete: None,
            return_state: AppState::TaskList,
            status_message: String::new(),
            tick: 0,
        };
        app.update_visible_tasks();
        app
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// Recompute the visible rows from the store and the active filter.
    ///
    /// The selection follows the previously selected task when it is still
    /// visible. The trailing "add" row is always present.
    fn update_visible_tasks(&mut self) {
        let old_len = self.visible_tasks.len();
        let old_selected = self.task_list_state.selected();
        let old_selected_id = old_selected.and_then(|idx| self.visible_tasks.get(idx)).copied();

        self.visible_tasks = apply_filter(self.store.tasks(), self.filter)
            .into_iter()
            .map(Task::id)
            .collect();

        let action_row = self.visible_tasks.len();
        let selection = match (old_selected_id, old_selected) {
            (Some(id), Some(idx)) => self
                .visible_tasks
                .iter()
                .position(|&v| v == id)
                .unwrap_or_else(|| idx.min(action_row)),
            (None, Some(idx)) if idx == old_len => action_row,
            (None, Some(idx)) => idx.min(action_row),
            (_, None) => 0,
        };
        self.task_list_state.select(Some(selection));
    }

    /// Apply pending store change notifications.
    fn sync_store(&mut self) {
        let events: Vec<StoreEvent> = self.store_events.try_iter().collect();
        if events.is_empty() {
            return;
        }
        for event in events {
            match event {
                StoreEvent::Added { id } => {
                    info!(%id, "task created");
                    self.set_status_message("Task added".to_string());
                }
                StoreEvent::Updated { id } => {
                    info!(%id, "task modified");
                    self.set_status_message("Task updated".to_string());
                }
                StoreEvent::Removed { ids } => {
                    info!(count = ids.len(), "tasks deleted");
                    if let Some(detail) = &self.detail {
                        if ids.contains(&detail.task_id()) {
                            self.detail = None;
                        }
                    }
                    self.set_status_message(format!("Deleted {} task(s)", ids.len()));
                }
            }
        }
        self.update_visible_tasks();
    }

    /// Feed finished country lookups to the form that asked for them.
    fn apply_country_deliveries(&mut self) {
        for CountryDelivery { target, ticket, result } in self.countries.drain() {
            let failure = match &result {
                Ok(names) => {
                    debug!(?target, ticket, count = names.len(), "country list received");
                    None
                }
                Err(e) => {
                    warn!(?target, ticket, error = %e, "country list unavailable");
                    Some(e.to_string())
                }
            };

            let picker = match target {
                FormTarget::Add if self.state == AppState::AddTask => Some(&mut self.add_form.country),
                FormTarget::Add => None,
                FormTarget::Edit => self
                    .detail
                    .as_mut()
                    .and_then(DetailView::form_mut)
                    .map(|form| &mut form.country),
            };
            let applied = picker.is_some_and(|p| p.apply(ticket, result));

            if !applied {
                debug!(?target, ticket, "stale country delivery dropped");
            } else if let Some(reason) = failure {
                self.set_status_message(format!("Country list unavailable: {reason}"));
            }
        }
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Id of the task under the list cursor, `None` on the add row.
    fn selected_task_id(&self) -> Option<Uuid> {
        self.task_list_state
            .selected()
            .and_then(|idx| self.visible_tasks.get(idx))
            .copied()
    }

    fn on_action_row(&self) -> bool {
        self.task_list_state.selected() == Some(self.visible_tasks.len())
    }

    fn open_add_form(&mut self) {
        self.add_form = TaskForm::new();
        let ticket = self.countries.request(FormTarget::Add);
        self.add_form.country.begin(ticket);
        self.state = AppState::AddTask;
    }

    fn submit_add_form(&mut self) {
        let task = Task::new(self.add_form.fields());
        self.store.add(task);
        self.add_form.reset();
        self.state = AppState::TaskList;
        self.sync_store();
        self.task_list_state.select(Some(self.visible_tasks.len().saturating_sub(1)));
    }

    fn open_detail(&mut self, id: Uuid) {
        self.detail = Some(DetailView::new(id));
        self.state = AppState::TaskDetail;
    }

    fn start_editing(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        let Some(task) = self.store.get(detail.task_id()) else {
            self.status_message = "Task no longer exists".to_string();
            return;
        };
        if detail.modify(task) {
            let ticket = self.countries.request(FormTarget::Edit);
            if let Some(form) = detail.form_mut() {
                form.country.begin(ticket);
            }
        }
    }

    fn save_edit(&mut self) {
        let saved = match self.detail.as_mut() {
            Some(detail) => detail.save(&mut self.store),
            None => false,
        };
        if !saved {
            self.set_status_message("Task no longer exists".to_string());
        }
        self.sync_store();
    }

    fn toggle_done(&mut self, id: Uuid) {
        if let Some(task) = self.store.get(id) {
            let mut fields = task.fields.clone();
            fields.is_done = !fields.is_done;
            let toggled = task.with_fields(fields);
            self.store.update(toggled);
            self.sync_store();
        }
    }

    fn request_delete(&mut self, id: Uuid) {
        self.pending_delete = Some(id);
        self.return_state = self.state;
        self.state = AppState::Confirm;
    }

    fn confirm_delete(&mut self) {
        if let Some(id) = self.pending_delete.take() {
            if let Some(position) = self.store.position(id) {
                self.store.remove_at([position]);
            }
        }
        self.state = AppState::TaskList;
        self.sync_store();
    }

    fn open_help(&mut self) {
        self.return_state = self.state;
        self.state = AppState::Help;
    }

    /// Handle keyboard input when in the task list view.
    ///
    /// Returns true if the application should quit.
    fn handle_task_list_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected > 0 {
                        self.task_list_state.select(Some(selected - 1));
                    }
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected < self.visible_tasks.len() {
                        self.task_list_state.select(Some(selected + 1));
                    }
                }
            }
            KeyCode::Enter => {
                if self.on_action_row() {
                    self.open_add_form();
                } else if let Some(id) = self.selected_task_id() {
                    self.open_detail(id);
                }
            }
            KeyCode::Char('a') => self.open_add_form(),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_task_id() {
                    self.request_delete(id);
                }
            }
            KeyCode::Char(' ') => {
                if let Some(id) = self.selected_task_id() {
                    self.toggle_done(id);
                }
            }
            KeyCode::Char('f') => {
                self.filter = self.filter.next();
                self.update_visible_tasks();
                self.set_status_message(format!(
                    "Filter: {} ({} tasks)",
                    self.filter.label(),
                    self.visible_tasks.len()
                ));
            }
            KeyCode::Char('h') | KeyCode::Char('?') => self.open_help(),
            _ => {}
        }
        false
    }

    /// Handle keyboard input on the detail screen, viewing or editing.
    fn handle_detail_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        let editing = self.detail.as_ref().is_some_and(DetailView::is_editing);
        if editing {
            match key {
                KeyCode::Esc => {
                    if let Some(detail) = self.detail.as_mut() {
                        detail.cancel();
                    }
                    self.set_status_message("Changes discarded".to_string());
                }
                KeyCode::Enter => self.save_edit(),
                KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => self.save_edit(),
                _ => {
                    if let Some(form) = self.detail.as_mut().and_then(DetailView::form_mut) {
                        handle_form_key(form, key);
                    }
                }
            }
            return false;
        }

        match key {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.detail = None;
                self.state = AppState::TaskList;
            }
            KeyCode::Char('m') | KeyCode::Char('e') => self.start_editing(),
            KeyCode::Char('d') => {
                if let Some(id) = self.detail.as_ref().map(DetailView::task_id) {
                    self.request_delete(id);
                }
            }
            KeyCode::Char('h') | KeyCode::Char('?') => self.open_help(),
            _ => {}
        }
        false
    }

    /// Handle keyboard input in the add-task modal.
    fn handle_add_form_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> bool {
        match key {
            KeyCode::Esc => {
                self.state = AppState::TaskList;
            }
            KeyCode::Enter => self.submit_add_form(),
            _ => handle_form_key(&mut self.add_form, key),
        }
        false
    }

    fn handle_confirm_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> bool {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.pending_delete = None;
                self.state = self.return_state;
            }
            _ => {}
        }
        false
    }

    fn handle_help_input(&mut self, _key: KeyCode, _modifiers: KeyModifiers) -> bool {
        self.state = self.return_state;
        false
    }

    /// Dispatch one key press. Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        self.clear_status_message();
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        match self.state {
            AppState::TaskList => self.handle_task_list_input(key, modifiers),
            AppState::TaskDetail => self.handle_detail_input(key, modifiers),
            AppState::AddTask => self.handle_add_form_input(key, modifiers),
            AppState::Confirm => self.handle_confirm_input(key, modifiers),
            AppState::Help => self.handle_help_input(key, modifiers),
        }
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    /// Render the task list with its trailing add row.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let header_text = Line::from(vec![
            Span::styled("TO-DO LIST", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("Filter: {}", self.filter.label()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]);
        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, chunks[0]);

        let header = Row::new(
            ["Done", "Name", "Description", "Priority", "Country"]
                .iter()
                .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))),
        )
        .style(Style::default().bg(Color::Blue).fg(Color::White))
        .height(1);

        let mut rows: Vec<Row> = self
            .visible_tasks
            .iter()
            .filter_map(|&id| self.store.get(id))
            .map(|task| {
                let done_color = if task.is_done() { LEAF_GREEN } else { ALERT_RED };
                let priority = task.priority();
                let text_style = if task.is_done() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::White)
                };
                Row::new(vec![
                    Cell::from(Span::styled(done_icon(task.is_done()), Style::default().fg(done_color))),
                    Cell::from(task.name().to_string()).style(text_style),
                    Cell::from(task.description().unwrap_or("").to_string()).style(Style::default().fg(Color::Gray)),
                    Cell::from(Span::styled(
                        format!("{}{}", priority_icon(priority), priority),
                        Style::default().fg(priority_color(priority)),
                    )),
                    Cell::from(task.country().unwrap_or("-").to_string()),
                ])
            })
            .collect();

        rows.push(
            Row::new(vec![Cell::from("+"), Cell::from("Add a task")])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)),
        );

        let widths = [
            Constraint::Length(4),
            Constraint::Min(20),
            Constraint::Min(25),
            Constraint::Length(10),
            Constraint::Length(16),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{}) - Press 'h' for help",
                self.visible_tasks.len(),
                self.store.len()
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.task_list_state);
    }

    /// Render the read-only detail of a task, or its edit form.
    fn render_task_detail(&self, f: &mut Frame, area: Rect) {
        let Some(detail) = &self.detail else {
            return;
        };
        let Some(task) = self.store.get(detail.task_id()) else {
            let paragraph = Paragraph::new("Task no longer exists")
                .block(Block::default().borders(Borders::ALL).title("Task Details - [Esc] back"));
            f.render_widget(paragraph, area);
            return;
        };

        if let Some(form) = detail.form() {
            render_task_form(f, area, form, "Modify Task - Enter to save, Esc to discard", "Save", self.tick);
            return;
        }

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let priority = task.priority();
        let created = DateTime::from_timestamp(task.created_at_utc, 0)
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        let text = vec![
            Line::from(Span::styled(task.name().to_string(), bold.fg(Color::Cyan))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Description: ", bold),
                Span::styled(task.description().unwrap_or("-").to_string(), Style::default().fg(Color::Gray)),
            ]),
            Line::from(vec![
                Span::styled("Priority: ", bold),
                Span::styled(
                    format!("{}{}", priority_icon(priority), priority),
                    Style::default().fg(priority_color(priority)),
                ),
            ]),
            Line::from(vec![
                Span::styled("Done: ", bold),
                Span::raw(if task.is_done() { "Yes" } else { "No" }),
            ]),
            Line::from(vec![
                Span::styled("Country: ", bold),
                Span::raw(task.country().unwrap_or("-").to_string()),
            ]),
            Line::from(vec![Span::styled("Created: ", bold), Span::raw(created)]),
        ];

        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Task Details - [m]odify, [d]elete, [Esc] back"),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render the add-task modal over the list.
    fn render_add_form(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(70, 80, area);
        f.render_widget(Clear, area);
        render_task_form(f, area, &self.add_form, "New Task - Enter to add, Esc to close", "Add", self.tick);
    }

    /// Render the help screen with keyboard shortcuts.
    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("To-do List Help", bold)),
            Line::from(""),
            Line::from(Span::styled("Task List:", bold)),
            Line::from("  Up/Down, k/j   Move selection"),
            Line::from("  Enter          Open task details (or add, on the last row)"),
            Line::from("  a              Add a task"),
            Line::from("  Space          Toggle done"),
            Line::from("  d/Delete       Delete selected task"),
            Line::from("  f              Cycle filter (All, Done, Not done)"),
            Line::from("  h/?            Show this help"),
            Line::from("  q/Esc/Ctrl+C   Quit"),
            Line::from(""),
            Line::from(Span::styled("Task Details:", bold)),
            Line::from("  m/e            Modify task"),
            Line::from("  d              Delete task"),
            Line::from("  Esc/q          Back to task list"),
            Line::from(""),
            Line::from(Span::styled("Forms:", bold)),
            Line::from("  Tab/Up/Down    Move between fields"),
            Line::from("  Left/Right     Change priority, country or done"),
            Line::from("  Space          Toggle done (on the Done field)"),
            Line::from("  Enter          Add or save"),
            Line::from("  Esc            Close without saving"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help - Press any key to return"))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render a confirmation dialog for deletion.
    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let name = self
            .pending_delete
            .and_then(|id| self.store.get(id))
            .map(|t| t.name().to_string())
            .unwrap_or_default();

        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Rgb(114, 0, 0)));

        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled("Delete this task?", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(name),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::TaskList => format!(
                    "Tasks: {} | Filter: {} | Press 'h' for help",
                    self.visible_tasks.len(),
                    self.filter.label()
                ),
                AppState::TaskDetail => {
                    if self.detail.as_ref().is_some_and(DetailView::is_editing) {
                        "Modify Task".to_string()
                    } else {
                        "Task Details".to_string()
                    }
                }
                AppState::AddTask => "Add New Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(Color::Blue).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::TaskDetail => self.render_task_detail(f, chunks[0]),
            AppState::AddTask => {
                self.render_task_list(f, chunks[0]);
                self.render_add_form(f, chunks[0]);
            }
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                if self.return_state == AppState::TaskDetail {
                    self.render_task_detail(f, chunks[0]);
                } else {
                    self.render_task_list(f, chunks[0]);
                }
                self.render_confirm(f, chunks[0]);
            }
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering, background results and input until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.sync_store();
            self.apply_country_deliveries();
            terminal.draw(|f| self.render(f))?;
            self.tick = self.tick.wrapping_add(1);

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// Keys shared by the add and edit forms, other than Enter and Esc.
fn handle_form_key(form: &mut TaskForm, key: KeyCode) {
    match key {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Left => form.handle_left_right(false),
        KeyCode::Right => form.handle_left_right(true),
        KeyCode::Backspace => form.handle_backspace(),
        KeyCode::Delete => form.handle_delete(),
        KeyCode::Home => form.handle_home_end(false),
        KeyCode::End => form.handle_home_end(true),
        KeyCode::Char(c) => form.handle_char(c),
        _ => {}
    }
}

/// Render a task form: name, description, done, priority, country and the submit button.
fn render_task_form(f: &mut Frame, area: Rect, form: &TaskForm, title: &str, submit: &str, tick: usize) {
    let outer = Block::default().borders(Borders::ALL).title(title.to_string());
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let border = |field: usize| {
        if form.current_field == field {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        }
    };

    let name = Paragraph::new(form.name.value.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Task name")
            .border_style(border(NAME_FIELD)),
    );
    f.render_widget(name, chunks[NAME_FIELD]);

    let description = Paragraph::new(form.description.value.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Description")
            .border_style(border(DESCRIPTION_FIELD)),
    );
    f.render_widget(description, chunks[DESCRIPTION_FIELD]);

    let done = Paragraph::new(format!("< {} >", if form.is_done { "Yes" } else { "No" }))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Done")
                .border_style(border(DONE_FIELD)),
        )
        .alignment(Alignment::Center);
    f.render_widget(done, chunks[DONE_FIELD]);

    let priority = form.selected_priority();
    let priority_text = Paragraph::new(Span::styled(
        format!("< {}{} >", priority_icon(priority), priority),
        Style::default().fg(priority_color(priority)),
    ))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Priority")
            .border_style(border(PRIORITY_FIELD)),
    )
    .alignment(Alignment::Center);
    f.render_widget(priority_text, chunks[PRIORITY_FIELD]);

    let country_text = match &form.country.state {
        LoadState::Loading => format!("{} Loading countries", SPINNER[tick % SPINNER.len()]),
        LoadState::Failed(_) => format!("< {} > (list unavailable)", form.country.selected_name()),
        LoadState::Idle | LoadState::Ready => format!("< {} >", form.country.selected_name()),
    };
    let country = Paragraph::new(country_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Country ({} available)", form.country.names().len()))
                .border_style(border(COUNTRY_FIELD)),
        )
        .alignment(Alignment::Center);
    f.render_widget(country, chunks[COUNTRY_FIELD]);

    let submit_style = if form.current_field == SUBMIT_FIELD {
        Style::default().bg(GOLD).fg(Color::Black).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let button = Paragraph::new(Span::styled(format!("[ {submit} ]"), submit_style))
        .block(Block::default().borders(Borders::ALL).border_style(border(SUBMIT_FIELD)))
        .alignment(Alignment::Center);
    f.render_widget(button, chunks[SUBMIT_FIELD]);

    if let Some(input) = form.active_input() {
        let chunk = chunks[form.current_field];
        f.set_cursor_position((chunk.x + input.cursor as u16 + 1, chunk.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::task::DEFAULT_COUNTRY;
    use crate::country::tests::serve_once;
    use std::time::Instant;
    use tokio::runtime::Runtime;

    /// An app whose country lookups fail immediately, so tests stay offline.
    fn offline_app(filter: TaskFilter) -> (Runtime, App) {
        let rt = Runtime::new().unwrap();
        let loader = CountryLoader::new(rt.handle().clone(), "not-a-url", None);
        let app = App::new(TaskStore::seeded(), loader, filter);
        (rt, app)
    }

    /// An app whose country endpoint answers once with `body`.
    fn online_app(body: &'static str) -> (Runtime, App) {
        let rt = Runtime::new().unwrap();
        let url = rt.block_on(serve_once("200 OK", body));
        let loader = CountryLoader::new(rt.handle().clone(), &url, Some(Duration::from_secs(5)));
        let app = App::new(TaskStore::seeded(), loader, TaskFilter::All);
        (rt, app)
    }

    /// Apply deliveries until the form for `target` stops loading.
    fn wait_for_countries(app: &mut App, target: FormTarget) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            app.apply_country_deliveries();
            let loading = match target {
                FormTarget::Add => app.add_form.country.is_loading(),
                FormTarget::Edit => app
                    .detail
                    .as_ref()
                    .and_then(DetailView::form)
                    .is_some_and(|f| f.country.is_loading()),
            };
            if !loading {
                return;
            }
            assert!(Instant::now() < deadline, "country list never arrived");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn press(app: &mut App, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn names(app: &App) -> Vec<String> {
        app.store().tasks().iter().map(|t| t.name().to_string()).collect()
    }

    #[test]
    fn test_add_task_flow() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state(), AppState::AddTask);
        assert!(app.add_form.country.is_loading());

        app.apply_country_deliveries();
        assert!(!app.add_form.country.is_loading());
        assert!(app.status_message.starts_with("Country list unavailable"));

        type_str(&mut app, "Groceries");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Milk, eggs");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.store().len(), 4);
        let added = &app.store().tasks()[3];
        assert_eq!(added.name(), "Groceries");
        assert_eq!(added.description(), Some("Milk, eggs"));
        assert_eq!(added.priority(), Priority::High);
        assert!(!added.is_done());
        assert_eq!(added.country(), Some(DEFAULT_COUNTRY));
        assert_eq!(app.add_form.name.value, "");
        assert_eq!(app.selected_task_id(), Some(added.id()));
    }

    #[test]
    fn test_empty_name_is_accepted() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store().len(), 4);
        assert_eq!(app.store().tasks()[3].name(), "");
    }

    #[test]
    fn test_close_add_form_without_adding() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "Nope");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.store().len(), 3);
    }

    #[test]
    fn test_action_row_opens_add_form() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        for _ in 0..5 {
            press(&mut app, KeyCode::Down);
        }
        assert!(app.on_action_row());
        assert_eq!(app.selected_task_id(), None);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state(), AppState::AddTask);
    }

    #[test]
    fn test_delete_with_confirmation() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state(), AppState::Confirm);
        press(&mut app, KeyCode::Char('y'));

        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(names(&app), vec!["Task 1", "Task 3"]);
        assert_eq!(app.status_message, "Deleted 1 task(s)");
    }

    #[test]
    fn test_cancel_delete_keeps_task() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.store().len(), 3);
    }

    #[test]
    fn test_delete_through_filter_uses_store_position() {
        let (_rt, mut app) = offline_app(TaskFilter::NotDone);
        // Visible rows: Task 1, Task 3.
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(names(&app), vec!["Task 1", "Task 2"]);
    }

    #[test]
    fn test_modify_and_save_from_detail() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        let id = app.store().tasks()[0].id();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state(), AppState::TaskDetail);

        press(&mut app, KeyCode::Char('m'));
        assert!(app.detail.as_ref().unwrap().is_editing());
        type_str(&mut app, " updated");
        assert_eq!(app.store().get(id).unwrap().name(), "Task 1");

        app.apply_country_deliveries();
        assert!(!app.detail.as_ref().unwrap().form().unwrap().country.is_loading());

        press(&mut app, KeyCode::Enter);
        assert!(!app.detail.as_ref().unwrap().is_editing());
        assert_eq!(app.store().get(id).unwrap().name(), "Task 1 updated");
        assert_eq!(app.store().position(id), Some(0));
        assert_eq!(app.status_message, "Task updated");
    }

    #[test]
    fn test_discard_edit() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('m'));
        type_str(&mut app, "zzz");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state(), AppState::TaskDetail);
        assert_eq!(app.store().tasks()[0].name(), "Task 1");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state(), AppState::TaskList);
    }

    #[test]
    fn test_delete_from_detail_returns_to_list() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.state(), AppState::TaskList);
        assert!(app.detail.is_none());
        assert_eq!(names(&app), vec!["Task 2", "Task 3"]);
    }

    #[test]
    fn test_toggle_done_and_filter() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        press(&mut app, KeyCode::Char(' '));
        assert!(app.store().tasks()[0].is_done());

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.filter, TaskFilter::Done);
        assert_eq!(app.visible_tasks.len(), 2);

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.filter, TaskFilter::NotDone);
        assert_eq!(app.visible_tasks, vec![app.store().tasks()[2].id()]);
    }

    #[test]
    fn test_stale_add_delivery_after_close() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Esc);
        app.apply_country_deliveries();
        assert!(app.status_message.is_empty());
    }

    #[test]
    fn test_quit_keys() {
        let (_rt, mut app) = offline_app(TaskFilter::All);
        assert!(press(&mut app, KeyCode::Char('q')));
        press(&mut app, KeyCode::Char('a'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
    }

    #[test]
    fn test_add_form_picks_from_loaded_countries() {
        let (_rt, mut app) =
            online_app(r#"{"result":{"result":{"FR":"France","BE":"Belgique","IT":"Italie"}}}"#);
        press(&mut app, KeyCode::Char('a'));
        wait_for_countries(&mut app, FormTarget::Add);
        assert_eq!(app.add_form.country.state, LoadState::Ready);
        assert_eq!(app.add_form.country.names(), ["Belgique", "France", "Italie"]);
        assert_eq!(app.add_form.country.selected_name(), "France");

        type_str(&mut app, "Visit");
        app.add_form.current_field = COUNTRY_FIELD;
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        let added = &app.store().tasks()[3];
        assert_eq!(added.name(), "Visit");
        assert_eq!(added.country(), Some("Italie"));
    }

    #[test]
    fn test_edit_keeps_country_missing_from_loaded_list() {
        let (_rt, mut app) = online_app(r#"{"result":{"result":{"BE":"Belgique","IT":"Italie"}}}"#);
        let id = app.store().tasks()[0].id();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('m'));
        wait_for_countries(&mut app, FormTarget::Edit);
        let form = app.detail.as_ref().and_then(DetailView::form).unwrap();
        assert_eq!(form.country.state, LoadState::Ready);
        assert_eq!(form.country.names(), ["Belgique", "Italie"]);

        type_str(&mut app, "!");
        press(&mut app, KeyCode::Enter);

        let saved = app.store().get(id).unwrap();
        assert_eq!(saved.name(), "Task 1!");
        assert_eq!(saved.country(), Some(DEFAULT_COUNTRY));
    }
}
