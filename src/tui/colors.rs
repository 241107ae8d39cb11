//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Priority;

/// High priority rows and the warning marker.
pub const ALERT_RED: Color = Color::Rgb(200, 30, 30);
/// Medium priority.
pub const AMBER: Color = Color::Rgb(255, 200, 0);
/// Low priority.
pub const LEAF_GREEN: Color = Color::Rgb(40, 160, 60);
/// Focused form field borders.
pub const GOLD: Color = Color::Rgb(255, 215, 0);

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => ALERT_RED,
        Priority::Medium => AMBER,
        Priority::Low => LEAF_GREEN,
    }
}

/// Marker shown next to the priority label. Only High carries one.
pub fn priority_icon(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "⚠ ",
        Priority::Medium | Priority::Low => "",
    }
}

pub fn done_icon(is_done: bool) -> &'static str {
    if is_done {
        "✔"
    } else {
        "✘"
    }
}
