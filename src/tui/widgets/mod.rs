//! TUI Widgets
//!
//! Reusable pieces of the dashboard panels.

mod form;
mod history;

pub use form::{form_lines, render_form, status_line};
pub use history::render_history;
