//! Form Widget
//!
//! Stacked single-line inputs with a focus marker, plus a status line.

use crate::tui::app::Form;
use crate::tui::theme::{status_icon, Icons, Theme};
use crate::types::Status;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

/// Lines for every field in `form`. The cursor is only drawn when `focused`.
pub fn form_lines(form: &Form, focused: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (i, field) in form.fields.iter().enumerate() {
        let is_current = focused && i == form.focus;
        let marker = if is_current { Icons::SELECTED } else { " " };
        let label_style = if is_current { Theme::selected() } else { Theme::text_secondary() };

        lines.push(Line::from(vec![
            Span::styled(format!("{} ", marker), label_style),
            Span::styled(field.label, label_style),
        ]));

        let mut value = vec![Span::raw("  ")];
        if field.value.is_empty() {
            value.push(Span::styled(field.placeholder, Theme::placeholder()));
        } else {
            value.push(Span::styled(field.value.clone(), Theme::text()));
        }
        if is_current {
            value.push(Span::styled(Icons::CURSOR, Theme::active()));
        }
        lines.push(Line::from(value));
        lines.push(Line::from(""));
    }

    lines
}

/// One status line, or a blank line when there is nothing to report
pub fn status_line(status: Option<&Status>) -> Line<'static> {
    match status {
        Some(status) => Line::from(vec![
            Span::styled(format!("{} ", status_icon(status.kind)), Theme::status(status.kind)),
            Span::styled(status.message.clone(), Theme::status(status.kind)),
        ]),
        None => Line::from(""),
    }
}

/// Render a form followed by a hint and its status
pub fn render_form(frame: &mut Frame, area: Rect, form: &Form, hint: &str, status: Option<&Status>) {
    let mut lines = form_lines(form, true);
    lines.push(Line::from(Span::styled(hint.to_string(), Theme::text_dim())));
    lines.push(Line::from(""));
    lines.push(status_line(status));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
