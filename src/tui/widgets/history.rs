//! Payment History Widget
//!
//! Recent auto-payments, newest first, with the session total.

use crate::autopay::PaymentHistory;
use crate::tui::theme::{Icons, Theme};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_history(frame: &mut Frame, area: Rect, history: &PaymentHistory) {
    let block = Block::default()
        .title(format!(" Recent Payments ({} sats) ", history.total_paid_sats()))
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if history.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No payments yet",
            Theme::text_dim(),
        )));
        frame.render_widget(empty, inner);
        return;
    }

    let lines: Vec<Line> = history
        .iter()
        .map(|record| {
            let (icon, style) = if record.is_success() {
                (Icons::SUCCESS, Theme::success())
            } else {
                (Icons::ERROR, Theme::error())
            };
            Line::from(vec![
                Span::styled(format!("{} ", icon), style),
                Span::styled(format!("{} sats", record.amount_sats), Theme::text()),
                Span::styled(format!(" → {} ", record.recipient), Theme::text_secondary()),
                Span::styled(record.time_label(), Theme::text_dim()),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
