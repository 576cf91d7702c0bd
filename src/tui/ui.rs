//! UI Rendering
//!
//! Main layout: header, navigation, the selected panel, and a status bar.

use crate::tui::app::{App, Panel};
use crate::tui::theme::{Icons, Theme};
use crate::tui::widgets;
use crate::wallet::validate;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::Instant;

/// Rows of filler content in the auto-pay scroll area
pub const SCROLL_CONTENT_ROWS: u16 = 200;

const HEADER_HEIGHT: u16 = 3;
const STATUS_BAR_HEIGHT: u16 = 1;
const AUTOPAY_CONTROLS_HEIGHT: u16 = 8;

/// Visible rows of the auto-pay scroll area for a terminal of `height` rows
pub fn scroll_viewport_height(height: u16) -> u16 {
    height.saturating_sub(HEADER_HEIGHT + STATUS_BAR_HEIGHT + AUTOPAY_CONTROLS_HEIGHT + 2)
}

/// Render the main UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(10),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(26), Constraint::Min(30)])
        .split(chunks[1]);

    render_nav(frame, body[0], app);
    render_panel(frame, body[1], app);
    render_status_bar(frame, chunks[2], app);

    if app.show_help {
        render_help(frame);
    }
}

/// Header with wallet status dot and the BTC price
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let dot = if app.wallet_available() {
        Span::styled("●", Style::default().fg(Color::Green))
    } else {
        Span::styled("●", Style::default().fg(Color::Red))
    };

    let price = match app.converter.rate() {
        Some(rate) => Span::styled(
            format!("BTC {:.2} {}", rate, app.config.price_feed.currency.to_uppercase()),
            Theme::text_secondary(),
        ),
        None => Span::styled("BTC price unavailable", Theme::text_dim()),
    };

    let title = Paragraph::new(Line::from(vec![
        Span::raw(format!("{} ", Icons::BOLT)),
        Span::styled("Lightning", Theme::title()),
        Span::styled(" Dashboard", Theme::text_secondary()),
        Span::raw("  "),
        dot,
        Span::raw("  "),
        price,
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Theme::border()));

    frame.render_widget(title, area);
}

fn render_nav(frame: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = Panel::ALL
        .iter()
        .map(|panel| {
            let selected = *panel == app.panel;
            let marker = if selected { Icons::SELECTED } else { " " };
            let style = if selected { Theme::selected() } else { Theme::text() };
            let mut spans = vec![Span::styled(format!("{} {}", marker, panel.title()), style)];
            if app.is_busy(*panel) {
                spans.push(Span::styled(format!(" {}", Icons::ACTIVE), Theme::active()));
            }
            Line::from(spans)
        })
        .collect();

    let nav = Paragraph::new(lines).block(
        Block::default()
            .title(" Menu ")
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );
    frame.render_widget(nav, area);
}

fn render_panel(frame: &mut Frame, area: Rect, app: &App) {
    if app.panel == Panel::AutoPay {
        render_autopay(frame, area, app);
        return;
    }

    let block = Block::default()
        .title(format!(" {} ", app.panel.title()))
        .borders(Borders::ALL)
        .border_style(Theme::border_focused());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let status = app.status(app.panel);
    match app.panel {
        Panel::Wallet => render_wallet(frame, inner, app),
        Panel::Converter => {
            let currency = app.config.price_feed.currency.to_uppercase();
            let rate = match (app.converter.rate(), app.converter.sat_price(), app.converter.updated_at()) {
                (Some(rate), Some(sat), Some(at)) => vec![
                    Line::from(Span::styled(
                        format!(
                            "1 BTC = {:.2} {} (updated {})",
                            rate,
                            currency,
                            at.with_timezone(&chrono::Local).format("%H:%M:%S")
                        ),
                        Theme::text_secondary(),
                    )),
                    Line::from(Span::styled(format!("1 sat = {:.8} {}", sat, currency), Theme::text_dim())),
                ],
                _ => vec![Line::from(Span::styled("Fetching BTC price...", Theme::text_dim()))],
            };
            let chunks = split_top(inner, 3);
            frame.render_widget(Paragraph::new(rate), chunks[0]);
            widgets::render_form(
                frame,
                chunks[1],
                &app.converter_form,
                "Type in either field. [F5] refresh price",
                status,
            );
        }
        Panel::Send => widgets::render_form(frame, inner, &app.send_form, "[Enter] pay invoice", status),
        Panel::Keysend => widgets::render_form(frame, inner, &app.keysend_form, "[Enter] send", status),
        Panel::PayAddress => widgets::render_form(frame, inner, &app.pay_form, "[Enter] pay", status),
        Panel::Invoice => render_invoice(frame, inner, app),
        Panel::AutoPay => {}
    }
}

fn split_top(area: Rect, height: u16) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(height), Constraint::Min(1)])
        .split(area)
}

fn render_wallet(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();

    match &app.wallet_info {
        Some(info) => {
            lines.push(Line::from(vec![
                Span::styled("Alias:   ", Theme::text_secondary()),
                Span::styled(info.alias.clone().unwrap_or_else(|| "N/A".to_string()), Theme::text()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Pubkey:  ", Theme::text_secondary()),
                Span::styled(validate::truncate_pubkey(info.pubkey.as_deref()), Theme::text()),
            ]));
            let mut balance = vec![
                Span::styled("Balance: ", Theme::text_secondary()),
                Span::styled(format!("{} sats", info.balance_sats), Theme::amount()),
            ];
            if let Some(value) = app.converter.value_of(info.balance_sats) {
                balance.push(Span::styled(
                    format!("  ≈ {:.2} {}", value, app.config.price_feed.currency.to_uppercase()),
                    Theme::text_dim(),
                ));
            }
            lines.push(Line::from(balance));
        }
        None if app.is_busy(Panel::Wallet) => {
            lines.push(Line::from(Span::styled("Loading wallet info...", Theme::active())));
        }
        None => {
            lines.push(Line::from(Span::styled("No wallet info", Theme::text_dim())));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("[F5] refresh", Theme::text_dim())));
    lines.push(Line::from(""));
    lines.push(widgets::status_line(app.status(Panel::Wallet)));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_invoice(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(3)])
        .split(area);

    widgets::render_form(
        frame,
        chunks[0],
        &app.invoice_form,
        "[Enter] generate invoice",
        app.status(Panel::Invoice),
    );

    if let Some(invoice) = &app.invoice {
        let block = Block::default()
            .title(" Payment Request ")
            .borders(Borders::ALL)
            .border_style(Theme::border());
        let paragraph = Paragraph::new(invoice.payment_request.clone())
            .style(Theme::text())
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(paragraph, chunks[1]);
    }
}

fn render_autopay(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(AUTOPAY_CONTROLS_HEIGHT), Constraint::Min(3)])
        .split(area);

    render_autopay_controls(frame, chunks[0], app);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_scroll_area(frame, lower[0], app);

    if app.show_autopay_settings {
        render_autopay_settings(frame, lower[1], app);
    } else {
        widgets::render_history(frame, lower[1], app.autopay.history());
    }
}

fn render_autopay_controls(frame: &mut Frame, area: Rect, app: &App) {
    let config = app.autopay.config();
    let state = app.autopay.state();

    let badge = if app.autopay.is_enabled() {
        Span::styled(" ON ", Theme::badge_success())
    } else {
        Span::styled(" OFF ", Theme::badge_muted())
    };

    let cooldown = state.cooldown_remaining(config, Instant::now());
    let mut progress = vec![
        Span::styled("Distance: ", Theme::text_secondary()),
        Span::styled(
            format!("{:.0} / {:.0}", state.accumulated_distance(), config.distance_threshold),
            Theme::text(),
        ),
    ];
    if !cooldown.is_zero() {
        progress.push(Span::styled(
            format!("  cooldown {:.1}s", cooldown.as_secs_f64()),
            Theme::warning(),
        ));
    }
    if app.autopay.is_processing() {
        progress.push(Span::styled("  processing...", Theme::active()));
    }

    let lines = vec![
        Line::from(vec![
            badge,
            Span::styled("  [F2] toggle  [F4] settings", Theme::text_dim()),
        ]),
        Line::from(vec![
            Span::styled("Paying ", Theme::text_secondary()),
            Span::styled(format!("{} sats", config.amount_sats), Theme::amount()),
            Span::styled(" to ", Theme::text_secondary()),
            Span::styled(config.recipient.clone(), Theme::text()),
        ]),
        Line::from(vec![
            Span::styled("Every ", Theme::text_secondary()),
            Span::styled(format!("{:.0}px", config.distance_threshold), Theme::text()),
            Span::styled(" scrolled, at most once per ", Theme::text_secondary()),
            Span::styled(format!("{}s", config.cooldown.as_secs()), Theme::text()),
        ]),
        Line::from(progress),
        Line::from(""),
        widgets::status_line(app.autopay.status()),
    ];

    let block = Block::default()
        .title(format!(" {} ", Panel::AutoPay.title()))
        .borders(Borders::ALL)
        .border_style(Theme::border_focused());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Filler content to scroll through
fn render_scroll_area(frame: &mut Frame, area: Rect, app: &App) {
    let sats = app.autopay.config().amount_sats;
    let lines: Vec<Line> = (1..=SCROLL_CONTENT_ROWS)
        .map(|row| {
            let text = if row % 10 == 0 {
                format!("{} Section {} {}", Icons::BOLT, row / 10, Icons::BOLT)
            } else {
                format!("Row {}: keep scrolling to stream {} sats", row, sats)
            };
            let style = if row % 10 == 0 { Theme::title() } else { Theme::text_secondary() };
            Line::from(Span::styled(text, style))
        })
        .collect();

    let block = Block::default()
        .title(format!(" Scroll Area ({} rows) ", app.scroll_offset))
        .borders(Borders::ALL)
        .border_style(if app.autopay.is_enabled() {
            Theme::border_focused()
        } else {
            Theme::border()
        });

    let paragraph = Paragraph::new(lines).block(block).scroll((app.scroll_offset, 0));
    frame.render_widget(paragraph, area);
}

fn render_autopay_settings(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Auto-pay Settings ")
        .borders(Borders::ALL)
        .border_style(Theme::border_focused());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    widgets::render_form(
        frame,
        inner,
        &app.autopay_form,
        "[Enter] save  [Esc] cancel",
        app.settings_status(),
    );
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let state = if app.autopay.is_processing() {
        Span::styled("Processing payment...", Theme::active())
    } else if app.autopay.is_enabled() {
        Span::styled("Auto-pay ON", Theme::success())
    } else {
        Span::styled("Ready", Theme::text_secondary())
    };

    let shortcuts = vec![
        Span::styled(" [Tab]", Theme::shortcut_key()),
        Span::styled(" Panel ", Theme::shortcut_desc()),
        Span::styled("[Enter]", Theme::shortcut_key()),
        Span::styled(" Submit ", Theme::shortcut_desc()),
        Span::styled("[F2]", Theme::shortcut_key()),
        Span::styled(" Auto-pay ", Theme::shortcut_desc()),
        Span::styled("[Ctrl+Q]", Theme::shortcut_key()),
        Span::styled(" Quit ", Theme::shortcut_desc()),
        Span::styled("[F1]", Theme::shortcut_key()),
        Span::styled(" Help", Theme::shortcut_desc()),
    ];

    let line = Line::from(
        std::iter::once(state)
            .chain(std::iter::once(Span::raw(" │ ")))
            .chain(shortcuts)
            .collect::<Vec<_>>(),
    );

    frame.render_widget(Paragraph::new(line), area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let shortcut = |key: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("{:<14}", key), Theme::shortcut_key()),
            Span::styled(desc, Theme::text()),
        ])
    };

    let help_lines = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Theme::heading())),
        Line::from(""),
        shortcut("Tab/Shift+Tab", "Next / previous panel"),
        shortcut("↑/↓", "Move between fields, scroll"),
        shortcut("PageUp/Down", "Scroll a page"),
        shortcut("Enter", "Submit the current form"),
        shortcut("Esc", "Clear status / close settings"),
        shortcut("F2", "Toggle auto-pay on scroll"),
        shortcut("F4", "Auto-pay settings"),
        shortcut("F5", "Refresh wallet info / BTC price"),
        shortcut("Ctrl+Q", "Quit"),
        shortcut("F1", "Show this help"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Theme::text_dim())),
    ];

    let paragraph = Paragraph::new(help_lines).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Theme::border_focused()),
    );

    frame.render_widget(paragraph, area);
}

/// Helper to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::converter::PriceFeed;
    use crate::types::AppResult;
    use crate::wallet::Wallet;
    use async_trait::async_trait;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;

    struct NoFeed;

    #[async_trait]
    impl PriceFeed for NoFeed {
        async fn fetch_rate(&self) -> AppResult<f64> {
            Ok(1.0)
        }

        fn currency(&self) -> &str {
            "usd"
        }
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_viewport_height() {
        assert_eq!(scroll_viewport_height(40), 26);
        assert_eq!(scroll_viewport_height(5), 0);
    }

    #[test]
    fn test_centered_rect_is_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 60, area);
        assert_eq!(popup.width, 60);
        assert!(popup.x >= 20 && popup.bottom() <= 50);
    }

    #[tokio::test]
    async fn test_render_autopay_panel() {
        let mut app = App::new(Config::default(), Wallet::unavailable(), Arc::new(NoFeed)).unwrap();
        app.panel = Panel::AutoPay;

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("OFF"));
        assert!(text.contains("satoshi@getalby.com"));
        assert!(text.contains("No payments yet"));
    }

    #[tokio::test]
    async fn test_render_help_overlay() {
        let mut app = App::new(Config::default(), Wallet::unavailable(), Arc::new(NoFeed)).unwrap();
        app.show_help = true;

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        assert!(buffer_text(&terminal).contains("Keyboard Shortcuts"));
    }
}
