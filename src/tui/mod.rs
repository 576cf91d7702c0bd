//! Terminal User Interface Module
//!
//! Lightning wallet dashboard built with Ratatui.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            ⚡ Lightning Dashboard  ●  BTC 67012.50 USD          │
//! ├──────────────┬──────────────────────────────────────────────────┤
//! │ ▶ Wallet Info│  ┌─ Auto Pay on Scroll ───────────────────────┐  │
//! │   Converter  │  │ [ON] Paying 1 sats to satoshi@getalby.com  │  │
//! │   Send       │  └────────────────────────────────────────────┘  │
//! │   Keysend    │  ┌─ Scroll Area ─────────┐ ┌─ Recent Payments ┐  │
//! │   Invoice    │  │ Row 1 ...             │ │ ✓ 1 sats → ...   │  │
//! │   Pay Address│  └───────────────────────┘ └──────────────────┘  │
//! ├──────────────┴──────────────────────────────────────────────────┤
//! │ Ready │ [Tab] Panel [Enter] Submit [F2] Auto-pay [Ctrl+Q] Quit   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;
pub mod widgets;

pub use app::{App, AppEvent, Panel};
pub use event::{AppAction, EventHandler};

use crate::config::Config;
use crate::converter::PriceFeed;
use crate::wallet::Wallet;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Type alias for our terminal backend
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state
pub fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the dashboard until the operator quits
pub async fn run(config: Config, wallet: Wallet, price_feed: Arc<dyn PriceFeed>) -> anyhow::Result<()> {
    info!("Starting dashboard");

    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms);
    let mut app = App::new(config, wallet, price_feed)?;
    app.start();

    let mut terminal = init_terminal()?;
    let mut events = EventHandler::new(tick_rate);

    let result = run_app(&mut terminal, &mut app, &mut events).await;

    if let Err(e) = restore_terminal(&mut terminal) {
        error!("Failed to restore terminal: {}", e);
    }

    result
}

/// Main application loop
async fn run_app(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> anyhow::Result<()> {
    loop {
        let height = terminal.size()?.height;
        app.update_scroll_bounds(ui::SCROLL_CONTENT_ROWS, ui::scroll_viewport_height(height));

        terminal.draw(|frame| ui::render(frame, app))?;

        // Results from wallet, price and auto-pay tasks
        app.poll_events();

        match events.next().await {
            Some(action) => app.handle_action(action),
            None => break,
        }

        if app.should_quit {
            break;
        }
    }

    info!("Dashboard exited normally");
    Ok(())
}
