//! Event Handling
//!
//! Turns terminal key, mouse and timer events into dashboard actions.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;

/// Actions that can be performed in the dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Quit the application
    Quit,
    /// Move to the next panel (Tab)
    NextPanel,
    /// Move to the previous panel (Shift+Tab)
    PrevPanel,
    /// Submit the current panel's form (Enter)
    Submit,
    /// Dismiss status / close modals
    Escape,
    /// Toggle help view
    ToggleHelp,
    /// Enable or disable auto-pay on scroll
    ToggleAutoPay,
    /// Show or hide the auto-pay settings form
    ToggleAutoPaySettings,
    /// Re-run the panel's fetch (wallet info, BTC price)
    Refresh,
    /// Up arrow / wheel up
    ScrollUp,
    /// Down arrow / wheel down
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    /// Delete character
    DeleteKey,
    /// Typed character
    Input(char),
    /// Timer tick
    Tick,
}

/// Event handler for the TUI
pub struct EventHandler {
    rx: mpsc::Receiver<AppAction>,
    _tx: mpsc::Sender<AppAction>,
}

impl EventHandler {
    /// Create a new event handler with specified tick rate
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel(100);
        let tx_clone = tx.clone();

        tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut tick_interval = tokio::time::interval(tick_rate);

            loop {
                let tick = tick_interval.tick();
                let crossterm_event = reader.next().fuse();

                tokio::select! {
                    _ = tick => {
                        if tx_clone.send(AppAction::Tick).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(evt)) = crossterm_event => {
                        if let Some(action) = map_event(evt) {
                            if tx_clone.send(action).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Wait for the next action
    pub async fn next(&mut self) -> Option<AppAction> {
        self.rx.recv().await
    }
}

/// Map a crossterm event to an app action
pub fn map_event(event: Event) -> Option<AppAction> {
    match event {
        Event::Key(key) => map_key_event(key),
        Event::Mouse(mouse) => map_mouse_event(mouse),
        _ => None,
    }
}

fn map_mouse_event(mouse: MouseEvent) -> Option<AppAction> {
    match mouse.kind {
        MouseEventKind::ScrollUp => Some(AppAction::ScrollUp),
        MouseEventKind::ScrollDown => Some(AppAction::ScrollDown),
        _ => None,
    }
}

/// Map a key event to an app action
pub fn map_key_event(key: KeyEvent) -> Option<AppAction> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
            Some(AppAction::Quit)
        }
        (KeyModifiers::SHIFT, KeyCode::BackTab) => Some(AppAction::PrevPanel),

        (KeyModifiers::NONE, code) | (KeyModifiers::SHIFT, code) => match code {
            KeyCode::Esc => Some(AppAction::Escape),
            KeyCode::Enter => Some(AppAction::Submit),
            KeyCode::Tab => Some(AppAction::NextPanel),
            KeyCode::BackTab => Some(AppAction::PrevPanel),

            KeyCode::F(1) => Some(AppAction::ToggleHelp),
            KeyCode::F(2) => Some(AppAction::ToggleAutoPay),
            KeyCode::F(4) => Some(AppAction::ToggleAutoPaySettings),
            KeyCode::F(5) => Some(AppAction::Refresh),

            KeyCode::Up => Some(AppAction::ScrollUp),
            KeyCode::Down => Some(AppAction::ScrollDown),
            KeyCode::PageUp => Some(AppAction::ScrollPageUp),
            KeyCode::PageDown => Some(AppAction::ScrollPageDown),

            KeyCode::Backspace => Some(AppAction::DeleteKey),
            KeyCode::Char(c) => Some(AppAction::Input(c)),
            _ => None,
        },

        _ => None,
    }
}
