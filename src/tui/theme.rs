//! Theme and Styling
//!
//! Colors and styles for the dashboard.

use crate::types::StatusKind;
use ratatui::style::{Color, Modifier, Style};

/// Application theme
pub struct Theme;

impl Theme {
    // === Primary Colors ===

    /// Bitcoin orange
    pub const ACCENT: Color = Color::Rgb(247, 147, 26);

    pub const SUCCESS: Color = Color::Rgb(34, 197, 94);

    pub const WARNING: Color = Color::Rgb(251, 191, 36);

    pub const ERROR: Color = Color::Rgb(239, 68, 68);

    /// Informational status (blue)
    pub const INFO: Color = Color::Rgb(59, 130, 246);

    // === Text Colors ===

    pub const TEXT_PRIMARY: Color = Color::Rgb(229, 229, 229);

    pub const TEXT_SECONDARY: Color = Color::Rgb(161, 161, 161);

    pub const TEXT_DIM: Color = Color::Rgb(82, 82, 82);

    // === Border Colors ===

    pub const BORDER: Color = Color::Rgb(51, 51, 51);

    pub const BORDER_FOCUSED: Color = Color::Rgb(247, 147, 26);

    // === Styles ===

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::TEXT_DIM)
    }

    pub fn title() -> Style {
        Style::default().fg(Self::ACCENT).add_modifier(Modifier::BOLD)
    }

    pub fn heading() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY).add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::BORDER_FOCUSED)
    }

    /// Selected navigation item / focused field label
    pub fn selected() -> Style {
        Style::default().fg(Self::ACCENT).add_modifier(Modifier::BOLD)
    }

    pub fn shortcut_key() -> Style {
        Style::default().fg(Self::ACCENT).add_modifier(Modifier::BOLD)
    }

    pub fn shortcut_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Work in progress (payment processing, fetches)
    pub fn active() -> Style {
        Style::default().fg(Self::WARNING).add_modifier(Modifier::BOLD)
    }

    pub fn placeholder() -> Style {
        Style::default().fg(Self::TEXT_DIM)
    }

    /// Large figures such as the wallet balance
    pub fn amount() -> Style {
        Style::default().fg(Self::ACCENT).add_modifier(Modifier::BOLD)
    }

    /// "ON" badge for auto-pay
    pub fn badge_success() -> Style {
        Style::default().fg(Color::Black).bg(Self::SUCCESS).add_modifier(Modifier::BOLD)
    }

    /// "OFF" badge for auto-pay
    pub fn badge_muted() -> Style {
        Style::default().fg(Color::Black).bg(Self::TEXT_SECONDARY).add_modifier(Modifier::BOLD)
    }

    /// Style for a status line of the given kind
    pub fn status(kind: StatusKind) -> Style {
        match kind {
            StatusKind::Info => Style::default().fg(Self::INFO),
            StatusKind::Success => Self::success(),
            StatusKind::Error => Self::error(),
        }
    }
}

pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const ACTIVE: &'static str = "●";
    pub const CURSOR: &'static str = "▌";
    pub const SELECTED: &'static str = "▶";
    pub const BOLT: &'static str = "⚡";
    pub const INFO: &'static str = "ℹ";
}

/// Icon prefix for a status line
pub fn status_icon(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Info => Icons::INFO,
        StatusKind::Success => Icons::SUCCESS,
        StatusKind::Error => Icons::ERROR,
    }
}
