// Lightning Dash - terminal dashboard for a Lightning wallet with auto-pay on scroll

pub mod autopay;
pub mod config;
pub mod converter;
pub mod tui; // Terminal User Interface
pub mod types;
pub mod wallet;

// Re-exports for convenience
pub use config::Config;
pub use types::{AppError, AppResult};
