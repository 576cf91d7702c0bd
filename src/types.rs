// Shared error type and small value types

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Wallet provider not available. Configure an LNbits wallet to use this feature.")]
    ProviderUnavailable,

    #[error("Wallet provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Price feed error: {0}")]
    PriceFeed(String),

    #[error("Payment timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AppError {
    /// Input validation failures are rejected before any provider call
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::InvalidInput(_))
    }

    /// Provider failure from a panic payload caught around a provider call
    pub fn from_panic(panic: Box<dyn std::any::Any + Send>) -> Self {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        AppError::Provider(format!("payment aborted: {}", message))
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Severity of a user-visible status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// User-visible status message for a panel or feature
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: StatusKind::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: StatusKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: StatusKind::Error, message: message.into() }
    }
}

impl From<&AppError> for Status {
    fn from(err: &AppError) -> Self {
        Status::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_panic_keeps_message() {
        let err = AppError::from_panic(Box::new("boom"));
        assert_eq!(err.to_string(), "Wallet provider error: payment aborted: boom");

        let err = AppError::from_panic(Box::new(String::from("lost peer")));
        assert!(err.to_string().contains("lost peer"));

        let err = AppError::from_panic(Box::new(42u8));
        assert!(err.to_string().contains("unknown panic"));
    }

    #[test]
    fn test_validation_classification() {
        assert!(AppError::InvalidInput("amount".into()).is_validation());
        assert!(!AppError::ProviderUnavailable.is_validation());
        assert!(!AppError::Provider("insufficient balance".into()).is_validation());
    }

    #[test]
    fn test_status_from_error() {
        let status = Status::from(&AppError::Provider("route not found".to_string()));
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.message, "Wallet provider error: route not found");
    }
}
