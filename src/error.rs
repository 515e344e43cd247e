//! Error types and handling.

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Empty or otherwise invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced staff member does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rotation requested while nobody is marked present
    #[error("No staff marked present")]
    EmptySelection,

    /// Key-value backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding of persisted state failed
    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Excel export error
    #[error("Export error: {0}")]
    Export(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error with message
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a storage error with message
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a config error with message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error came from user input rather than the backend.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_) | Self::EmptySelection)
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors() {
        assert!(AppError::validation("empty").is_user_error());
        assert!(AppError::not_found("abc").is_user_error());
        assert!(AppError::EmptySelection.is_user_error());
        assert!(!AppError::storage("disk full").is_user_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(AppError::not_found("staff abc").to_string(), "Not found: staff abc");
        assert_eq!(AppError::EmptySelection.to_string(), "No staff marked present");
    }
}
