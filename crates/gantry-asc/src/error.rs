//! App Store Connect error types

use thiserror::Error;

/// Errors returned by the App Store Connect client
#[derive(Debug, Error)]
pub enum AscError {
    /// Invalid credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// API error from App Store Connect
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// App not found
    #[error("App not found: {0}")]
    AppNotFound(String),

    /// No editable App Store version
    #[error("No editable App Store version for app {0}")]
    NoEditableVersion(String),

    /// Build not found
    #[error("Build not found: {0}")]
    BuildNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Result type for App Store Connect operations
pub type Result<T> = std::result::Result<T, AscError>;
