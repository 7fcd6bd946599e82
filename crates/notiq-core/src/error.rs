//! Unified error types for notiq.

use thiserror::Error;

/// Result type alias using NotiqError.
pub type Result<T> = std::result::Result<T, NotiqError>;

#[derive(Error, Debug)]
pub enum NotiqError {
    // Queue store errors
    #[error("Store error: {0}")]
    Store(String),

    // Host notification-center errors
    #[error("Gateway error: {0}")]
    Gateway(String),

    // Bad scheduling requests (empty ranges, zero intervals)
    #[error("Schedule error: {0}")]
    Schedule(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
