// Error types for the reconciliation core

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, HeraldError>;

/// Errors that can occur while reconciling changes and dispatching pushes
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Event cannot be processed as-is (missing title or scheduled date)
    #[error("Invalid event: {0}")]
    Validation(String),

    /// Document store read/write failure
    #[error("Store error: {0}")]
    Store(String),

    /// Push transport rejected a send
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// The change subscription itself failed
    #[error("Stream error: {0}")]
    Stream(String),

    /// Event id did not resolve
    #[error("Event not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HeraldError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        HeraldError::Validation(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        HeraldError::Store(msg.into())
    }

    /// Create a dispatch error
    pub fn dispatch(msg: impl Into<String>) -> Self {
        HeraldError::Dispatch(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        HeraldError::Stream(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(event_id: impl Into<String>) -> Self {
        HeraldError::NotFound(event_id.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        HeraldError::Configuration(msg.into())
    }
}
