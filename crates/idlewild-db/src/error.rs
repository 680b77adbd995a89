//! Error types for the durable store backends.

/// Errors that can occur in a durable store backend.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A configuration error (bad URL, unreachable backend).
    #[error("Configuration error: {0}")]
    Config(String),
}
