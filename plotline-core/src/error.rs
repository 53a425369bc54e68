//! Error types for the Plotline core library.

use thiserror::Error;

/// Top-level error type for all Plotline core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Grid synthesis failed; the location stays ungenerated for retry.
    #[error("Grid generation failed for '{location}': {reason}")]
    Generation {
        /// Name of the location being generated.
        location: String,
        /// What went wrong.
        reason: String,
    },

    /// The document store rejected or lost an operation.
    #[error("Store error: {0}")]
    Store(String),

    /// The text-generation collaborator failed after its own retries.
    #[error("Text generation failed: {0}")]
    TextGen(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The turn-event consumer went away; production should stop.
    #[error("Event stream closed by consumer")]
    StreamClosed,

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, CoreError>;
