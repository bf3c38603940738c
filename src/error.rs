//! Sink error types.
//!
//! Construction-time problems surface as [`SinkError::Configuration`]; everything
//! that can go wrong on the flush path is caught at the flush boundary and
//! reported through [`Diagnostics`](crate::sink::Diagnostics) instead of
//! reaching the producer.

use thiserror::Error;

use crate::config::ConfigError;

/// Boxed error returned by executors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Invalid or contradictory setup, detected while building the sink.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required column has no derivable value for an event.
    #[error("schema violation: column '{column}': {reason}")]
    SchemaViolation {
        /// Column that could not be filled.
        column: String,
        /// Why the value is missing.
        reason: String,
    },

    /// The executor rejected a statement.
    #[error("execution failed: {0}")]
    Execution(#[source] BoxError),

    /// A statement was requested for zero rows.
    #[error("refusing to build an insert for an empty batch")]
    EmptyBatch,

    /// The event queue is at its limit; the event was dropped.
    #[error("event queue full (limit {limit}), event dropped")]
    QueueFull {
        /// Configured queue limit.
        limit: usize,
    },

    /// The sink is shutting down and no longer accepts events.
    #[error("sink is closed")]
    Closed,

    /// No async runtime or a worker task failure.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<ConfigError> for SinkError {
    fn from(err: ConfigError) -> Self {
        SinkError::Configuration(err.to_string())
    }
}

impl SinkError {
    /// Shorthand for a configuration error.
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SinkError::Configuration(msg.into())
    }
}
