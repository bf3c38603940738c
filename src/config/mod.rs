//! Configuration module for the log sink.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Target table, id function and bind mode
//! - Queue limit and batching strategy
//! - Column layout and value formatting

mod sink;
mod validation;

pub use sink::{DEFAULT_QUEUE_LIMIT, DEFAULT_TABLE, SinkConfig};
pub use validation::{ConfigError, expand_env_vars};
