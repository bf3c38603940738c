//! Batchlog - buffered bulk-insert log sink
//!
//! Collects structured log events in memory and writes them to a relational
//! table in batches, one multi-row `INSERT` per flush. The library never
//! opens a connection itself: every statement goes to an injected
//! [`Executor`](sink::Executor).
//!
//! # Architecture
//!
//! - **Events**: [`LogEvent`] with a level, message template and ordered properties
//! - **Columns**: role-based column mapping and per-event row materialization
//! - **Format**: nested-element and JSON renderers for property bags
//! - **Insert**: multi-row and array-bind statement synthesis
//! - **Sink**: bounded queue, burst/periodic flush worker and diagnostics
//!
//! # Example
//!
//! ```rust,no_run
//! use batchlog::{Executor, Level, LogEvent, SinkBuilder, SinkConfig, StatementLogger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handles = SinkBuilder::new(SinkConfig::default())
//!         .executor(Executor::blocking(StatementLogger::default()))
//!         .build()?;
//!
//!     handles
//!         .writer
//!         .emit(LogEvent::new(Level::Information, "User {Name} logged in").with_property("Name", "ada"))?;
//!
//!     let metrics = handles.shutdown().await?;
//!     assert_eq!(metrics.events_received, 1);
//!     Ok(())
//! }
//! ```

pub mod columns;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod insert;
pub mod sink;

pub use config::SinkConfig;
pub use error::{BoxError, SinkError};
pub use event::{Level, LogEvent, Properties, PropertyValue, Scalar};
pub use insert::{BindMode, InsertPlan};
pub use sink::{
    AsyncExecutor, BlockingExecutor, Diagnostic, Diagnostics, Executor, FlushPolicy, LogWriter,
    MetricsSnapshot, SinkBuilder, SinkHandles, StatementLogger,
};
