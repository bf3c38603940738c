//! Buffered sink.
//!
//! Producers call [`LogWriter::emit`], which only enqueues. A single worker
//! task decides when to flush (see [`FlushPolicy`]), turns each batch into an
//! [`InsertPlan`](crate::insert::InsertPlan) and hands it to the injected
//! [`Executor`]. Anything that goes wrong after `emit` returns is reported to
//! [`Diagnostics`].

mod builder;
mod diagnostics;
mod executor;
mod metrics;
mod pipeline;
mod policy;
mod queue;
mod scheduler;
mod writer;

pub use builder::{SinkBuilder, SinkHandles};
pub use diagnostics::{
    CollectingDiagnostics, Diagnostic, Diagnostics, DropReason, TracingDiagnostics,
};
pub use executor::{AsyncExecutor, BlockingExecutor, Executor, StatementLogger};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use pipeline::FlushPipeline;
pub use policy::{
    DEFAULT_BURST_BATCH_LIMIT, DEFAULT_BURST_INTERVAL, DEFAULT_PERIOD,
    DEFAULT_PERIODIC_BATCH_LIMIT, FlushPolicy, Strategy,
};
pub use queue::SchedulerState;
pub use writer::LogWriter;
