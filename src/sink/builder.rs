//! Sink builder and handles.
//!
//! Provides a builder pattern for constructing a sink from [`SinkConfig`]
//! and a handles struct owning its worker task.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::columns::{ColumnSchema, RowMaterializer};
use crate::config::SinkConfig;
use crate::error::SinkError;
use crate::insert::InsertSynthesizer;

use super::diagnostics::{Diagnostics, TracingDiagnostics};
use super::executor::Executor;
use super::metrics::MetricsSnapshot;
use super::pipeline::FlushPipeline;
use super::queue::{EventQueue, SchedulerState};
use super::scheduler::Worker;
use super::writer::LogWriter;

/// Builder for constructing a sink.
pub struct SinkBuilder {
    config: SinkConfig,
    executor: Option<Executor>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl std::fmt::Debug for SinkBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkBuilder")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl SinkBuilder {
    /// Create a new sink builder. Diagnostics default to `tracing`.
    pub fn new(config: SinkConfig) -> Self {
        Self {
            config,
            executor: None,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Set the statement executor (required).
    pub fn executor(mut self, executor: Executor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Set the diagnostics sink.
    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Build the flush pipeline only, without a queue or worker.
    ///
    /// # Errors
    /// Returns [`SinkError::Configuration`] for invalid configuration or a
    /// missing executor.
    pub fn build_pipeline(&self) -> Result<FlushPipeline, SinkError> {
        self.config.validate()?;
        let executor = self
            .executor
            .clone()
            .ok_or_else(|| SinkError::config("no executor configured"))?;

        let schema = Arc::new(ColumnSchema::resolve(
            &self.config.columns,
            self.config.id_function.as_deref(),
        )?);
        let synthesizer = InsertSynthesizer::new(&self.config.table, &schema, self.config.bind_mode)?;
        let materializer = RowMaterializer::new(
            schema,
            self.config.columns.clone(),
            self.config.format.clone(),
        );
        Ok(FlushPipeline::new(
            materializer,
            synthesizer,
            executor,
            Arc::clone(&self.diagnostics),
        ))
    }

    /// Build the sink and spawn its worker on the current tokio runtime.
    ///
    /// # Errors
    /// Returns [`SinkError::Configuration`] for invalid configuration, and
    /// [`SinkError::Runtime`] when called outside a tokio runtime.
    pub fn build(self) -> Result<SinkHandles, SinkError> {
        let pipeline = self.build_pipeline()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SinkError::Runtime(format!("no tokio runtime: {e}")))?;

        let policy = self.config.batching.clone();
        let queue = Arc::new(EventQueue::new(
            self.config.queue_limit,
            policy.size_trigger(),
            Arc::clone(&self.diagnostics),
        ));

        tracing::info!(
            table = %self.config.table,
            mode = %self.config.bind_mode,
            strategy = %policy.strategy(),
            batch_limit = ?policy.batch_limit(),
            interval = ?policy.interval(),
            queue_limit = ?self.config.queue_limit,
            "Log sink started"
        );

        let worker = Worker::new(Arc::clone(&queue), pipeline, policy, self.diagnostics);
        let task = runtime.spawn(worker.run());

        Ok(SinkHandles {
            writer: LogWriter::new(Arc::clone(&queue)),
            queue,
            task: Some(task),
        })
    }
}

/// Handles to a running sink.
pub struct SinkHandles {
    /// Event writer (cloneable).
    pub writer: LogWriter,

    queue: Arc<EventQueue>,
    task: Option<JoinHandle<MetricsSnapshot>>,
}

impl std::fmt::Debug for SinkHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkHandles")
            .field("state", &self.queue.state())
            .finish_non_exhaustive()
    }
}

impl SinkHandles {
    /// Current scheduler state.
    pub fn state(&self) -> SchedulerState {
        self.queue.state()
    }

    /// Current counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.queue.metrics.snapshot()
    }

    /// Stop accepting events, wait for any in-flight flush, write what is
    /// left and stop the worker.
    ///
    /// # Errors
    /// Returns [`SinkError::Runtime`] if the worker task panicked.
    pub async fn shutdown(mut self) -> Result<MetricsSnapshot, SinkError> {
        self.queue.close();
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| SinkError::Runtime(format!("sink worker failed: {e}"))),
            None => Ok(self.queue.metrics.snapshot()),
        }
    }
}

impl Drop for SinkHandles {
    fn drop(&mut self) {
        // The worker drains on its own once closed.
        if self.task.is_some() {
            self.queue.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::insert::InsertPlan;

    fn executor() -> Executor {
        Executor::blocking(|_: &InsertPlan| -> Result<(), BoxError> { Ok(()) })
    }

    #[test]
    fn test_build_requires_executor() {
        let err = SinkBuilder::new(SinkConfig::default()).build_pipeline().unwrap_err();
        assert!(matches!(err, SinkError::Configuration(_)));
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let err = SinkBuilder::new(SinkConfig::default())
            .executor(executor())
            .build()
            .unwrap_err();
        assert!(matches!(err, SinkError::Runtime(_)));
    }

    #[test]
    fn test_invalid_config_fails_eagerly() {
        let mut config = SinkConfig::default();
        config.table = String::new();
        let err = SinkBuilder::new(config)
            .executor(executor())
            .build_pipeline()
            .unwrap_err();
        assert!(matches!(err, SinkError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_build_and_shutdown_idle() {
        let handles = SinkBuilder::new(SinkConfig::default())
            .executor(executor())
            .build()
            .unwrap();
        assert_eq!(handles.state(), SchedulerState::Idle);
        let writer = handles.writer.clone();
        let snapshot = handles.shutdown().await.unwrap();
        assert_eq!(snapshot, MetricsSnapshot::default());
        assert_eq!(writer.state(), SchedulerState::Terminated);
    }
}
