//! One flush: rows, statement, execution.

use std::sync::Arc;

use crate::columns::{MaterializedBatch, Row, RowMaterializer};
use crate::error::SinkError;
use crate::event::LogEvent;
use crate::insert::{InsertPlan, InsertSynthesizer};

use super::diagnostics::{Diagnostic, Diagnostics};
use super::executor::Executor;
use super::metrics::SinkMetrics;

/// Materializer, synthesizer and executor for one sink.
#[derive(Clone)]
pub struct FlushPipeline {
    materializer: RowMaterializer,
    synthesizer: InsertSynthesizer,
    executor: Executor,
    diagnostics: Arc<dyn Diagnostics>,
}

impl std::fmt::Debug for FlushPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushPipeline")
            .field("mode", &self.synthesizer.mode())
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl FlushPipeline {
    pub fn new(
        materializer: RowMaterializer,
        synthesizer: InsertSynthesizer,
        executor: Executor,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            materializer,
            synthesizer,
            executor,
            diagnostics,
        }
    }

    /// Build the plan for a batch without executing it.
    ///
    /// Rejected events are reported and skipped. Returns `Ok(None)` when no
    /// event of the batch could be materialized.
    pub fn plan(&self, batch: &[LogEvent]) -> Result<Option<InsertPlan>, SinkError> {
        let (rows, _) = self.materialize(batch);
        if rows.is_empty() {
            return Ok(None);
        }
        self.synthesizer.synthesize(&rows).map(Some)
    }

    /// Surviving rows plus the number of rejected events, which are reported.
    fn materialize(&self, batch: &[LogEvent]) -> (Vec<Row>, usize) {
        let MaterializedBatch { rows, rejected } = self.materializer.materialize_batch(batch);
        let rejected_count = rejected.len();
        for (position, error) in rejected {
            self.diagnostics.report(Diagnostic::RowRejected {
                position,
                error: error.to_string(),
            });
        }
        (rows, rejected_count)
    }

    /// Write one batch. Failures are reported, never returned: the batch is
    /// consumed either way.
    pub(crate) async fn flush(&self, batch: Vec<LogEvent>, metrics: &SinkMetrics) {
        let (rows, rejected) = self.materialize(&batch);
        drop(batch);
        if rejected > 0 {
            metrics.rows_rejected(rejected as u64);
        }
        if rows.is_empty() {
            return;
        }

        let plan = match self.synthesizer.synthesize(&rows) {
            Ok(plan) => plan,
            Err(e) => {
                self.failed(rows.len(), &e, metrics);
                return;
            }
        };
        drop(rows);

        let rows = plan.row_count;
        match self.executor.run(plan).await {
            Ok(()) => {
                metrics.batch_written(rows as u64);
                tracing::debug!(rows, "Flushed batch");
            }
            Err(e) => self.failed(rows, &e, metrics),
        }
    }

    /// Rejected events were already reported, so `rows` counts only the
    /// events lost with the statement.
    fn failed(&self, rows: usize, error: &SinkError, metrics: &SinkMetrics) {
        metrics.flush_failed();
        self.diagnostics.report(Diagnostic::FlushFailed {
            events: rows,
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{AdditionalColumn, ColumnOptions, ColumnSchema, SqlValue};
    use crate::error::BoxError;
    use crate::event::{FormatOptions, Level};
    use crate::insert::{BindMode, ParamValue};
    use crate::sink::CollectingDiagnostics;

    fn pipeline(executor: Executor, diagnostics: Arc<CollectingDiagnostics>) -> FlushPipeline {
        let options = ColumnOptions::custom_only(vec![AdditionalColumn::text("User").required()]);
        let schema = Arc::new(ColumnSchema::resolve(&options, None).unwrap());
        let synthesizer = InsertSynthesizer::new("LOG", &schema, BindMode::MultiRow).unwrap();
        let materializer = RowMaterializer::new(schema, options, FormatOptions::default());
        FlushPipeline::new(materializer, synthesizer, executor, diagnostics)
    }

    fn ok_executor() -> Executor {
        Executor::blocking(|_: &InsertPlan| -> Result<(), BoxError> { Ok(()) })
    }

    fn user(name: &str) -> LogEvent {
        LogEvent::new(Level::Information, "hi").with_property("User", name)
    }

    #[test]
    fn test_plan_skips_rejected_events() {
        let diagnostics = Arc::new(CollectingDiagnostics::new());
        let pipeline = pipeline(ok_executor(), diagnostics.clone());
        let batch = vec![user("a"), LogEvent::new(Level::Information, "anon"), user("b")];
        let plan = pipeline.plan(&batch).unwrap().unwrap();
        assert_eq!(plan.row_count, 2);
        assert!(plan.sql.contains(":User_1"));
        assert!(!plan.sql.contains(":User_2"));
        // `_1` is the second surviving row, the third event of the batch.
        assert_eq!(
            plan.params.get(":User_1"),
            Some(&ParamValue::Scalar(SqlValue::Text("b".to_string())))
        );
        assert_eq!(
            diagnostics.count(|d| matches!(d, Diagnostic::RowRejected { position: 1, .. })),
            1
        );
    }

    #[test]
    fn test_plan_all_rejected_is_none() {
        let diagnostics = Arc::new(CollectingDiagnostics::new());
        let pipeline = pipeline(ok_executor(), diagnostics);
        let batch = vec![LogEvent::new(Level::Information, "anon")];
        assert!(pipeline.plan(&batch).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_flush_success_counts_rows() {
        let diagnostics = Arc::new(CollectingDiagnostics::new());
        let pipeline = pipeline(ok_executor(), diagnostics.clone());
        let metrics = SinkMetrics::new();
        pipeline.flush(vec![user("a"), user("b")], &metrics).await;
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_flushed, 1);
        assert_eq!(snapshot.rows_written, 2);
        assert!(diagnostics.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_flush_failure_is_reported_not_returned() {
        let diagnostics = Arc::new(CollectingDiagnostics::new());
        let executor = Executor::blocking(|_: &InsertPlan| -> Result<(), BoxError> {
            Err("connection reset".into())
        });
        let pipeline = pipeline(executor, diagnostics.clone());
        let metrics = SinkMetrics::new();
        pipeline.flush(vec![user("a")], &metrics).await;

        assert_eq!(metrics.snapshot().flush_failures, 1);
        assert_eq!(metrics.snapshot().rows_written, 0);
        match &diagnostics.snapshot()[..] {
            [Diagnostic::FlushFailed { events: 1, error }] => {
                assert!(error.contains("connection reset"))
            }
            other => panic!("unexpected diagnostics: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_flush_failure_counts_only_surviving_rows() {
        let diagnostics = Arc::new(CollectingDiagnostics::new());
        let executor = Executor::blocking(|_: &InsertPlan| -> Result<(), BoxError> {
            Err("ORA-00001: unique constraint violated".into())
        });
        let pipeline = pipeline(executor, diagnostics.clone());
        let metrics = SinkMetrics::new();
        let batch = vec![user("a"), LogEvent::new(Level::Information, "anon"), user("b")];
        pipeline.flush(batch, &metrics).await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rows_rejected, 1);
        assert_eq!(snapshot.flush_failures, 1);
        assert_eq!(
            diagnostics.count(|d| matches!(d, Diagnostic::RowRejected { position: 1, .. })),
            1
        );
        assert_eq!(
            diagnostics.count(|d| matches!(d, Diagnostic::FlushFailed { events: 2, .. })),
            1
        );
        assert_eq!(diagnostics.count(|d| matches!(d, Diagnostic::FlushFailed { .. })), 1);
    }
}
