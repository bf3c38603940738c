//! Statement execution seam.
//!
//! The sink never talks to a database itself. It hands every
//! [`InsertPlan`] to an [`Executor`], which wraps either a blocking or an
//! async implementation supplied by the embedding application.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BoxError, SinkError};
use crate::insert::{InsertPlan, ParamValue};

/// Runs plans synchronously. Called on tokio's blocking pool.
pub trait BlockingExecutor: Send + Sync + 'static {
    /// Execute one plan.
    fn execute(&self, plan: &InsertPlan) -> Result<(), BoxError>;
}

impl<F> BlockingExecutor for F
where
    F: Fn(&InsertPlan) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn execute(&self, plan: &InsertPlan) -> Result<(), BoxError> {
        self(plan)
    }
}

/// Runs plans asynchronously on the sink's worker task.
#[async_trait]
pub trait AsyncExecutor: Send + Sync + 'static {
    /// Execute one plan.
    async fn execute(&self, plan: &InsertPlan) -> Result<(), BoxError>;
}

/// Either calling convention, behind one handle.
#[derive(Clone)]
pub enum Executor {
    /// Synchronous implementation.
    Blocking(Arc<dyn BlockingExecutor>),
    /// Asynchronous implementation.
    Async(Arc<dyn AsyncExecutor>),
}

impl Executor {
    /// Wrap a blocking executor.
    pub fn blocking(executor: impl BlockingExecutor) -> Self {
        Executor::Blocking(Arc::new(executor))
    }

    /// Wrap an async executor.
    pub fn asynchronous(executor: impl AsyncExecutor) -> Self {
        Executor::Async(Arc::new(executor))
    }

    /// Execute a plan, waiting for completion.
    ///
    /// # Errors
    /// Returns [`SinkError::Execution`] when the executor fails, or
    /// [`SinkError::Runtime`] when the blocking task panics.
    pub async fn run(&self, plan: InsertPlan) -> Result<(), SinkError> {
        match self {
            Executor::Blocking(executor) => {
                let executor = Arc::clone(executor);
                tokio::task::spawn_blocking(move || executor.execute(&plan))
                    .await
                    .map_err(|e| SinkError::Runtime(format!("executor task failed: {e}")))?
                    .map_err(SinkError::Execution)
            }
            Executor::Async(executor) => executor.execute(&plan).await.map_err(SinkError::Execution),
        }
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::Blocking(_) => f.write_str("Executor::Blocking"),
            Executor::Async(_) => f.write_str("Executor::Async"),
        }
    }
}

/// Logs each plan through `tracing` and writes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementLogger {
    /// Also log every bound parameter.
    pub show_params: bool,
}

impl BlockingExecutor for StatementLogger {
    fn execute(&self, plan: &InsertPlan) -> Result<(), BoxError> {
        tracing::info!(
            mode = %plan.mode,
            rows = plan.row_count,
            params = plan.params.len(),
            "insert statement:\n{}",
            plan.sql
        );
        if self.show_params {
            for (name, value) in plan.params.iter() {
                match value {
                    ParamValue::Scalar(v) => tracing::info!("  {name} = {v}"),
                    ParamValue::Array(values) => {
                        let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                        tracing::info!("  {name} = [{}]", rendered.join(", "));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insert::{BindMode, Parameters};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn plan() -> InsertPlan {
        InsertPlan {
            sql: "INSERT ALL \nSELECT * FROM dual\n".to_string(),
            params: Parameters::default(),
            mode: BindMode::MultiRow,
            row_count: 1,
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl AsyncExecutor for Counting {
        async fn execute(&self, _plan: &InsertPlan) -> Result<(), BoxError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_blocking_closure_executor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let executor = Executor::blocking(move |plan: &InsertPlan| -> Result<(), BoxError> {
            assert_eq!(plan.row_count, 1);
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        executor.run(plan()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_executor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = Executor::asynchronous(Counting(Arc::clone(&calls)));
        executor.run(plan()).await.unwrap();
        executor.run(plan()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_maps_to_execution_error() {
        let executor = Executor::blocking(|_: &InsertPlan| -> Result<(), BoxError> {
            Err("ORA-00942: table or view does not exist".into())
        });
        let err = executor.run(plan()).await.unwrap_err();
        assert!(matches!(err, SinkError::Execution(_)));
        assert!(err.to_string().contains("ORA-00942"));
    }

    #[tokio::test]
    async fn test_blocking_panic_is_runtime_error() {
        let executor = Executor::blocking(|_: &InsertPlan| -> Result<(), BoxError> {
            panic!("driver crashed");
        });
        assert!(matches!(
            executor.run(plan()).await,
            Err(SinkError::Runtime(_))
        ));
    }

    #[tokio::test]
    async fn test_statement_logger_succeeds() {
        let executor = Executor::blocking(StatementLogger { show_params: true });
        executor.run(plan()).await.unwrap();
    }
}
