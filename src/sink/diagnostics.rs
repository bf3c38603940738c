//! Out-of-band reporting of dropped events and failed flushes.

use std::sync::{Mutex, PoisonError};

use strum_macros::{AsRefStr, Display};

/// Why an event never reached the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum DropReason {
    /// Queue was at its limit.
    QueueFull,
    /// Sink was shutting down.
    Closed,
}

/// Something the sink wants the outside world to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// An event was discarded on enqueue.
    EventDropped {
        /// Why it was dropped.
        reason: DropReason,
        /// Queue length at the time.
        queued: usize,
    },
    /// A flush failed; its batch is gone.
    FlushFailed {
        /// Rows in the discarded statement; events rejected before it are
        /// reported separately as `RowRejected`.
        events: usize,
        /// Failure description.
        error: String,
    },
    /// One event could not be turned into a row and was skipped.
    RowRejected {
        /// Position of the event in its batch.
        position: usize,
        /// Failure description.
        error: String,
    },
    /// The final drain on shutdown finished.
    ShutdownFlushed {
        /// Events drained.
        events: usize,
        /// Flush rounds needed.
        rounds: usize,
    },
}

/// Write-only diagnostics channel.
///
/// Implementations are called on both the producer path and the flush
/// worker, so they must be quick and must not panic.
pub trait Diagnostics: Send + Sync + 'static {
    /// Record one diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::EventDropped { reason, queued } => {
                tracing::warn!(reason = %reason, queued, "Dropping log event");
            }
            Diagnostic::FlushFailed { events, error } => {
                tracing::error!(events, error = %error, "Failed to flush batch, events discarded");
            }
            Diagnostic::RowRejected { position, error } => {
                tracing::warn!(position, error = %error, "Skipping event that cannot be stored");
            }
            Diagnostic::ShutdownFlushed { events, rounds } => {
                tracing::info!(events, rounds, "Final flush complete");
            }
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    items: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything reported so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of reports matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Diagnostic) -> bool) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| predicate(d))
            .count()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_diagnostics() {
        let diagnostics = CollectingDiagnostics::new();
        diagnostics.report(Diagnostic::EventDropped {
            reason: DropReason::QueueFull,
            queued: 0,
        });
        diagnostics.report(Diagnostic::FlushFailed {
            events: 2,
            error: "boom".to_string(),
        });
        assert_eq!(diagnostics.snapshot().len(), 2);
        assert_eq!(
            diagnostics.count(|d| matches!(d, Diagnostic::EventDropped { .. })),
            1
        );
    }

    #[test]
    fn test_drop_reason_display() {
        assert_eq!(DropReason::QueueFull.to_string(), "queue_full");
        assert_eq!(DropReason::Closed.as_ref(), "closed");
    }

    #[test]
    fn test_tracing_diagnostics_does_not_panic() {
        TracingDiagnostics.report(Diagnostic::ShutdownFlushed {
            events: 0,
            rounds: 0,
        });
    }
}
