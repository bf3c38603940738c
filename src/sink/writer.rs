//! Producer-side facade.

use std::sync::Arc;

use crate::error::SinkError;
use crate::event::LogEvent;

use super::queue::{EventQueue, SchedulerState};

/// Non-blocking event writer.
///
/// Cheap to clone; every clone feeds the same queue. `emit` never waits on
/// a flush: when the queue is at its limit the event is dropped, counted and
/// reported to diagnostics.
#[derive(Clone)]
pub struct LogWriter {
    queue: Arc<EventQueue>,
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter").finish_non_exhaustive()
    }
}

impl LogWriter {
    pub(crate) fn new(queue: Arc<EventQueue>) -> Self {
        Self { queue }
    }

    /// Queue an event for the next flush.
    ///
    /// # Errors
    /// Returns [`SinkError::QueueFull`] or [`SinkError::Closed`] when the
    /// event was dropped. Callers are free to ignore it.
    pub fn emit(&self, event: LogEvent) -> Result<(), SinkError> {
        self.queue.push(event)
    }

    /// Ask the worker to flush everything queued now.
    pub fn request_flush(&self) {
        self.queue.request_flush();
    }

    /// Events waiting for a flush.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Total events dropped so far.
    pub fn dropped(&self) -> u64 {
        self.queue.metrics.snapshot().events_dropped
    }

    /// Current scheduler state.
    pub fn state(&self) -> SchedulerState {
        self.queue.state()
    }
}
