//! Event queue shared by producers and the flush worker.
//!
//! Producers only ever hold the lock long enough to push one event; the
//! worker holds it long enough to split off a batch. Flushing happens
//! outside the lock, so an in-flight flush never blocks `push`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use strum_macros::{AsRefStr, Display};
use tokio::sync::Notify;

use crate::error::SinkError;
use crate::event::LogEvent;

use super::diagnostics::{Diagnostic, Diagnostics, DropReason};
use super::metrics::SinkMetrics;

/// Scheduler lifecycle.
///
/// `Idle → Accumulating → Flushing → Idle` while running;
/// `Draining → Terminated` once shutdown is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum SchedulerState {
    /// Nothing queued.
    Idle,
    /// Events queued, waiting for a trigger.
    Accumulating,
    /// A batch is being written.
    Flushing,
    /// Shutdown requested, remaining events being written.
    Draining,
    /// Worker finished.
    Terminated,
}

struct Inner {
    events: VecDeque<LogEvent>,
    state: SchedulerState,
    closed: bool,
}

/// Queue plus the signals the worker waits on.
pub(crate) struct EventQueue {
    inner: Mutex<Inner>,
    queue_limit: Option<usize>,
    size_trigger: Option<usize>,
    flush_requested: AtomicBool,
    wake: Notify,
    pub(crate) metrics: SinkMetrics,
    diagnostics: Arc<dyn Diagnostics>,
}

impl EventQueue {
    pub(crate) fn new(
        queue_limit: Option<usize>,
        size_trigger: Option<usize>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: VecDeque::new(),
                state: SchedulerState::Idle,
                closed: false,
            }),
            queue_limit,
            size_trigger,
            flush_requested: AtomicBool::new(false),
            wake: Notify::new(),
            metrics: SinkMetrics::new(),
            diagnostics,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue without blocking; drops the event when full or closed.
    pub(crate) fn push(&self, event: LogEvent) -> Result<(), SinkError> {
        let mut inner = self.lock();
        let queued = inner.events.len();

        if inner.closed {
            drop(inner);
            self.dropped(DropReason::Closed, queued);
            return Err(SinkError::Closed);
        }
        if let Some(limit) = self.queue_limit
            && queued >= limit
        {
            drop(inner);
            self.dropped(DropReason::QueueFull, queued);
            return Err(SinkError::QueueFull { limit });
        }

        inner.events.push_back(event);
        if inner.state == SchedulerState::Idle {
            inner.state = SchedulerState::Accumulating;
        }
        drop(inner);

        self.metrics.event_received();
        if self.size_trigger.is_some_and(|n| queued + 1 >= n) {
            self.wake.notify_one();
        }
        Ok(())
    }

    fn dropped(&self, reason: DropReason, queued: usize) {
        self.metrics.event_dropped();
        self.diagnostics
            .report(Diagnostic::EventDropped { reason, queued });
    }

    /// Split off up to `max` of the oldest events (all when `None`).
    ///
    /// A non-empty take moves a running scheduler to `Flushing`.
    pub(crate) fn take(&self, max: Option<usize>) -> Vec<LogEvent> {
        let mut inner = self.lock();
        let n = max.map_or(inner.events.len(), |m| m.min(inner.events.len()));
        if n == 0 {
            return Vec::new();
        }
        let batch: Vec<LogEvent> = inner.events.drain(..n).collect();
        if matches!(
            inner.state,
            SchedulerState::Idle | SchedulerState::Accumulating
        ) {
            inner.state = SchedulerState::Flushing;
        }
        batch
    }

    /// Leave `Flushing` once a batch is done.
    pub(crate) fn flush_finished(&self) {
        let mut inner = self.lock();
        if inner.state == SchedulerState::Flushing {
            inner.state = if inner.events.is_empty() {
                SchedulerState::Idle
            } else {
                SchedulerState::Accumulating
            };
        }
    }

    pub(crate) fn set_state(&self, state: SchedulerState) {
        self.lock().state = state;
    }

    pub(crate) fn state(&self) -> SchedulerState {
        self.lock().state
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Stop accepting events and wake the worker so it can drain.
    pub(crate) fn close(&self) {
        self.lock().closed = true;
        self.wake.notify_one();
    }

    pub(crate) fn request_flush(&self) {
        self.flush_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    pub(crate) fn take_flush_request(&self) -> bool {
        self.flush_requested.swap(false, Ordering::AcqRel)
    }

    pub(crate) async fn woken(&self) {
        self.wake.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Level;
    use crate::sink::CollectingDiagnostics;

    fn queue(limit: Option<usize>) -> (EventQueue, Arc<CollectingDiagnostics>) {
        let diagnostics = Arc::new(CollectingDiagnostics::new());
        (EventQueue::new(limit, Some(2), diagnostics.clone()), diagnostics)
    }

    fn event(n: i64) -> LogEvent {
        LogEvent::new(Level::Information, "n={N}").with_property("N", n)
    }

    #[test]
    fn test_push_moves_to_accumulating() {
        let (queue, _) = queue(None);
        assert_eq!(queue.state(), SchedulerState::Idle);
        queue.push(event(1)).unwrap();
        assert_eq!(queue.state(), SchedulerState::Accumulating);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_take_is_oldest_first_and_bounded() {
        let (queue, _) = queue(None);
        for n in 0..5 {
            queue.push(event(n)).unwrap();
        }
        let batch = queue.take(Some(3));
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].properties.get("N"), Some(&0.into()));
        assert_eq!(batch[2].properties.get("N"), Some(&2.into()));
        assert_eq!(queue.state(), SchedulerState::Flushing);

        queue.flush_finished();
        assert_eq!(queue.state(), SchedulerState::Accumulating);
        assert_eq!(queue.take(None).len(), 2);
        queue.flush_finished();
        assert_eq!(queue.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_take_empty_keeps_state() {
        let (queue, _) = queue(None);
        assert!(queue.take(Some(10)).is_empty());
        assert_eq!(queue.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_events_pushed_during_flush_wait_for_next_batch() {
        let (queue, _) = queue(None);
        queue.push(event(1)).unwrap();
        let batch = queue.take(None);
        queue.push(event(2)).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(queue.state(), SchedulerState::Flushing);
        queue.flush_finished();
        assert_eq!(queue.state(), SchedulerState::Accumulating);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_queue_limit_drops_and_reports() {
        let (queue, diagnostics) = queue(Some(1));
        queue.push(event(1)).unwrap();
        let err = queue.push(event(2)).unwrap_err();
        assert!(matches!(err, SinkError::QueueFull { limit: 1 }));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.metrics.snapshot().events_dropped, 1);
        assert_eq!(
            diagnostics.snapshot(),
            vec![Diagnostic::EventDropped {
                reason: DropReason::QueueFull,
                queued: 1
            }]
        );
    }

    #[test]
    fn test_zero_limit_drops_everything() {
        let (queue, diagnostics) = queue(Some(0));
        assert!(queue.push(event(1)).is_err());
        assert_eq!(queue.len(), 0);
        assert_eq!(diagnostics.snapshot().len(), 1);
    }

    #[test]
    fn test_closed_queue_rejects() {
        let (queue, diagnostics) = queue(None);
        queue.close();
        assert!(matches!(queue.push(event(1)), Err(SinkError::Closed)));
        assert!(queue.is_closed());
        assert_eq!(
            diagnostics.count(|d| matches!(
                d,
                Diagnostic::EventDropped {
                    reason: DropReason::Closed,
                    ..
                }
            )),
            1
        );
    }

    #[test]
    fn test_flush_request_is_consumed_once() {
        let (queue, _) = queue(None);
        queue.request_flush();
        assert!(queue.take_flush_request());
        assert!(!queue.take_flush_request());
    }
}
