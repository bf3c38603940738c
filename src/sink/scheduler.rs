//! Flush worker.
//!
//! One tokio task per sink owns the flush side of the [`EventQueue`]. It
//! waits for whichever comes first: a wake-up from the producer side (size
//! trigger, flush request, shutdown) or the policy timer. Flushes run one at
//! a time inside the loop, so they are serialized by construction.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::diagnostics::{Diagnostic, Diagnostics};
use super::metrics::MetricsSnapshot;
use super::pipeline::FlushPipeline;
use super::policy::FlushPolicy;
use super::queue::{EventQueue, SchedulerState};

pub(crate) struct Worker {
    queue: Arc<EventQueue>,
    pipeline: FlushPipeline,
    policy: FlushPolicy,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Worker {
    pub(crate) fn new(
        queue: Arc<EventQueue>,
        pipeline: FlushPipeline,
        policy: FlushPolicy,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            queue,
            pipeline,
            policy,
            diagnostics,
        }
    }

    /// Run until the queue is closed, then drain and return final metrics.
    pub(crate) async fn run(self) -> MetricsSnapshot {
        let mut timer = self.policy.interval().map(new_timer);
        let is_burst = matches!(self.policy, FlushPolicy::Burst { .. });

        loop {
            let flushed = tokio::select! {
                () = self.queue.woken() => {
                    if self.queue.is_closed() {
                        break;
                    }
                    if self.queue.take_flush_request() {
                        self.flush_all().await
                    } else {
                        self.flush_full_batches().await
                    }
                }
                () = tick(&mut timer) => {
                    if is_burst {
                        self.flush_all().await
                    } else {
                        self.flush_once(self.policy.batch_limit()).await
                    }
                }
            };

            // Burst timer counts from the last flush, whatever triggered it.
            if flushed > 0
                && is_burst
                && let Some(timer) = timer.as_mut()
            {
                timer.reset();
            }
        }

        self.drain().await
    }

    /// Flush one slice. Returns the number of events taken.
    async fn flush_once(&self, max: Option<usize>) -> usize {
        let batch = self.queue.take(max);
        if batch.is_empty() {
            return 0;
        }
        let taken = batch.len();
        self.pipeline.flush(batch, &self.queue.metrics).await;
        self.queue.flush_finished();
        taken
    }

    /// Flush everything currently queued, slice by slice.
    async fn flush_all(&self) -> usize {
        let mut total = 0;
        loop {
            let taken = self.flush_once(self.policy.batch_limit()).await;
            if taken == 0 || self.queue.is_closed() {
                return total + taken;
            }
            total += taken;
        }
    }

    /// Flush while at least one full batch is queued.
    async fn flush_full_batches(&self) -> usize {
        let Some(limit) = self.policy.size_trigger() else {
            return 0;
        };
        let mut total = 0;
        while self.queue.len() >= limit && !self.queue.is_closed() {
            total += self.flush_once(Some(limit)).await;
        }
        total
    }

    async fn drain(&self) -> MetricsSnapshot {
        self.queue.set_state(SchedulerState::Draining);
        let mut events = 0;
        let mut rounds = 0;
        loop {
            let batch = self.queue.take(self.policy.batch_limit());
            if batch.is_empty() {
                break;
            }
            events += batch.len();
            rounds += 1;
            self.pipeline.flush(batch, &self.queue.metrics).await;
        }
        self.queue.set_state(SchedulerState::Terminated);

        self.diagnostics
            .report(Diagnostic::ShutdownFlushed { events, rounds });
        let snapshot = self.queue.metrics.snapshot();
        tracing::info!(
            received = snapshot.events_received,
            dropped = snapshot.events_dropped,
            rows_written = snapshot.rows_written,
            flush_failures = snapshot.flush_failures,
            "Log sink stopped"
        );
        snapshot
    }
}

fn new_timer(period: Duration) -> Interval {
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
