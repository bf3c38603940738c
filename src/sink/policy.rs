//! Flush triggering policies.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

use crate::config::ConfigError;

// =============================================================================
// Constants
// =============================================================================

/// Burst strategy: flush once this many events are queued.
pub const DEFAULT_BURST_BATCH_LIMIT: usize = 100;

/// Burst strategy: flush this long after the previous flush.
pub const DEFAULT_BURST_INTERVAL: Duration = Duration::from_secs(5);

/// Periodic strategy: maximum events per flush.
pub const DEFAULT_PERIODIC_BATCH_LIMIT: usize = 50;

/// Periodic strategy: flush period.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

fn default_burst_batch_limit() -> Option<usize> {
    Some(DEFAULT_BURST_BATCH_LIMIT)
}

fn default_burst_interval() -> Option<Duration> {
    Some(DEFAULT_BURST_INTERVAL)
}

fn default_periodic_batch_limit() -> usize {
    DEFAULT_PERIODIC_BATCH_LIMIT
}

fn default_period() -> Duration {
    DEFAULT_PERIOD
}

// =============================================================================
// Policy
// =============================================================================

/// When the scheduler flushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Flush when the queue reaches `batch_limit` or `interval` has passed
    /// since the last flush, whichever comes first. `null` disables a trigger.
    Burst {
        /// Size trigger and slice size (default: 100).
        #[serde(default = "default_burst_batch_limit")]
        batch_limit: Option<usize>,
        /// Timer trigger (default: 5s).
        #[serde(default = "default_burst_interval", with = "humantime_serde")]
        interval: Option<Duration>,
    },
    /// Flush at most `batch_limit` of the oldest events every `period`.
    Periodic {
        /// Maximum events per flush (default: 50).
        #[serde(default = "default_periodic_batch_limit")]
        batch_limit: usize,
        /// Flush period (default: 5s).
        #[serde(default = "default_period", with = "humantime_serde")]
        period: Duration,
    },
}

impl Default for FlushPolicy {
    fn default() -> Self {
        FlushPolicy::Burst {
            batch_limit: default_burst_batch_limit(),
            interval: default_burst_interval(),
        }
    }
}

impl FlushPolicy {
    /// Burst policy.
    pub fn burst(batch_limit: Option<usize>, interval: Option<Duration>) -> Self {
        FlushPolicy::Burst {
            batch_limit,
            interval,
        }
    }

    /// Periodic policy.
    pub fn periodic(batch_limit: usize, period: Duration) -> Self {
        FlushPolicy::Periodic {
            batch_limit,
            period,
        }
    }

    /// Strategy name.
    pub fn strategy(&self) -> Strategy {
        match self {
            FlushPolicy::Burst { .. } => Strategy::Burst,
            FlushPolicy::Periodic { .. } => Strategy::Periodic,
        }
    }

    /// Most events taken per flush; `None` takes the whole queue.
    pub fn batch_limit(&self) -> Option<usize> {
        match self {
            FlushPolicy::Burst { batch_limit, .. } => *batch_limit,
            FlushPolicy::Periodic { batch_limit, .. } => Some(*batch_limit),
        }
    }

    /// Queue length that triggers an immediate flush.
    pub fn size_trigger(&self) -> Option<usize> {
        match self {
            FlushPolicy::Burst { batch_limit, .. } => *batch_limit,
            FlushPolicy::Periodic { .. } => None,
        }
    }

    /// Timer period.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            FlushPolicy::Burst { interval, .. } => *interval,
            FlushPolicy::Periodic { period, .. } => Some(*period),
        }
    }

    /// Replace the timer period, keeping the strategy.
    pub fn with_interval(self, every: Duration) -> Self {
        match self {
            FlushPolicy::Burst { batch_limit, .. } => FlushPolicy::burst(batch_limit, Some(every)),
            FlushPolicy::Periodic { batch_limit, .. } => FlushPolicy::periodic(batch_limit, every),
        }
    }

    /// Validate limits and triggers.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` for zero limits or periods, and
    /// for a burst policy with both triggers disabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_limit() == Some(0) {
            return Err(ConfigError::ValidationError(
                "batching batch_limit must be positive".to_string(),
            ));
        }
        if self.interval().is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ValidationError(
                "batching interval must be positive".to_string(),
            ));
        }
        if let FlushPolicy::Burst {
            batch_limit: None,
            interval: None,
        } = self
        {
            return Err(ConfigError::ValidationError(
                "burst batching needs a batch_limit, an interval, or both".to_string(),
            ));
        }
        Ok(())
    }
}

/// Strategy discriminant, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Strategy {
    Burst,
    Periodic,
}
