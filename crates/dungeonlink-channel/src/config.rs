//! Reconnect policy configuration.

use std::time::Duration;

use tracing::warn;

/// Configuration for the channel's bounded reconnect loop.
///
/// Backoff between attempts is exponential: attempt `n` waits
/// `initial_backoff * backoff_multiplier^(n-1)`, capped at
/// `max_backoff`. The adapter adds a small random jitter on top so
/// clients that lost the same server don't all retry in lockstep.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// How many reconnect attempts to make before giving up.
    /// 0 means a lost link is immediately fatal.
    pub max_reconnect_attempts: u32,
    /// Delay before the first reconnect attempt.
    pub initial_backoff: Duration,
    /// Ceiling on the delay between attempts.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(15),
            backoff_multiplier: 2.0,
        }
    }
}

impl ChannelConfig {
    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by
    /// [`ChannelAdapter::new`](crate::ChannelAdapter::new). Rules:
    /// - `backoff_multiplier` forced ≥ 1.0 (a shrinking backoff retries
    ///   faster and faster against a server that is already down).
    /// - `max_backoff` forced ≥ `initial_backoff`.
    pub fn validated(mut self) -> Self {
        if self.backoff_multiplier < 1.0 {
            warn!(
                multiplier = self.backoff_multiplier,
                "backoff_multiplier below 1.0, clamping"
            );
            self.backoff_multiplier = 1.0;
        }
        if self.max_backoff < self.initial_backoff {
            warn!(
                max_ms = self.max_backoff.as_millis() as u64,
                initial_ms = self.initial_backoff.as_millis() as u64,
                "max_backoff below initial_backoff, raising it"
            );
            self.max_backoff = self.initial_backoff;
        }
        self
    }

    /// Base delay before reconnect attempt `attempt` (1-based), without
    /// jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let secs = self.initial_backoff.as_secs_f64()
            * self.backoff_multiplier.powi(exp as i32);
        Duration::from_secs_f64(secs).min(self.max_backoff)
    }
}
