//! Delay schedule for response-pipe reconnects
//!
//! Each failed read on the response pipe waits [`ExponentialBackoff::next_delay`]
//! before reconnecting. A successful response calls
//! [`ExponentialBackoff::reset`], so one slow stretch does not penalise the
//! rest of the session.

use std::time::Duration;

use crate::config::BackoffConfig;

/// Growing, capped, optionally jittered reconnect delay
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial: Duration,
    current: Duration,
    max: Duration,
    multiplier: f64,
    /// Fraction of the delay added at random, in `0.0..=1.0`
    jitter: f64,
}

impl ExponentialBackoff {
    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(config.initial, config.max, config.multiplier, config.jitter)
    }

    /// Build a schedule starting at `initial` and never exceeding `max`
    ///
    /// A multiplier below 1.0 is raised to 1.0. A jitter outside `0.0..=1.0`
    /// is clamped. Non-finite factors fall back to a flat, jitter-free delay.
    pub fn new(initial: Duration, max: Duration, multiplier: f64, jitter: f64) -> Self {
        let multiplier = if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            1.0
        };
        let jitter = if jitter.is_finite() {
            jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            initial,
            current: initial.min(max),
            max,
            multiplier,
            jitter,
        }
    }

    /// Delay before the next reconnect attempt
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;

        let grown = Duration::try_from_secs_f64(delay.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max);
        self.current = grown.min(self.max);

        let extra = delay.as_secs_f64() * self.jitter * rand::random::<f64>();
        delay.saturating_add(Duration::try_from_secs_f64(extra).unwrap_or_default())
    }

    /// Go back to the initial delay once a response has arrived
    pub fn reset(&mut self) {
        self.current = self.initial.min(self.max);
    }
}
