//! Reconnect backoff
//!
//! Tracks consecutive failed connection attempts and yields the delay before
//! the next one. The counter resets when a connection opens.

use crate::config::{ReconnectConfig, ReconnectPolicy};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Consecutive failures recorded since the last successful open
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failure and return the delay before the next attempt, or
    /// `None` once the policy says to stop
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts
            && self.config.policy == ReconnectPolicy::StopAfterMax
        {
            return None;
        }

        self.attempt = self.attempt.saturating_add(1);
        Some(self.config.delay_for_attempt(self.attempt))
    }

    /// Forget past failures after a successful open
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Whether the policy has stopped scheduling attempts
    pub fn is_exhausted(&self) -> bool {
        self.config.policy == ReconnectPolicy::StopAfterMax
            && self.attempt >= self.config.max_attempts
    }
}
