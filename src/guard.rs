//! Burst guard.
//!
//! Counts attempts that land within `window` of the previous allowed attempt.
//! Once more than `threshold` attempts form one burst the guard trips and
//! suppresses everything until `cooldown` has elapsed.

use tokio::time::Instant;

use crate::config::GuardConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    Allowed,
    /// This attempt tripped the guard; report it once.
    Tripped,
    /// The guard is cooling down.
    Suppressed,
}

#[derive(Debug, Clone)]
pub struct BurstGuard {
    config: GuardConfig,
    last_allowed: Option<Instant>,
    burst: u32,
    cooling_until: Option<Instant>,
}

impl BurstGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            last_allowed: None,
            burst: 0,
            cooling_until: None,
        }
    }

    pub fn check(&mut self, now: Instant) -> GuardVerdict {
        if let Some(until) = self.cooling_until {
            if now < until {
                return GuardVerdict::Suppressed;
            }
            self.end_cooldown();
        }

        let within_window = self
            .last_allowed
            .is_some_and(|last| now.saturating_duration_since(last) < self.config.window());
        if within_window {
            self.burst += 1;
            if self.burst > self.config.threshold {
                self.cooling_until = Some(now + self.config.cooldown());
                return GuardVerdict::Tripped;
            }
        } else {
            self.burst = 1;
        }

        self.last_allowed = Some(now);
        GuardVerdict::Allowed
    }

    /// When the current cooldown ends, if one is running.
    pub fn cooldown_deadline(&self) -> Option<Instant> {
        self.cooling_until
    }

    /// Clear the cooldown and the burst count.
    pub fn end_cooldown(&mut self) {
        self.cooling_until = None;
        self.burst = 0;
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }
}
