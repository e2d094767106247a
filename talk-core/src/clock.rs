//! Countdown clock for the timed phase.
//!
//! Driven externally: the host calls `tick()` once per wall-clock second.
//! The clock never reads time itself, which keeps sessions deterministic
//! and replayable.

use serde::{Deserialize, Serialize};

/// Outcome of a single `tick()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTick {
    /// Seconds left after this tick
    pub remaining: u32,
    /// True only on the tick that moved remaining from 1 to 0
    pub expired: bool,
}

/// Seconds-resolution countdown that fires `expired` exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownClock {
    duration: u32,
    remaining: u32,
    running: bool,
    cancelled: bool,
    expired: bool,
}

impl CountdownClock {
    /// Create a clock already counting down from `duration_secs`.
    pub fn started(duration_secs: u32) -> Self {
        let mut clock = Self::default();
        clock.start(duration_secs);
        clock
    }

    /// (Re)start counting down from `duration_secs`.
    pub fn start(&mut self, duration_secs: u32) {
        self.duration = duration_secs;
        self.remaining = duration_secs;
        self.running = duration_secs > 0;
        self.cancelled = false;
        self.expired = false;
    }

    /// Advance one second.
    ///
    /// A no-op after expiry or cancellation: it reports the current value
    /// with `expired == false`, so a late tick can never fire twice.
    pub fn tick(&mut self) -> ClockTick {
        if !self.running {
            return ClockTick {
                remaining: self.remaining,
                expired: false,
            };
        }

        self.remaining = self.remaining.saturating_sub(1);
        let expired = self.remaining == 0;
        if expired {
            self.running = false;
            self.expired = true;
        }

        ClockTick {
            remaining: self.remaining,
            expired,
        }
    }

    /// Stop future ticks from having any effect. Idempotent.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.running = false;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Seconds counted down so far.
    pub fn elapsed(&self) -> u32 {
        self.duration.saturating_sub(self.remaining)
    }

    /// Share of the duration still left, in `0.0..=1.0`.
    pub fn fraction_remaining(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        f64::from(self.remaining) / f64::from(self.duration)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn has_expired(&self) -> bool {
        self.expired
    }

    /// Internal consistency of a clock loaded from outside.
    pub fn is_consistent(&self) -> bool {
        self.remaining <= self.duration && !(self.running && self.expired)
    }
}
