//! Scheduling handles owned by the session engine.
//!
//! The engine runs on a single cooperative timeline: it does not spawn
//! timers of its own. Instead it records what it wants scheduled and the
//! driver asks [`SessionEngine::next_wakeup`](super::SessionEngine::next_wakeup)
//! how long it may sleep before the next `tick()`.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Default period of the repeating tick.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Grace delay between a completion and its auto-started successor.
pub const AUTO_START_DELAY: Duration = Duration::from_millis(1000);

/// Handle for the repeating tick process.
///
/// Each `arm` opens a new generation; `cancel` is idempotent.
#[derive(Debug, Clone)]
pub struct TickTask {
    period: Duration,
    generation: u64,
    active: bool,
}

impl TickTask {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            active: false,
        }
    }

    /// Start (or restart) the repeating tick. Returns the new generation.
    pub fn arm(&mut self) -> u64 {
        self.generation += 1;
        self.active = true;
        self.generation
    }

    pub fn cancel(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for TickTask {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

/// A scheduled auto-start that has not fired yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStart {
    pub due: DateTime<Utc>,
    /// Cancellation token; a continuation only fires if its token is still
    /// the one held by the engine.
    pub token: u64,
}

impl PendingStart {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.due
    }

    /// Time left until the continuation fires.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.due - now).to_std().unwrap_or(Duration::ZERO)
    }
}
