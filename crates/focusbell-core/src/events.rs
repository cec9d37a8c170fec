use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::SessionKind;

/// Every state change of the session engine produces an Event.
/// The driver prints or renders them; no-op requests produce none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        kind: SessionKind,
        duration_secs: u64,
        /// Started by an auto-start continuation rather than the user.
        auto: bool,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        finished: SessionKind,
        next: SessionKind,
        completed_work: u32,
        auto_start: bool,
        at: DateTime<Utc>,
    },
    SessionStopped {
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
}

/// Read-only view of the engine for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub kind: SessionKind,
    pub running: bool,
    pub paused: bool,
    pub remaining_secs: u64,
    pub remaining_ms: u64,
    pub completed_work: u32,
}
