//! Settings the core reads at decision time.
//!
//! The engine and the sound player never cache settings: they call
//! [`SettingsProvider::settings`] at the moment each decision is made, so a
//! change made while a session is running applies to the next decision.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::timer::SessionKind;

pub const MIN_DURATION_MINUTES: u32 = 1;
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;
pub const MIN_LONG_BREAK_FREQUENCY: u32 = 1;
pub const MAX_VOLUME: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub long_break_minutes: u32,
    /// Every n-th completed work session is followed by a long break.
    pub long_break_frequency: u32,
    pub auto_start_work: bool,
    pub auto_start_break: bool,
    pub sound_enabled: bool,
    /// 0..=100
    pub sound_volume: u8,
    pub sound_profile: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
            long_break_minutes: 15,
            long_break_frequency: 4,
            auto_start_work: false,
            auto_start_break: false,
            sound_enabled: true,
            sound_volume: 50,
            sound_profile: "bell".into(),
        }
    }
}

impl Settings {
    /// Clamp out-of-range values instead of letting them reach the engine.
    ///
    /// Durations land in `1..=1440` minutes, the long break frequency is at
    /// least 1 (it is used as a modulus) and volume is capped at 100.
    pub fn sanitized(mut self) -> Self {
        let clamp = |m: u32| m.clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES);
        self.work_minutes = clamp(self.work_minutes);
        self.break_minutes = clamp(self.break_minutes);
        self.long_break_minutes = clamp(self.long_break_minutes);
        self.long_break_frequency = self.long_break_frequency.max(MIN_LONG_BREAK_FREQUENCY);
        self.sound_volume = self.sound_volume.min(MAX_VOLUME);
        self
    }

    pub fn minutes_for(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Work => self.work_minutes,
            SessionKind::Break => self.break_minutes,
            SessionKind::LongBreak => self.long_break_minutes,
        }
    }

    /// Duration of a fresh session of `kind`, in milliseconds.
    pub fn duration_ms(&self, kind: SessionKind) -> u64 {
        u64::from(self.minutes_for(kind)).saturating_mul(60_000)
    }

    /// Whether the session entered after `finished` should start on its own.
    pub fn auto_start_after(&self, finished: SessionKind) -> bool {
        match finished {
            SessionKind::Work => self.auto_start_break,
            SessionKind::Break | SessionKind::LongBreak => self.auto_start_work,
        }
    }
}

/// Read access to the current settings.
///
/// Implementations must return sanitized values.
pub trait SettingsProvider: Send + Sync {
    fn settings(&self) -> Settings;
}

impl SettingsProvider for Settings {
    fn settings(&self) -> Settings {
        self.clone().sanitized()
    }
}

/// Settings that can be swapped while the engine runs.
#[derive(Debug, Default)]
pub struct SharedSettings {
    inner: RwLock<Settings>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub fn replace(&self, settings: Settings) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = settings;
    }

    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }
}

impl SettingsProvider for SharedSettings {
    fn settings(&self) -> Settings {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .sanitized()
    }
}
