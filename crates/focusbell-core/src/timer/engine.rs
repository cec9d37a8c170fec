//! Session engine implementation.
//!
//! The session engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically (see [`SessionEngine::next_wakeup`]).
//!
//! Remaining time is always recomputed from the segment's start instant,
//! never decremented per tick, so throttled or irregular ticks cannot drift.
//! Pausing snapshots the remaining time and resuming re-anchors a fresh
//! start instant on it.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running(kind) -> Paused -> Running(kind)
//! Running(kind) --complete--> Running(next) after the grace delay (auto-start)
//!                         \-> Idle(next)                         (manual)
//! any -> Idle(Work) on stop
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new(clock, settings, notifier);
//! engine.start();
//! // In a loop:
//! engine.tick(); // Returns Some(Event) on completion or auto-start
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::kind::SessionKind;
use super::task::{PendingStart, TickTask, AUTO_START_DELAY};
use crate::clock::{elapsed_ms, Clock};
use crate::events::{Event, SessionSnapshot};
use crate::notify::{Notice, Notifier};
use crate::settings::{Settings, SettingsProvider};

/// The engine's mutable record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub kind: SessionKind,
    /// A session is counting down (possibly paused).
    pub running: bool,
    /// Counting is frozen. Implies `running`.
    pub paused: bool,
    pub completed_work: u32,
    /// When the current countdown segment began.
    pub segment_started_at: DateTime<Utc>,
    /// Time owed for the current segment, in milliseconds.
    pub segment_total_ms: u64,
    pub remaining_ms: u64,
    paused_remaining_ms: Option<u64>,
}

impl SessionState {
    fn initial(now: DateTime<Utc>) -> Self {
        Self {
            kind: SessionKind::Work,
            running: false,
            paused: false,
            completed_work: 0,
            segment_started_at: now,
            segment_total_ms: 0,
            remaining_ms: 0,
            paused_remaining_ms: None,
        }
    }
}

/// Core session engine.
///
/// Operates on wall-clock deltas -- no internal thread.
/// Collaborators are injected so tests can drive it with a fake clock.
pub struct SessionEngine {
    clock: Arc<dyn Clock>,
    settings: Arc<dyn SettingsProvider>,
    notifier: Arc<dyn Notifier>,
    state: SessionState,
    ticker: TickTask,
    pending_start: Option<PendingStart>,
    next_token: u64,
    auto_start_delay: Duration,
}

impl SessionEngine {
    /// Create an idle engine on a work session.
    pub fn new(
        clock: Arc<dyn Clock>,
        settings: Arc<dyn SettingsProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let now = clock.now();
        Self {
            clock,
            settings,
            notifier,
            state: SessionState::initial(now),
            ticker: TickTask::default(),
            pending_start: None,
            next_token: 0,
            auto_start_delay: AUTO_START_DELAY,
        }
    }

    pub fn with_tick_interval(mut self, period: Duration) -> Self {
        self.ticker = TickTask::new(period);
        self
    }

    pub fn with_auto_start_delay(mut self, delay: Duration) -> Self {
        self.auto_start_delay = delay;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn kind(&self) -> SessionKind {
        self.state.kind
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn completed_work(&self) -> u32 {
        self.state.completed_work
    }

    pub fn remaining_ms(&self) -> u64 {
        self.state.remaining_ms
    }

    pub fn pending_start(&self) -> Option<PendingStart> {
        self.pending_start
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_active()
    }

    /// Build the display snapshot.
    ///
    /// While idle the remaining time shown is the configured duration of the
    /// session that the next `start()` would run.
    pub fn snapshot(&self) -> SessionSnapshot {
        let remaining_ms = if self.state.running {
            self.state.remaining_ms
        } else {
            self.settings().duration_ms(self.state.kind)
        };
        SessionSnapshot {
            kind: self.state.kind,
            running: self.state.running,
            paused: self.state.paused,
            remaining_secs: remaining_ms.div_ceil(1000),
            remaining_ms,
            completed_work: self.state.completed_work,
        }
    }

    /// How long the driver may wait before the next `tick()` matters.
    ///
    /// `None` means nothing is scheduled: only a user command can change state.
    pub fn next_wakeup(&self) -> Option<Duration> {
        if let Some(pending) = self.pending_start {
            return Some(pending.remaining(self.clock.now()));
        }
        if self.ticker.is_active() {
            return Some(self.ticker.period());
        }
        None
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a fresh countdown for the current kind. No-op while counting.
    ///
    /// During the grace window after a completion the manual start wins:
    /// the pending auto-start is dropped and the next session begins now.
    pub fn start(&mut self) -> Option<Event> {
        if let Some(pending) = self.pending_start {
            debug!(token = pending.token, "manual start supersedes auto-start");
            return Some(self.begin_segment(false));
        }
        if self.state.running {
            return None;
        }
        Some(self.begin_segment(false))
    }

    /// Advance the countdown. Fires a due auto-start continuation, otherwise
    /// recomputes remaining time and completes the session when it hits zero.
    pub fn tick(&mut self) -> Option<Event> {
        let now = self.clock.now();

        if let Some(pending) = self.pending_start {
            if pending.is_due(now) {
                self.pending_start = None;
                debug!(token = pending.token, "auto-start continuation fired");
                return Some(self.begin_segment(true));
            }
        }

        if self.state.paused || !self.ticker.is_active() {
            return None;
        }

        self.flush_elapsed(now);
        if self.state.remaining_ms == 0 {
            return self.complete();
        }
        None
    }

    /// Visibility-recovery hook: the driver regained the foreground after a
    /// throttled period. Catches up immediately.
    pub fn recover_foreground(&mut self) -> Option<Event> {
        debug!("foreground recovered, forcing tick");
        self.tick()
    }

    /// Freeze the countdown. No-op unless a segment is counting.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running || self.state.paused || !self.ticker.is_active() {
            return None;
        }
        let now = self.clock.now();
        self.flush_elapsed(now);
        self.ticker.cancel();
        self.state.paused = true;
        self.state.paused_remaining_ms = Some(self.state.remaining_ms);
        debug!(remaining_ms = self.state.remaining_ms, "session paused");
        Some(Event::SessionPaused {
            remaining_ms: self.state.remaining_ms,
            at: now,
        })
    }

    /// Continue a paused countdown from the frozen remaining time.
    pub fn resume(&mut self) -> Option<Event> {
        if !self.state.paused {
            return None;
        }
        let now = self.clock.now();
        let remaining = self
            .state
            .paused_remaining_ms
            .take()
            .unwrap_or(self.state.remaining_ms);
        self.state.segment_total_ms = remaining;
        self.state.remaining_ms = remaining;
        self.state.segment_started_at = now;
        self.state.paused = false;
        self.ticker.arm();
        debug!(remaining_ms = remaining, "session resumed");
        Some(Event::SessionResumed {
            remaining_ms: remaining,
            at: now,
        })
    }

    /// Return to an idle work session. Keeps the completed work count and
    /// cancels any pending auto-start.
    pub fn stop(&mut self) -> Option<Event> {
        self.ticker.cancel();
        if let Some(pending) = self.pending_start.take() {
            debug!(token = pending.token, "pending auto-start cancelled");
        }
        self.state.running = false;
        self.state.paused = false;
        self.state.paused_remaining_ms = None;
        self.state.remaining_ms = 0;
        self.state.kind = SessionKind::Work;
        Some(Event::SessionStopped {
            at: self.clock.now(),
        })
    }

    /// Stop and forget the completed work count.
    pub fn reset(&mut self) -> Option<Event> {
        self.stop();
        self.state.completed_work = 0;
        Some(Event::SessionReset {
            at: self.clock.now(),
        })
    }

    /// Finish the current segment: pick the next kind, notify, and either
    /// schedule the auto-start or go idle. No-op unless a segment is counting.
    pub fn complete(&mut self) -> Option<Event> {
        if !self.state.running || !self.ticker.is_active() {
            return None;
        }
        self.ticker.cancel();
        self.state.remaining_ms = 0;

        let settings = self.settings();
        let finished = self.state.kind;
        let next = match finished {
            SessionKind::Work => {
                self.state.completed_work += 1;
                SessionKind::after_work(self.state.completed_work, settings.long_break_frequency)
            }
            SessionKind::Break | SessionKind::LongBreak => SessionKind::Work,
        };
        self.state.kind = next;

        info!(
            finished = %finished,
            next = %next,
            completed_work = self.state.completed_work,
            "session completed"
        );
        self.notifier.notify(&Notice::for_transition(finished, next));

        let now = self.clock.now();
        let auto_start = settings.auto_start_after(finished);
        if auto_start {
            self.next_token += 1;
            let delay = chrono::Duration::from_std(self.auto_start_delay)
                .unwrap_or_else(|_| chrono::Duration::seconds(1));
            self.pending_start = Some(PendingStart {
                due: now + delay,
                token: self.next_token,
            });
        } else {
            self.state.running = false;
        }

        Some(Event::SessionCompleted {
            finished,
            next,
            completed_work: self.state.completed_work,
            auto_start,
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn settings(&self) -> Settings {
        self.settings.settings()
    }

    fn begin_segment(&mut self, auto: bool) -> Event {
        let now = self.clock.now();
        let total = self.settings().duration_ms(self.state.kind);
        self.pending_start = None;
        self.state.segment_total_ms = total;
        self.state.remaining_ms = total;
        self.state.segment_started_at = now;
        self.state.paused_remaining_ms = None;
        self.state.running = true;
        self.state.paused = false;
        self.ticker.arm();
        debug!(kind = %self.state.kind, total_ms = total, auto, "session started");
        Event::SessionStarted {
            kind: self.state.kind,
            duration_secs: total / 1000,
            auto,
            at: now,
        }
    }

    /// Recompute remaining time from the segment anchor. Never increases it.
    fn flush_elapsed(&mut self, now: DateTime<Utc>) {
        let elapsed = elapsed_ms(self.state.segment_started_at, now);
        let computed = self.state.segment_total_ms.saturating_sub(elapsed);
        self.state.remaining_ms = computed.min(self.state.remaining_ms);
    }
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("state", &self.state)
            .field("ticker", &self.ticker)
            .field("pending_start", &self.pending_start)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        fn count(&self) -> usize {
            self.notices.lock().unwrap().len()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: &Notice) {
            self.notices.lock().unwrap().push(notice.clone());
        }
    }

    fn engine_with(settings: Settings) -> (SessionEngine, Arc<ManualClock>, Arc<RecordingNotifier>) {
        let clock = Arc::new(ManualClock::starting_now());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = SessionEngine::new(clock.clone(), Arc::new(settings), notifier.clone());
        (engine, clock, notifier)
    }

    #[test]
    fn start_pause_resume() {
        let (mut engine, clock, _) = engine_with(Settings::default());
        assert!(!engine.is_running());

        assert!(engine.start().is_some());
        assert!(engine.is_running());
        assert!(engine.start().is_none());

        clock.advance_secs(60);
        match engine.pause() {
            Some(Event::SessionPaused { remaining_ms, .. }) => {
                assert_eq!(remaining_ms, 24 * 60 * 1000)
            }
            other => panic!("Expected SessionPaused, got {other:?}"),
        }
        assert!(engine.is_paused());

        clock.advance_secs(600);
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_ms(), 24 * 60 * 1000);

        assert!(engine.resume().is_some());
        assert!(!engine.is_paused());
        clock.advance_secs(30);
        engine.tick();
        assert_eq!(engine.remaining_ms(), 24 * 60 * 1000 - 30_000);
    }

    #[test]
    fn guards_are_silent_no_ops() {
        let (mut engine, _, _) = engine_with(Settings::default());
        assert!(engine.pause().is_none());
        assert!(engine.resume().is_none());
        assert!(engine.complete().is_none());
        assert!(engine.tick().is_none());

        engine.start();
        assert!(engine.resume().is_none());
        engine.pause();
        assert!(engine.pause().is_none());
        assert!(engine.complete().is_none());
    }

    #[test]
    fn completion_fires_exactly_once() {
        let (mut engine, clock, notifier) = engine_with(Settings::default());
        engine.start();
        clock.advance_secs(1500);

        let completions = (0..50)
            .filter_map(|_| engine.tick())
            .filter(|e| matches!(e, Event::SessionCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(notifier.count(), 1);
        assert_eq!(engine.completed_work(), 1);
        assert_eq!(engine.kind(), SessionKind::Break);
        assert!(!engine.is_running());
    }

    #[test]
    fn work_not_yet_due_does_not_complete() {
        let (mut engine, clock, _) = engine_with(Settings::default());
        engine.start();
        clock.advance_ms(1_499_999);
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_ms(), 1);
        assert_eq!(engine.snapshot().remaining_secs, 1);
    }

    #[test]
    fn break_completion_returns_to_work_without_counting() {
        let (mut engine, clock, notifier) = engine_with(Settings::default());
        engine.start();
        clock.advance_secs(25 * 60);
        engine.tick();
        assert_eq!(engine.kind(), SessionKind::Break);

        engine.start();
        clock.advance_secs(5 * 60);
        let event = engine.tick();
        assert!(matches!(
            event,
            Some(Event::SessionCompleted {
                finished: SessionKind::Break,
                next: SessionKind::Work,
                completed_work: 1,
                ..
            })
        ));
        assert_eq!(engine.completed_work(), 1);
        assert_eq!(notifier.notices.lock().unwrap()[1].title, "Break over!");
    }

    #[test]
    fn stop_always_returns_to_idle_work() {
        let (mut engine, clock, _) = engine_with(Settings::default());
        engine.start();
        clock.advance_secs(25 * 60);
        engine.tick();
        engine.start();
        engine.pause();

        engine.stop();
        let snap = engine.snapshot();
        assert_eq!(snap.kind, SessionKind::Work);
        assert!(!snap.running);
        assert!(!snap.paused);
        assert_eq!(snap.completed_work, 1);
        assert!(engine.next_wakeup().is_none());
    }

    #[test]
    fn auto_start_fires_after_grace_delay() {
        let (mut engine, clock, _) = engine_with(Settings {
            auto_start_break: true,
            ..Settings::default()
        });
        engine.start();
        clock.advance_secs(25 * 60);
        let completed = engine.tick();
        assert!(matches!(
            completed,
            Some(Event::SessionCompleted { auto_start: true, .. })
        ));
        assert!(engine.is_running());
        assert!(!engine.is_ticking());
        assert_eq!(engine.next_wakeup(), Some(AUTO_START_DELAY));

        clock.advance_ms(500);
        assert!(engine.tick().is_none());

        clock.advance_ms(500);
        match engine.tick() {
            Some(Event::SessionStarted {
                kind,
                duration_secs,
                auto,
                ..
            }) => {
                assert_eq!(kind, SessionKind::Break);
                assert_eq!(duration_secs, 300);
                assert!(auto);
            }
            other => panic!("Expected SessionStarted, got {other:?}"),
        }
        assert!(engine.is_ticking());
    }

    #[test]
    fn stop_during_grace_window_suppresses_auto_start() {
        let (mut engine, clock, _) = engine_with(Settings {
            auto_start_break: true,
            ..Settings::default()
        });
        engine.start();
        clock.advance_secs(25 * 60);
        engine.tick();
        assert!(engine.pending_start().is_some());

        engine.stop();
        clock.advance_secs(5);
        assert!(engine.tick().is_none());
        assert!(!engine.is_running());
        assert_eq!(engine.kind(), SessionKind::Work);
    }

    #[test]
    fn manual_start_during_grace_window_supersedes_auto_start() {
        let (mut engine, clock, _) = engine_with(Settings {
            auto_start_break: true,
            ..Settings::default()
        });
        engine.start();
        clock.advance_secs(25 * 60);
        engine.tick();
        assert!(engine.pending_start().is_some());

        clock.advance_ms(200);
        match engine.start() {
            Some(Event::SessionStarted { kind, auto, .. }) => {
                assert_eq!(kind, SessionKind::Break);
                assert!(!auto);
            }
            other => panic!("Expected SessionStarted, got {other:?}"),
        }
        assert!(engine.pending_start().is_none());
        assert!(engine.is_ticking());

        // the superseded continuation never fires
        clock.advance_secs(2);
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_ms(), 5 * 60 * 1000 - 2000);
    }

    #[test]
    fn pause_at_segment_end_completes_once_after_resume() {
        let (mut engine, clock, notifier) = engine_with(Settings::default());
        engine.start();
        clock.advance_secs(25 * 60);
        assert!(matches!(
            engine.pause(),
            Some(Event::SessionPaused { remaining_ms: 0, .. })
        ));
        assert!(engine.tick().is_none());

        assert!(engine.resume().is_some());
        let mut completions = 0;
        for _ in 0..3 {
            if let Some(Event::SessionCompleted { .. }) = engine.tick() {
                completions += 1;
            }
            clock.advance_ms(100);
        }
        assert_eq!(completions, 1);
        assert_eq!(notifier.count(), 1);
        assert_eq!(engine.completed_work(), 1);
        assert_eq!(engine.kind(), SessionKind::Break);
    }

    #[test]
    fn custom_tick_interval_and_grace_delay_drive_wakeups() {
        let clock = Arc::new(ManualClock::starting_now());
        let mut engine = SessionEngine::new(
            clock.clone(),
            Arc::new(Settings {
                auto_start_break: true,
                ..Settings::default()
            }),
            Arc::new(RecordingNotifier::default()),
        )
        .with_tick_interval(Duration::from_millis(250))
        .with_auto_start_delay(Duration::from_millis(3000));

        assert_eq!(engine.next_wakeup(), None);
        engine.start();
        assert_eq!(engine.next_wakeup(), Some(Duration::from_millis(250)));

        clock.advance_secs(25 * 60);
        engine.tick();
        assert_eq!(engine.next_wakeup(), Some(Duration::from_millis(3000)));
        clock.advance_ms(2999);
        assert!(engine.tick().is_none());
        clock.advance_ms(1);
        assert!(matches!(
            engine.tick(),
            Some(Event::SessionStarted { auto: true, .. })
        ));
    }

    #[test]
    fn pause_during_grace_window_is_ignored() {
        let (mut engine, clock, _) = engine_with(Settings {
            auto_start_break: true,
            ..Settings::default()
        });
        engine.start();
        clock.advance_secs(25 * 60);
        engine.tick();
        assert!(engine.pause().is_none());
        assert!(!engine.is_paused());
    }

    #[test]
    fn auto_start_work_does_not_chain_into_break() {
        let (mut engine, clock, _) = engine_with(Settings {
            auto_start_work: true,
            ..Settings::default()
        });
        engine.start();
        clock.advance_secs(25 * 60);
        engine.tick();
        // auto_start_break is off: break waits for the user
        assert!(!engine.is_running());
        assert!(engine.pending_start().is_none());
        assert_eq!(engine.kind(), SessionKind::Break);
    }

    #[test]
    fn reset_clears_completed_work() {
        let (mut engine, clock, _) = engine_with(Settings::default());
        engine.start();
        clock.advance_secs(25 * 60);
        engine.tick();
        assert_eq!(engine.completed_work(), 1);
        engine.reset();
        assert_eq!(engine.completed_work(), 0);
        assert_eq!(engine.kind(), SessionKind::Work);
    }

    #[test]
    fn clock_stepping_back_never_raises_remaining() {
        let (mut engine, clock, _) = engine_with(Settings::default());
        engine.start();
        clock.advance_secs(100);
        engine.tick();
        let before = engine.remaining_ms();
        clock.advance_secs(-50);
        engine.tick();
        assert_eq!(engine.remaining_ms(), before);
    }

    #[test]
    fn recover_foreground_catches_up_after_long_gap() {
        let (mut engine, clock, _) = engine_with(Settings::default());
        engine.start();
        clock.advance_secs(3 * 3600);
        assert!(matches!(
            engine.recover_foreground(),
            Some(Event::SessionCompleted { .. })
        ));
        assert_eq!(engine.completed_work(), 1);
    }

    #[test]
    fn snapshot_when_idle_shows_configured_duration() {
        let (engine, _, _) = engine_with(Settings::default());
        let snap = engine.snapshot();
        assert!(!snap.running);
        assert_eq!(snap.remaining_secs, 25 * 60);
    }

    #[test]
    fn duration_is_read_at_start_time() {
        let clock = Arc::new(ManualClock::starting_now());
        let settings = Arc::new(crate::settings::SharedSettings::default());
        let mut engine = SessionEngine::new(
            clock.clone(),
            settings.clone(),
            Arc::new(RecordingNotifier::default()),
        );
        settings.update(|s| s.work_minutes = 50);
        engine.start();
        assert_eq!(engine.remaining_ms(), 50 * 60 * 1000);
    }
}
