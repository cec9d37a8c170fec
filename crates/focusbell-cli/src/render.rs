//! Terminal presentation of events and snapshots.

use focusbell_core::{Event, SessionKind, SessionSnapshot};
use std::io::Write;

/// `MM:SS`, with minutes growing past 99 if needed.
pub fn clock_face(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn describe(event: &Event) -> String {
    match event {
        Event::SessionStarted {
            kind,
            duration_secs,
            auto,
            ..
        } => {
            let how = if *auto { " (auto)" } else { "" };
            format!("{kind} started{how}, {}", clock_face(*duration_secs))
        }
        Event::SessionPaused { remaining_ms, .. } => {
            format!("paused with {} left", clock_face(remaining_ms.div_ceil(1000)))
        }
        Event::SessionResumed { remaining_ms, .. } => {
            format!("resumed, {} left", clock_face(remaining_ms.div_ceil(1000)))
        }
        Event::SessionCompleted {
            finished,
            next,
            completed_work,
            auto_start,
            ..
        } => {
            let then = if *auto_start {
                format!("{next} starts shortly")
            } else {
                format!("type `s` to start {next}")
            };
            format!("{finished} finished (#{completed_work} done), {then}")
        }
        Event::SessionStopped { .. } => "stopped".to_string(),
        Event::SessionReset { .. } => "reset, completed count cleared".to_string(),
    }
}

pub struct Output {
    json: bool,
    /// Hide the countdown during work sessions.
    blind: bool,
    last_shown: Option<(SessionKind, u64)>,
}

impl Output {
    pub fn new(json: bool, blind: bool) -> Self {
        Self {
            json,
            blind,
            last_shown: None,
        }
    }

    pub fn event(&mut self, event: &Event) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "cannot serialize event"),
            }
        } else {
            println!("\n{}", describe(event));
        }
        self.last_shown = None;
    }

    /// Full snapshot on request.
    pub fn snapshot(&mut self, snapshot: &SessionSnapshot) {
        if self.json {
            match serde_json::to_string(snapshot) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "cannot serialize snapshot"),
            }
        } else {
            println!("\n{}", self.status_line(snapshot));
        }
    }

    /// In-place countdown, redrawn when the displayed second changes.
    pub fn progress(&mut self, snapshot: &SessionSnapshot) {
        if self.json || !snapshot.running {
            return;
        }
        let shown = (snapshot.kind, snapshot.remaining_secs);
        if self.last_shown == Some(shown) {
            return;
        }
        self.last_shown = Some(shown);
        print!("\r{}   ", self.status_line(snapshot));
        let _ = std::io::stdout().flush();
    }

    pub fn message(&self, text: &str) {
        if !self.json {
            println!("{text}");
        }
    }

    fn status_line(&self, s: &SessionSnapshot) -> String {
        let time = if self.blind && !s.kind.is_break() && s.running {
            "--:--".to_string()
        } else {
            clock_face(s.remaining_secs)
        };
        let state = match (s.running, s.paused) {
            (_, true) => "paused",
            (true, false) => "running",
            (false, false) => "ready",
        };
        format!("[{}] {time} {state}  done: {}", s.kind, s.completed_work)
    }
}
