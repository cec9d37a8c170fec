use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Notice, Notifier, Permission, VisualNotifier};
use crate::audio::{PlayOutcome, SoundPlayer};

/// Bridges session completions to the visual notifier and the sound player.
///
/// Nothing escapes `dispatch`: visual failures are ignored, sound failures
/// are logged, and sound playback runs detached on the tokio runtime so the
/// engine can decide on auto-start without waiting for it.
pub struct Dispatcher {
    sounds: Arc<SoundPlayer>,
    visual: Option<Arc<dyn VisualNotifier>>,
    runtime: Option<Handle>,
}

impl Dispatcher {
    /// Captures the current tokio runtime, if any, for sound playback.
    pub fn new(sounds: Arc<SoundPlayer>) -> Self {
        Self {
            sounds,
            visual: None,
            runtime: Handle::try_current().ok(),
        }
    }

    pub fn with_visual(mut self, visual: Arc<dyn VisualNotifier>) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn sounds(&self) -> &Arc<SoundPlayer> {
        &self.sounds
    }

    /// Ask for visual notification permission if it was never decided.
    /// Meant to run once at startup, never mid-session.
    pub fn request_permission_at_startup(&self) {
        let Some(visual) = &self.visual else {
            return;
        };
        if visual.permission() != Permission::Default {
            return;
        }
        match visual.request_permission() {
            Ok(p) => debug!(permission = ?p, "notification permission decided"),
            Err(e) => debug!(error = %e, "notification permission request failed"),
        }
    }

    /// Show `title`/`body` and start the notification sound.
    ///
    /// Returns the detached sound task, which yields `None` when playback
    /// failed. No task is returned when there is no runtime to spawn on.
    pub fn dispatch(&self, title: &str, body: &str) -> Option<JoinHandle<Option<PlayOutcome>>> {
        if let Some(visual) = &self.visual {
            if visual.permission() == Permission::Granted {
                if let Err(e) = visual.show(title, body) {
                    debug!(error = %e, "visual notification dropped");
                }
            }
        }

        let Some(runtime) = &self.runtime else {
            warn!("no async runtime available, notification sound skipped");
            return None;
        };
        let sounds = Arc::clone(&self.sounds);
        Some(runtime.spawn(async move {
            match sounds.play().await {
                Ok(outcome) => {
                    debug!(?outcome, "notification sound finished scheduling");
                    Some(outcome)
                }
                Err(e) => {
                    warn!(error = %e, "notification sound failed");
                    None
                }
            }
        }))
    }
}

impl Notifier for Dispatcher {
    fn notify(&self, notice: &Notice) {
        // the sound task is detached
        let _ = self.dispatch(&notice.title, &notice.body);
    }
}
