//! Completion notifications: an optional visual notification plus the
//! configured sound.

mod dispatcher;

pub use dispatcher::Dispatcher;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::timer::SessionKind;

/// What the engine announces when a session completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub finished: SessionKind,
    pub next: SessionKind,
}

impl Notice {
    pub fn for_transition(finished: SessionKind, next: SessionKind) -> Self {
        let (title, body) = match (finished, next) {
            (SessionKind::Work, SessionKind::LongBreak) => {
                ("Work complete!", "Time for a long break.")
            }
            (SessionKind::Work, _) => ("Work complete!", "Time for a break."),
            _ => ("Break over!", "Time to focus again."),
        };
        Self {
            title: title.into(),
            body: body.into(),
            finished,
            next,
        }
    }
}

/// Receives completion notices from the session engine.
///
/// Implementations must not block and must not panic: a broken notification
/// must never halt the timer.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not decided yet; asking is allowed.
    Default,
    Granted,
    Denied,
}

/// Platform visual notification capability.
pub trait VisualNotifier: Send + Sync {
    fn permission(&self) -> Permission;

    fn request_permission(&self) -> Result<Permission, NotifyError>;

    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}
