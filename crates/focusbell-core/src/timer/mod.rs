mod engine;
mod kind;
mod task;

pub use engine::{SessionEngine, SessionState};
pub use kind::SessionKind;
pub use task::{PendingStart, TickTask, AUTO_START_DELAY, TICK_INTERVAL};
