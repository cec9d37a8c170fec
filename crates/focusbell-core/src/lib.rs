//! # focusbell Core Library
//!
//! This library provides the core logic of the focusbell focus timer: a
//! session state machine cycling through work, break and long break
//! intervals, and a procedural sound engine that announces each transition.
//! Drivers (the CLI, tests) own the tick loop and inject the clock, the
//! settings and the audio/notification capabilities.
//!
//! ## Architecture
//!
//! - **Session Engine**: A wall-clock-based state machine that requires the
//!   caller to periodically invoke `tick()` for progress updates
//! - **Sound Library**: Five alert recipes built from oscillators and gain
//!   envelopes, scheduled on an injected audio backend
//! - **Dispatcher**: Turns completions into a visual notification and a sound,
//!   never letting either failure reach the timer
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: Core session state machine
//! - [`SoundPlayer`]: Audio backend lifecycle and playback
//! - [`Dispatcher`]: Completion notification fan-out
//! - [`Config`]: Application configuration management

pub mod audio;
pub mod clock;
pub mod error;
pub mod events;
pub mod notify;
pub mod settings;
pub mod storage;
pub mod timer;

pub use audio::{AudioBackend, AudioState, PlayOutcome, SoundId, SoundPlayer};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AudioError, ConfigError, NotifyError};
pub use events::{Event, SessionSnapshot};
pub use notify::{Dispatcher, Notice, Notifier, Permission, VisualNotifier};
pub use settings::{Settings, SettingsProvider, SharedSettings};
pub use storage::Config;
pub use timer::{SessionEngine, SessionKind};
