//! Core error types for focusbell-core.
//!
//! The session state machine never returns errors: invalid requests are
//! absorbed as no-ops. Errors only surface from configuration I/O, the
//! audio backends and the visual notification capability, and the latter
//! two are swallowed at the dispatcher boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// No usable configuration directory
    #[error("Cannot resolve configuration directory: {0}")]
    NoDataDir(String),
}

/// Audio backend errors.
///
/// None of these are fatal to the timer; the dispatcher logs them and moves on.
#[derive(Error, Debug)]
pub enum AudioError {
    /// Backend could not be created (no device, no host, ...)
    #[error("Audio backend unavailable: {0}")]
    Unavailable(String),

    /// A resume request was rejected
    #[error("Audio backend resume failed: {0}")]
    ResumeFailed(String),

    /// The backend went away while scheduling
    #[error("Audio backend closed")]
    Closed,

    /// A voice could not be scheduled
    #[error("Failed to schedule voice: {0}")]
    Schedule(String),

    /// WAV export failed
    #[error("WAV export failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Visual notification errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Showing or requesting failed
    #[error("Visual notification failed: {0}")]
    Failed(String),
}
