use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::graph::Voice;
use crate::error::AudioError;

/// Lifecycle of an audio backend.
///
/// `Uninitialized` is never reported by a backend itself; the sound player
/// reports it while no backend has been created yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioState {
    Uninitialized,
    Suspended,
    Running,
}

/// An audio processing graph on which voices are scheduled.
///
/// Scheduling returns immediately; playback is asynchronous. Voices
/// scheduled while the backend is not running are silently lost, which is
/// why callers check [`AudioBackend::state`] first.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    fn state(&self) -> AudioState;

    /// Ask a suspended backend to start processing.
    async fn resume(&self) -> Result<(), AudioError>;

    /// Current graph time in seconds.
    fn current_time(&self) -> f64;

    fn schedule(&self, voice: Voice) -> Result<(), AudioError>;
}

/// Creates the backend on the first user gesture.
pub type BackendFactory =
    Box<dyn Fn() -> Result<Arc<dyn AudioBackend>, AudioError> + Send + Sync>;
