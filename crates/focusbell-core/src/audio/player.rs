//! Playback of the configured notification sound.
//!
//! Platforms gate audio graph creation behind a user gesture, so the backend
//! is created lazily by [`SoundPlayer::on_user_gesture`] and then reused for
//! the life of the process. Every playback probes the backend state first:
//! a suspended graph is resumed once, and a graph that still is not running
//! is skipped quietly because voices scheduled on it would be silent anyway.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use super::backend::{AudioBackend, AudioState, BackendFactory};
use super::recipes::{peak_gain, SoundId};
use crate::error::AudioError;
use crate::settings::SettingsProvider;

/// Why a playback request did not produce sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Sound is switched off in settings.
    Disabled,
    /// No user gesture has created the backend yet.
    Uninitialized,
    /// The backend could not be brought to the running state.
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlayOutcome {
    Played { sound: SoundId, voices: usize },
    Skipped { reason: SkipReason },
}

pub struct SoundPlayer {
    factory: BackendFactory,
    backend: Mutex<Option<Arc<dyn AudioBackend>>>,
    settings: Arc<dyn SettingsProvider>,
}

impl SoundPlayer {
    pub fn new(factory: BackendFactory, settings: Arc<dyn SettingsProvider>) -> Self {
        Self {
            factory,
            backend: Mutex::new(None),
            settings,
        }
    }

    /// Create the backend if this is the first gesture. Later calls are free.
    ///
    /// A failed creation is logged and retried on the next gesture.
    pub fn on_user_gesture(&self) {
        let mut slot = self.backend.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return;
        }
        match (self.factory)() {
            Ok(backend) => {
                debug!(state = ?backend.state(), "audio backend created");
                *slot = Some(backend);
            }
            Err(e) => warn!(error = %e, "audio backend creation failed"),
        }
    }

    pub fn backend(&self) -> Option<Arc<dyn AudioBackend>> {
        self.backend
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn state(&self) -> AudioState {
        self.backend()
            .map(|b| b.state())
            .unwrap_or(AudioState::Uninitialized)
    }

    /// Play the sound selected in settings.
    pub async fn play(&self) -> Result<PlayOutcome, AudioError> {
        let settings = self.settings.settings();
        if !settings.sound_enabled {
            return Ok(PlayOutcome::Skipped {
                reason: SkipReason::Disabled,
            });
        }
        let sound = SoundId::resolve(&settings.sound_profile);
        self.play_at(sound, settings.sound_volume).await
    }

    /// Play `sound` at `volume_percent`, ignoring the enabled flag.
    pub async fn play_sound(
        &self,
        sound: SoundId,
        volume_percent: u8,
    ) -> Result<PlayOutcome, AudioError> {
        self.play_at(sound, volume_percent).await
    }

    async fn play_at(&self, sound: SoundId, volume_percent: u8) -> Result<PlayOutcome, AudioError> {
        let Some(backend) = self.backend() else {
            debug!("no audio backend yet, skipping sound");
            return Ok(PlayOutcome::Skipped {
                reason: SkipReason::Uninitialized,
            });
        };

        if backend.state() == AudioState::Suspended {
            if let Err(e) = backend.resume().await {
                warn!(error = %e, "audio resume rejected, skipping sound");
                return Ok(PlayOutcome::Skipped {
                    reason: SkipReason::NotRunning,
                });
            }
        }
        if backend.state() != AudioState::Running {
            debug!(state = ?backend.state(), "audio backend not running, skipping sound");
            return Ok(PlayOutcome::Skipped {
                reason: SkipReason::NotRunning,
            });
        }

        let voices = sound
            .recipe()
            .schedule(backend.as_ref(), peak_gain(volume_percent))?;
        debug!(%sound, voices, "notification sound scheduled");
        Ok(PlayOutcome::Played { sound, voices })
    }
}
