//! Native audio backends for the CLI driver.

use async_trait::async_trait;
use clap::ValueEnum;
use focusbell_core::audio::{AudioBackend, AudioState, BackendFactory, Voice};
use focusbell_core::AudioError;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Ring the terminal bell once per sound
    Bell,
    /// Play the synthesized sound on the default output device
    Speaker,
    /// No audio at all
    Off,
}

/// Build the factory the sound player calls on the first user gesture.
pub fn factory(kind: BackendKind) -> BackendFactory {
    match kind {
        BackendKind::Bell => Box::new(|| Ok(Arc::new(TerminalBell::new()) as Arc<dyn AudioBackend>)),
        BackendKind::Speaker => speaker_factory(),
        BackendKind::Off => Box::new(|| Err(AudioError::Unavailable("audio turned off".into()))),
    }
}

#[cfg(feature = "speaker")]
fn speaker_factory() -> BackendFactory {
    Box::new(|| {
        crate::speaker::SpeakerBackend::open().map(|b| Arc::new(b) as Arc<dyn AudioBackend>)
    })
}

#[cfg(not(feature = "speaker"))]
fn speaker_factory() -> BackendFactory {
    Box::new(|| {
        Err(AudioError::Unavailable(
            "built without the `speaker` feature".into(),
        ))
    })
}

/// Voices closer together than this ring the bell only once.
const BELL_COALESCE_SECS: f64 = 1.0;

/// Stands in for a real graph on terminals: each sound becomes one BEL.
pub struct TerminalBell {
    epoch: Instant,
    state: Mutex<AudioState>,
    last_ring: Mutex<Option<f64>>,
}

impl TerminalBell {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            state: Mutex::new(AudioState::Suspended),
            last_ring: Mutex::new(None),
        }
    }
}

impl Default for TerminalBell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioBackend for TerminalBell {
    fn state(&self) -> AudioState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn resume(&self) -> Result<(), AudioError> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = AudioState::Running;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn schedule(&self, voice: Voice) -> Result<(), AudioError> {
        let mut last = self.last_ring.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(*last, Some(t) if voice.start - t < BELL_COALESCE_SECS) {
            return Ok(());
        }
        *last = Some(voice.start);
        let mut err = std::io::stderr();
        err.write_all(b"\x07")
            .and_then(|_| err.flush())
            .map_err(|e| AudioError::Schedule(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusbell_core::SoundId;

    #[tokio::test]
    async fn bell_starts_suspended_and_resumes() {
        let bell = TerminalBell::new();
        assert_eq!(bell.state(), AudioState::Suspended);
        bell.resume().await.unwrap();
        assert_eq!(bell.state(), AudioState::Running);
    }

    #[test]
    fn one_ring_per_sound() {
        let bell = TerminalBell::new();
        SoundId::Alert.recipe().schedule(&bell, 0.3).unwrap();
        let first = bell.last_ring.lock().unwrap().unwrap();
        SoundId::Alert.recipe().schedule(&bell, 0.3).unwrap();
        // scheduled again within the coalescing window
        assert_eq!(bell.last_ring.lock().unwrap().unwrap(), first);
    }

    #[test]
    fn off_backend_refuses_creation() {
        assert!(factory(BackendKind::Off)().is_err());
    }
}
