//! A backend that collects voices in memory and renders them on demand.
//!
//! Used to preview the sound library without an audio device, and as the
//! reference backend for tests of the playback path.

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use std::sync::Mutex;

use super::backend::{AudioBackend, AudioState};
use super::graph::Voice;
use super::render::render;
use crate::error::AudioError;

pub struct OfflineBackend {
    sample_rate: u32,
    state: Mutex<AudioState>,
    voices: Mutex<Vec<Voice>>,
}

impl OfflineBackend {
    /// Created suspended, like a device graph before its first resume.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: Mutex::new(AudioState::Suspended),
            voices: Mutex::new(Vec::new()),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.voices.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Mono f32 PCM of everything scheduled so far.
    pub fn render(&self) -> Vec<f32> {
        render(&self.voices(), self.sample_rate)
    }

    /// Write everything scheduled so far as a 16-bit mono WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<usize, AudioError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let pcm = self.render();
        let mut writer = WavWriter::create(path, spec)?;
        for sample in &pcm {
            writer.write_sample((sample * f32::from(i16::MAX)) as i16)?;
        }
        writer.finalize()?;
        Ok(pcm.len())
    }
}

#[async_trait]
impl AudioBackend for OfflineBackend {
    fn state(&self) -> AudioState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn resume(&self) -> Result<(), AudioError> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = AudioState::Running;
        Ok(())
    }

    /// Offline graphs do not advance on their own: every sound starts at 0.
    fn current_time(&self) -> f64 {
        0.0
    }

    fn schedule(&self, voice: Voice) -> Result<(), AudioError> {
        self.voices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(voice);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::recipes::{peak_gain, SoundId};

    #[tokio::test]
    async fn resume_moves_to_running() {
        let backend = OfflineBackend::new(8_000);
        assert_eq!(backend.state(), AudioState::Suspended);
        backend.resume().await.unwrap();
        assert_eq!(backend.state(), AudioState::Running);
    }

    #[test]
    fn wav_export_writes_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chime.wav");
        let backend = OfflineBackend::new(8_000);
        SoundId::Chime
            .recipe()
            .schedule(&backend, peak_gain(80))
            .unwrap();

        let frames = backend.write_wav(&path).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.len() as usize, frames);
        assert!(frames > 0);
    }
}
