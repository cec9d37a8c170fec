//! The sound library: five alert profiles built from oscillators and gain
//! envelopes only, no audio assets.
//!
//! A recipe is a pure function of (start time, peak gain) to voices.
//! Envelope multipliers go up to 2.0, so [`BASE_GAIN`] keeps the loudest
//! profile at full volume below clipping.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use super::backend::AudioBackend;
use super::graph::{Oscillator, Param, Voice};
use crate::error::AudioError;

/// Ceiling applied to the configured volume before recipe multipliers.
pub const BASE_GAIN: f32 = 0.35;

/// Envelope level treated as silence at the end of exponential tails.
const SILENCE: f32 = 0.001;

/// Peak linear gain handed to a recipe for a volume percentage.
pub fn peak_gain(volume_percent: u8) -> f32 {
    BASE_GAIN * f32::from(volume_percent.min(100)) / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundId {
    Bell,
    Soft,
    Chime,
    Alert,
    Beep,
}

#[derive(Debug, Error)]
#[error("unknown sound profile: {0}")]
pub struct UnknownSound(pub String);

impl SoundId {
    pub const ALL: [SoundId; 5] = [
        SoundId::Bell,
        SoundId::Soft,
        SoundId::Chime,
        SoundId::Alert,
        SoundId::Beep,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SoundId::Bell => "bell",
            SoundId::Soft => "soft",
            SoundId::Chime => "chime",
            SoundId::Alert => "alert",
            SoundId::Beep => "beep",
        }
    }

    /// Look up a configured profile id, falling back to `beep`.
    pub fn resolve(id: &str) -> SoundId {
        id.parse().unwrap_or_else(|e: UnknownSound| {
            warn!(error = %e, "falling back to beep");
            SoundId::Beep
        })
    }

    pub fn recipe(self) -> &'static Recipe {
        match self {
            SoundId::Bell => &LIBRARY[0],
            SoundId::Soft => &LIBRARY[1],
            SoundId::Chime => &LIBRARY[2],
            SoundId::Alert => &LIBRARY[3],
            SoundId::Beep => &LIBRARY[4],
        }
    }
}

impl FromStr for SoundId {
    type Err = UnknownSound;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoundId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSound(s.to_string()))
    }
}

impl std::fmt::Display for SoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, stateless sound generator.
pub struct Recipe {
    pub id: SoundId,
    pub label: &'static str,
    build: fn(f64, f32) -> Vec<Voice>,
}

impl Recipe {
    /// Voices for a sound starting at graph time `t0`.
    pub fn voices(&self, t0: f64, gain: f32) -> Vec<Voice> {
        (self.build)(t0, gain)
    }

    /// Schedule the sound on `backend` starting now. Returns the voice count.
    pub fn schedule(&self, backend: &dyn AudioBackend, gain: f32) -> Result<usize, AudioError> {
        let voices = self.voices(backend.current_time(), gain);
        let count = voices.len();
        for voice in voices {
            backend.schedule(voice)?;
        }
        Ok(count)
    }
}

impl std::fmt::Debug for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recipe")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

pub static LIBRARY: [Recipe; 5] = [
    Recipe {
        id: SoundId::Bell,
        label: "Bell",
        build: bell,
    },
    Recipe {
        id: SoundId::Soft,
        label: "Soft",
        build: soft,
    },
    Recipe {
        id: SoundId::Chime,
        label: "Chime",
        build: chime,
    },
    Recipe {
        id: SoundId::Alert,
        label: "Alert",
        build: alert,
    },
    Recipe {
        id: SoundId::Beep,
        label: "Beep",
        build: beep,
    },
];

/// Two partials struck together, fast attack and a long ring.
fn bell(t0: f64, g: f32) -> Vec<Voice> {
    let gain = Param::new(0.0)
        .set(0.0, t0)
        .linear_to(1.8 * g, t0 + 0.02)
        .linear_to(1.4 * g, t0 + 0.1)
        .exponential_to(SILENCE, t0 + 1.5);
    vec![Voice::new(
        vec![Oscillator::sine(1200.0), Oscillator::sine(1800.0)],
        gain,
        t0,
        t0 + 1.5,
    )]
}

/// A falling sine, 880 to 660 Hz.
fn soft(t0: f64, g: f32) -> Vec<Voice> {
    let frequency = Param::new(880.0)
        .set(880.0, t0)
        .exponential_to(660.0, t0 + 0.5);
    let gain = Param::new(0.0)
        .set(0.0, t0)
        .linear_to(1.3 * g, t0 + 0.1)
        .linear_to(g, t0 + 0.5)
        .exponential_to(SILENCE, t0 + 1.5);
    vec![Voice::new(
        vec![Oscillator::sine(880.0).with_frequency(frequency)],
        gain,
        t0,
        t0 + 1.5,
    )]
}

/// Three rising tones, 120 ms apart.
fn chime(t0: f64, g: f32) -> Vec<Voice> {
    [800.0, 1000.0, 1200.0]
        .into_iter()
        .enumerate()
        .map(|(i, hz)| {
            let start = t0 + 0.12 * i as f64;
            let gain = Param::new(0.0)
                .set(0.0, start)
                .linear_to(1.5 * g, start + 0.05)
                .exponential_to(SILENCE, start + 1.05);
            Voice::new(vec![Oscillator::sine(hz)], gain, start, start + 1.05)
        })
        .collect()
}

/// Three hard 1500 Hz pulses.
fn alert(t0: f64, g: f32) -> Vec<Voice> {
    (0..3)
        .map(|i| {
            let start = t0 + 0.25 * f64::from(i);
            let end = start + 0.15;
            let gain = Param::new(0.0)
                .set(0.0, start)
                .linear_to(2.0 * g, start + 0.01)
                .set(0.0, end);
            Voice::new(vec![Oscillator::square(1500.0)], gain, start, end)
        })
        .collect()
}

/// 1000 Hz then 1500 Hz, 200 ms each, dipping to zero between them.
fn beep(t0: f64, g: f32) -> Vec<Voice> {
    let peak = 1.8 * g;
    let frequency = Param::new(1000.0)
        .set(1000.0, t0)
        .set(1500.0, t0 + 0.2);
    let gain = Param::new(0.0)
        .set(0.0, t0)
        .linear_to(peak, t0 + 0.01)
        .set(peak, t0 + 0.19)
        .linear_to(0.0, t0 + 0.2)
        .linear_to(peak, t0 + 0.21)
        .set(peak, t0 + 0.39)
        .linear_to(0.0, t0 + 0.4);
    vec![Voice::new(
        vec![Oscillator::sine(1000.0).with_frequency(frequency)],
        gain,
        t0,
        t0 + 0.4,
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(voices: &[Voice]) -> f64 {
        let start = voices.iter().map(|v| v.start).fold(f64::INFINITY, f64::min);
        let stop = voices.iter().map(|v| v.stop).fold(0.0, f64::max);
        stop - start
    }

    #[test]
    fn library_is_indexed_by_id() {
        for id in SoundId::ALL {
            assert_eq!(id.recipe().id, id);
        }
    }

    #[test]
    fn unknown_profile_falls_back_to_beep() {
        assert_eq!(SoundId::resolve("kazoo"), SoundId::Beep);
        assert_eq!(SoundId::resolve(""), SoundId::Beep);
        assert_eq!(SoundId::resolve("Chime"), SoundId::Chime);
        assert!("kazoo".parse::<SoundId>().is_err());
    }

    #[test]
    fn peak_gain_scales_volume() {
        assert_eq!(peak_gain(0), 0.0);
        assert!((peak_gain(50) - BASE_GAIN / 2.0).abs() < 1e-6);
        assert_eq!(peak_gain(200), peak_gain(100));
    }

    #[test]
    fn no_recipe_exceeds_twice_the_peak_gain() {
        let g = peak_gain(100);
        for recipe in &LIBRARY {
            for voice in recipe.voices(0.0, g) {
                assert!(voice.peak_gain() <= 2.0 * g + 1e-6, "{:?}", recipe.id);
                assert!(voice.peak_gain() <= 1.0, "{:?}", recipe.id);
            }
        }
    }

    #[test]
    fn no_recipe_outlasts_a_second_and_a_half() {
        for recipe in &LIBRARY {
            let voices = recipe.voices(10.0, 0.3);
            assert!(!voices.is_empty());
            assert!(span(&voices) <= 1.5 + 1e-9, "{:?}", recipe.id);
            assert!(voices.iter().all(|v| v.start >= 10.0));
        }
    }

    #[test]
    fn bell_is_two_simultaneous_partials() {
        let voices = SoundId::Bell.recipe().voices(0.0, 0.3);
        assert_eq!(voices.len(), 1);
        let freqs: Vec<f32> = voices[0]
            .oscillators
            .iter()
            .map(|o| o.frequency.value_at(0.0))
            .collect();
        assert_eq!(freqs, vec![1200.0, 1800.0]);
        assert!((voices[0].gain.value_at(0.02) - 0.54).abs() < 1e-5);
        assert!((voices[0].gain.value_at(0.1) - 0.42).abs() < 1e-5);
    }

    #[test]
    fn soft_sweeps_down() {
        let voice = &SoundId::Soft.recipe().voices(0.0, 0.3)[0];
        let f = &voice.oscillators[0].frequency;
        assert_eq!(f.value_at(0.0), 880.0);
        assert!((f.value_at(0.5) - 660.0).abs() < 1e-3);
        assert!(f.value_at(0.25) < 880.0 && f.value_at(0.25) > 660.0);
    }

    #[test]
    fn chime_tones_are_staggered() {
        let voices = SoundId::Chime.recipe().voices(0.0, 0.3);
        let starts: Vec<f64> = voices.iter().map(|v| v.start).collect();
        assert_eq!(starts.len(), 3);
        assert!((starts[1] - 0.12).abs() < 1e-9);
        assert!((starts[2] - 0.24).abs() < 1e-9);
    }

    #[test]
    fn alert_pulses_cut_to_zero() {
        let voices = SoundId::Alert.recipe().voices(0.0, 0.3);
        assert_eq!(voices.len(), 3);
        for (i, voice) in voices.iter().enumerate() {
            assert!((voice.duration() - 0.15).abs() < 1e-9);
            assert!((voice.start - 0.25 * i as f64).abs() < 1e-9);
            assert!((voice.gain.value_at(voice.start + 0.1) - 0.6).abs() < 1e-6);
            assert_eq!(voice.gain.value_at(voice.stop), 0.0);
        }
    }

    #[test]
    fn beep_switches_pitch_through_silence() {
        let voice = &SoundId::Beep.recipe().voices(0.0, 0.3)[0];
        let f = &voice.oscillators[0].frequency;
        assert_eq!(f.value_at(0.1), 1000.0);
        assert_eq!(f.value_at(0.3), 1500.0);
        assert_eq!(voice.gain.value_at(0.2), 0.0);
        assert!((voice.gain.value_at(0.1) - 0.54).abs() < 1e-5);
    }
}
