//! Sample-accurate mixing of scheduled voices into mono PCM.

use super::graph::Voice;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

struct ActiveVoice {
    voice: Voice,
    /// One phase accumulator (in cycles) per oscillator.
    phases: Vec<f64>,
}

/// Streaming mixer. Voices are added with absolute graph times and rendered
/// block by block; output is hard-clipped to `[-1, 1]`.
pub struct Mixer {
    sample_rate: u32,
    position: u64,
    voices: Vec<ActiveVoice>,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            position: 0,
            voices: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Graph time of the next frame to be rendered.
    pub fn time(&self) -> f64 {
        self.position as f64 / f64::from(self.sample_rate)
    }

    /// Jump the render cursor (used to render from an arbitrary offset).
    pub fn seek(&mut self, time: f64) {
        self.position = (time.max(0.0) * f64::from(self.sample_rate)).round() as u64;
    }

    pub fn add(&mut self, voice: Voice) {
        let phases = vec![0.0; voice.oscillators.len()];
        self.voices.push(ActiveVoice { voice, phases });
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn fill(&mut self, out: &mut [f32]) {
        let sr = f64::from(self.sample_rate);
        for sample in out.iter_mut() {
            let t = self.position as f64 / sr;
            let mut acc = 0.0f32;
            for active in &mut self.voices {
                if !active.voice.is_sounding(t) {
                    continue;
                }
                let gain = active.voice.gain.value_at(t);
                for (osc, phase) in active.voice.oscillators.iter().zip(active.phases.iter_mut()) {
                    acc += osc.waveform.sample(*phase) * gain;
                    *phase += f64::from(osc.frequency.value_at(t)) / sr;
                }
            }
            *sample = acc.clamp(-1.0, 1.0);
            self.position += 1;
        }
        let now = self.time();
        self.voices.retain(|a| a.voice.stop > now);
    }
}

/// Render `voices` from their earliest start to their latest stop.
pub fn render(voices: &[Voice], sample_rate: u32) -> Vec<f32> {
    let Some(start) = voices.iter().map(|v| v.start).reduce(f64::min) else {
        return Vec::new();
    };
    let stop = voices.iter().map(|v| v.stop).fold(start, f64::max);

    let mut mixer = Mixer::new(sample_rate);
    mixer.seek(start);
    for voice in voices {
        mixer.add(voice.clone());
    }
    let frames = ((stop - start) * f64::from(mixer.sample_rate())).ceil() as usize;
    let mut out = vec![0.0; frames];
    mixer.fill(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::graph::{Oscillator, Param};
    use crate::audio::recipes::{peak_gain, SoundId};

    #[test]
    fn render_covers_the_whole_sound() {
        let voices = SoundId::Bell.recipe().voices(0.0, peak_gain(100));
        let pcm = render(&voices, 8_000);
        assert_eq!(pcm.len(), 12_000);
        let loudest = pcm.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(loudest > 0.1);
        assert!(loudest <= 1.0);
    }

    #[test]
    fn empty_render_is_empty() {
        assert!(render(&[], 8_000).is_empty());
    }

    #[test]
    fn output_is_clipped() {
        let gain = Param::new(5.0);
        let voice = Voice::new(vec![Oscillator::square(100.0)], gain, 0.0, 0.1);
        let pcm = render(&[voice], 8_000);
        assert!(pcm.iter().all(|s| s.abs() <= 1.0));
        assert!(pcm.iter().any(|s| *s == 1.0));
    }

    #[test]
    fn finished_voices_are_dropped() {
        let mut mixer = Mixer::new(1_000);
        mixer.add(Voice::new(vec![Oscillator::sine(10.0)], Param::new(0.5), 0.0, 0.05));
        let mut block = vec![0.0; 100];
        mixer.fill(&mut block);
        assert_eq!(mixer.active_voices(), 0);
        assert!((mixer.time() - 0.1).abs() < 1e-9);
        assert!(block[60..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn seeking_past_skipped_frames_keeps_time_aligned() {
        let mut mixer = Mixer::new(1_000);
        mixer.add(Voice::new(vec![Oscillator::sine(10.0)], Param::new(0.5), 0.0, 0.05));
        let mut block = vec![0.0; 20];
        mixer.fill(&mut block);

        // 100 frames went out as silence without touching the mixer
        mixer.seek(mixer.time() + 0.1);
        assert!((mixer.time() - 0.12).abs() < 1e-9);

        mixer.fill(&mut block);
        assert!(block.iter().all(|s| *s == 0.0));
        assert_eq!(mixer.active_voices(), 0);
        assert!((mixer.time() - 0.14).abs() < 1e-9);
    }

    #[test]
    fn silence_before_a_voice_starts() {
        let mut mixer = Mixer::new(1_000);
        mixer.add(Voice::new(vec![Oscillator::square(10.0)], Param::new(0.5), 0.05, 0.1));
        let mut block = vec![0.0; 100];
        mixer.fill(&mut block);
        assert!(block[..50].iter().all(|s| *s == 0.0));
        assert!(block[50..].iter().any(|s| *s != 0.0));
    }
}
