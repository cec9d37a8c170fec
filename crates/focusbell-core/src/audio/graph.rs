//! Oscillator and gain-envelope primitives.
//!
//! A [`Voice`] is one or more oscillators summed into a single gain node,
//! started and stopped at absolute graph times (seconds). Parameter
//! automation follows Web Audio semantics: a ramp event describes the path
//! *from the previous event* to its own value and time.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Floor used by exponential ramps, which cannot reach zero.
pub const MIN_EXPONENTIAL_VALUE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Sample at `phase` in cycles (only the fractional part matters).
    pub fn sample(self, phase: f64) -> f32 {
        let p = phase.fract();
        let v = match self {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * p - 1.0,
        };
        v as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Automation {
    /// Jump to `value` at `at`.
    Set { value: f32, at: f64 },
    /// Linear ramp from the previous event, reaching `value` at `at`.
    Linear { value: f32, at: f64 },
    /// Exponential ramp from the previous event, reaching `value` at `at`.
    Exponential { value: f32, at: f64 },
}

impl Automation {
    pub fn at(&self) -> f64 {
        match *self {
            Automation::Set { at, .. }
            | Automation::Linear { at, .. }
            | Automation::Exponential { at, .. } => at,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            Automation::Set { value, .. }
            | Automation::Linear { value, .. }
            | Automation::Exponential { value, .. } => value,
        }
    }
}

/// An automatable parameter (frequency or gain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    default: f32,
    events: Vec<Automation>,
}

impl Param {
    pub fn new(default: f32) -> Self {
        Self {
            default,
            events: Vec::new(),
        }
    }

    pub fn set(mut self, value: f32, at: f64) -> Self {
        self.events.push(Automation::Set { value, at });
        self
    }

    pub fn linear_to(mut self, value: f32, at: f64) -> Self {
        self.events.push(Automation::Linear { value, at });
        self
    }

    /// Targets at or below zero are lifted to [`MIN_EXPONENTIAL_VALUE`].
    pub fn exponential_to(mut self, value: f32, at: f64) -> Self {
        self.events.push(Automation::Exponential {
            value: value.max(MIN_EXPONENTIAL_VALUE),
            at,
        });
        self
    }

    pub fn events(&self) -> &[Automation] {
        &self.events
    }

    /// Largest value the parameter ever takes.
    pub fn peak(&self) -> f32 {
        self.events
            .iter()
            .map(Automation::value)
            .fold(self.default, f32::max)
    }

    /// Value at graph time `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        let mut prev_value = self.default;
        let mut prev_at = f64::NEG_INFINITY;

        for event in &self.events {
            let at = event.at();
            if t < at {
                return match *event {
                    Automation::Set { .. } => prev_value,
                    Automation::Linear { value, .. } => {
                        if !prev_at.is_finite() || at <= prev_at {
                            return prev_value;
                        }
                        let frac = ((t - prev_at) / (at - prev_at)) as f32;
                        prev_value + (value - prev_value) * frac
                    }
                    Automation::Exponential { value, .. } => {
                        if !prev_at.is_finite()
                            || at <= prev_at
                            || prev_value <= 0.0
                            || value <= 0.0
                        {
                            return prev_value;
                        }
                        let frac = (t - prev_at) / (at - prev_at);
                        let ratio = f64::from(value) / f64::from(prev_value);
                        (f64::from(prev_value) * ratio.powf(frac)) as f32
                    }
                };
            }
            prev_value = event.value();
            prev_at = at;
        }
        prev_value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub frequency: Param,
}

impl Oscillator {
    pub fn new(waveform: Waveform, hz: f32) -> Self {
        Self {
            waveform,
            frequency: Param::new(hz),
        }
    }

    pub fn sine(hz: f32) -> Self {
        Self::new(Waveform::Sine, hz)
    }

    pub fn square(hz: f32) -> Self {
        Self::new(Waveform::Square, hz)
    }

    pub fn with_frequency(mut self, frequency: Param) -> Self {
        self.frequency = frequency;
        self
    }
}

/// Oscillators feeding one gain node, audible between `start` and `stop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub oscillators: Vec<Oscillator>,
    pub gain: Param,
    pub start: f64,
    pub stop: f64,
}

impl Voice {
    pub fn new(oscillators: Vec<Oscillator>, gain: Param, start: f64, stop: f64) -> Self {
        Self {
            oscillators,
            gain,
            start,
            stop,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.stop - self.start).max(0.0)
    }

    pub fn is_sounding(&self, t: f64) -> bool {
        t >= self.start && t < self.stop
    }

    /// Peak linear gain reached by the envelope.
    pub fn peak_gain(&self) -> f32 {
        self.gain.peak()
    }
}
