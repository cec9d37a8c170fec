//! Procedural notification sounds.
//!
//! - [`graph`]: oscillator / gain-envelope primitives
//! - [`recipes`]: the five-profile sound library
//! - [`player`]: backend lifecycle and playback of the configured sound
//! - [`render`], [`offline`]: pure-Rust mixing and WAV export

mod backend;
pub mod graph;
pub mod offline;
mod player;
pub mod recipes;
pub mod render;

pub use backend::{AudioBackend, AudioState, BackendFactory};
pub use graph::{Automation, Oscillator, Param, Voice, Waveform};
pub use offline::OfflineBackend;
pub use player::{PlayOutcome, SkipReason, SoundPlayer};
pub use recipes::{peak_gain, Recipe, SoundId, BASE_GAIN, LIBRARY};
pub use render::{render, Mixer, DEFAULT_SAMPLE_RATE};
