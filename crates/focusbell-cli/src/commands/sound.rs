use clap::Subcommand;
use focusbell_core::audio::{
    AudioBackend, BackendFactory, OfflineBackend, PlayOutcome, DEFAULT_SAMPLE_RATE, LIBRARY,
};
use focusbell_core::{Config, SoundId, SoundPlayer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{self, BackendKind};

/// Playback lingers this long so the longest recipe can finish.
const PLAY_TAIL: Duration = Duration::from_millis(1600);

#[derive(Subcommand)]
pub enum SoundAction {
    /// List the available sounds
    List,
    /// Render a sound to a 16-bit mono WAV file
    Render {
        /// Sound id (bell, soft, chime, alert, beep)
        sound: String,
        /// Output file
        #[arg(long, short)]
        out: PathBuf,
        /// Volume percent, defaults to the configured volume
        #[arg(long)]
        volume: Option<u8>,
    },
    /// Play a sound once
    Play {
        /// Sound id, defaults to the configured profile
        sound: Option<String>,
        /// Volume percent, defaults to the configured volume
        #[arg(long)]
        volume: Option<u8>,
        /// Audio output
        #[arg(long, value_enum, default_value_t = BackendKind::Bell)]
        backend: BackendKind,
    },
}

pub fn run(action: SoundAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SoundAction::List => {
            let current = Config::load_or_default().sound.profile;
            for recipe in &LIBRARY {
                let marker = if recipe.id.as_str() == current { "*" } else { " " };
                println!("{marker} {:<6} {}", recipe.id.as_str(), recipe.label);
            }
        }
        SoundAction::Render { sound, out, volume } => {
            let sound: SoundId = sound.parse()?;
            let volume = volume.unwrap_or_else(|| Config::load_or_default().sound.volume);

            let offline = Arc::new(OfflineBackend::new(DEFAULT_SAMPLE_RATE));
            let shared = Arc::clone(&offline);
            let factory: BackendFactory =
                Box::new(move || Ok(Arc::clone(&shared) as Arc<dyn AudioBackend>));
            let player = SoundPlayer::new(factory, Arc::new(Config::load_or_default()));
            player.on_user_gesture();

            let runtime = tokio::runtime::Builder::new_current_thread().build()?;
            runtime.block_on(player.play_sound(sound, volume))?;
            let samples = offline.write_wav(&out)?;
            println!("wrote {samples} samples to {}", out.display());
        }
        SoundAction::Play {
            sound,
            volume,
            backend: kind,
        } => {
            let config = Config::load_or_default();
            let sound = SoundId::resolve(sound.as_deref().unwrap_or(&config.sound.profile));
            let volume = volume.unwrap_or(config.sound.volume);

            let player = SoundPlayer::new(backend::factory(kind), Arc::new(config));
            player.on_user_gesture();

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let outcome = runtime.block_on(async {
                let outcome = player.play_sound(sound, volume).await?;
                if matches!(outcome, PlayOutcome::Played { .. }) {
                    tokio::time::sleep(PLAY_TAIL).await;
                }
                Ok::<_, focusbell_core::AudioError>(outcome)
            })?;
            if let PlayOutcome::Skipped { reason } = outcome {
                eprintln!("sound skipped: {reason:?}");
            }
        }
    }
    Ok(())
}
