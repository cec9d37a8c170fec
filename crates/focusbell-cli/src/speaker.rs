//! cpal output backend.
//!
//! `cpal::Stream` is `!Send`, so a dedicated audio thread builds and owns
//! it. The backend talks to that thread over a command channel; `resume`
//! waits for the thread to report whether the stream actually started.

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use focusbell_core::audio::{AudioBackend, AudioState, Mixer, Voice};
use focusbell_core::AudioError;
use std::sync::{mpsc, Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, warn};

enum Command {
    Play(oneshot::Sender<Result<(), AudioError>>),
}

pub struct SpeakerBackend {
    mixer: Arc<Mutex<Mixer>>,
    state: Mutex<AudioState>,
    commands: Mutex<mpsc::Sender<Command>>,
}

impl SpeakerBackend {
    /// Open the default output device. The stream starts paused.
    pub fn open() -> Result<Self, AudioError> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<Arc<Mutex<Mixer>>, AudioError>>(1);
        let (command_tx, command_rx) = mpsc::channel::<Command>();

        std::thread::Builder::new()
            .name("focusbell-audio".into())
            .spawn(move || {
                let (stream, mixer) = match build_stream() {
                    Ok(built) => built,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(mixer));

                // Ends when the backend (and its sender) is dropped.
                while let Ok(command) = command_rx.recv() {
                    match command {
                        Command::Play(reply) => {
                            let result = stream
                                .play()
                                .map_err(|e| AudioError::ResumeFailed(e.to_string()));
                            let _ = reply.send(result);
                        }
                    }
                }
                debug!("audio thread shutting down");
            })
            .map_err(|e| AudioError::Unavailable(e.to_string()))?;

        let mixer = ready_rx
            .recv()
            .map_err(|_| AudioError::Unavailable("audio thread exited".into()))??;

        Ok(Self {
            mixer,
            state: Mutex::new(AudioState::Suspended),
            commands: Mutex::new(command_tx),
        })
    }
}

#[async_trait]
impl AudioBackend for SpeakerBackend {
    fn state(&self) -> AudioState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn resume(&self) -> Result<(), AudioError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let commands = self.commands.lock().unwrap_or_else(|e| e.into_inner());
            commands
                .send(Command::Play(reply_tx))
                .map_err(|_| AudioError::Closed)?;
        }
        reply_rx.await.map_err(|_| AudioError::Closed)??;
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = AudioState::Running;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.mixer.lock().unwrap_or_else(|e| e.into_inner()).time()
    }

    fn schedule(&self, voice: Voice) -> Result<(), AudioError> {
        self.mixer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .add(voice);
        Ok(())
    }
}

fn build_stream() -> Result<(cpal::Stream, Arc<Mutex<Mixer>>), AudioError> {
    let unavailable = |e: &dyn std::fmt::Display| AudioError::Unavailable(e.to_string());

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::Unavailable("No output device available".into()))?;
    let supported = device.default_output_config().map_err(|e| unavailable(&e))?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let mixer = Arc::new(Mutex::new(Mixer::new(config.sample_rate.0)));

    let stream = match sample_format {
        cpal::SampleFormat::F32 => write_stream::<f32>(&device, &config, mixer.clone()),
        cpal::SampleFormat::I16 => write_stream::<i16>(&device, &config, mixer.clone()),
        cpal::SampleFormat::U16 => write_stream::<u16>(&device, &config, mixer.clone()),
        format => {
            return Err(AudioError::Unavailable(format!(
                "Unsupported sample format: {format:?}"
            )))
        }
    }
    .map_err(|e| unavailable(&e))?;

    stream.pause().map_err(|e| unavailable(&e))?;
    Ok((stream, mixer))
}

fn write_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = usize::from(config.channels.max(1));
    let sample_rate = f64::from(config.sample_rate.0.max(1));
    let mut mono = Vec::new();
    // Frames played as silence while a scheduler held the mixer.
    let mut missed: u64 = 0;

    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels;
            mono.resize(frames, 0.0f32);
            match mixer.try_lock() {
                Ok(mut mixer) => {
                    if missed > 0 {
                        // keep graph time on the device clock
                        let behind = missed as f64 / sample_rate;
                        let now = mixer.time();
                        mixer.seek(now + behind);
                        missed = 0;
                    }
                    mixer.fill(&mut mono);
                }
                Err(_) => {
                    mono.iter_mut().for_each(|s| *s = 0.0);
                    missed += frames as u64;
                }
            }
            for (frame, value) in data.chunks_mut(channels).zip(&mono) {
                for sample in frame {
                    *sample = T::from_sample(*value);
                }
            }
        },
        |err| warn!(error = %err, "audio stream error"),
        None,
    )
}
