//! Audio playback to system speakers via cpal.

use crate::audio::decode::DecodedAudio;
use crate::audio::tap::AudioTap;
use crate::config::AudioConfig;
use crate::error::{AnimError, Result};
use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Events emitted by a playing output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// The stream started delivering samples to the device.
    Started,
    /// All samples were delivered and the queue drained.
    Finished,
    /// Playback was stopped before draining.
    Stopped,
    /// The device reported an error after playback started.
    Error(String),
}

/// Handle to one playing stream.
pub struct PlaybackHandle {
    stop_tx: crossbeam_channel::Sender<()>,
    tapped: bool,
}

impl PlaybackHandle {
    /// Build a handle around a stop channel.
    pub fn new(stop_tx: crossbeam_channel::Sender<()>, tapped: bool) -> Self {
        Self { stop_tx, tapped }
    }

    /// Whether an amplitude tap was attached to this stream.
    pub fn tapped(&self) -> bool {
        self.tapped
    }

    /// Stop playback. Safe to call more than once.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

/// Something that can play decoded audio and report lifecycle events.
pub trait AudioOutput: Send + Sync {
    /// Start playing `audio`, feeding `tap` (when given) with every frame
    /// written to the device, and reporting lifecycle events on `events`.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be created or started.
    fn play(
        &self,
        audio: &DecodedAudio,
        tap: Option<&AudioTap>,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<PlaybackHandle>;
}

/// Internal buffer for tracking playback progress.
struct PlaybackBuffer {
    samples: Vec<f32>,
    position: usize,
    finished: bool,
}

/// cpal-backed [`AudioOutput`].
///
/// Each `play` call owns its stream on a dedicated thread because
/// `cpal::Stream` cannot cross thread boundaries; the handle signals that
/// thread over a channel.
pub struct CpalPlayback {
    output_device: Option<String>,
    sample_rate: u32,
}

impl CpalPlayback {
    /// Create a new playback instance.
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            output_device: config.output_device.clone(),
            sample_rate: config.output_sample_rate,
        }
    }

    /// List available output devices.
    ///
    /// # Errors
    ///
    /// Returns an error if devices cannot be enumerated.
    pub fn list_output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| AnimError::Audio(format!("cannot enumerate devices: {e}")))?;

        let mut names = Vec::new();
        for device in devices {
            if let Ok(desc) = device.description() {
                names.push(desc.name().to_owned());
            }
        }
        Ok(names)
    }

    fn resolve_device(name: &Option<String>) -> Result<cpal::Device> {
        let host = cpal::default_host();
        if let Some(name) = name {
            host.output_devices()
                .map_err(|e| AnimError::Audio(format!("cannot enumerate devices: {e}")))?
                .find(|d| {
                    d.description()
                        .ok()
                        .map(|desc| desc.name() == name)
                        .unwrap_or(false)
                })
                .ok_or_else(|| AnimError::Audio(format!("output device '{name}' not found")))
        } else {
            host.default_output_device()
                .ok_or_else(|| AnimError::Audio("no default output device".into()))
        }
    }
}

impl AudioOutput for CpalPlayback {
    fn play(
        &self,
        audio: &DecodedAudio,
        tap: Option<&AudioTap>,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<PlaybackHandle> {
        let samples = audio.samples.clone();
        let tap = tap.cloned();
        let tapped = tap.is_some();
        let device_name = self.output_device.clone();
        let sample_rate = self.sample_rate;

        let (stop_tx, stop_rx) = crossbeam_channel::unbounded::<()>();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<std::result::Result<(), String>>(1);

        std::thread::spawn(move || {
            let device = match Self::resolve_device(&device_name) {
                Ok(d) => d,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            if let Ok(desc) = device.description() {
                info!("using output device: {}", desc.name());
            }

            let stream_config = StreamConfig {
                channels: 1,
                sample_rate,
                buffer_size: cpal::BufferSize::Default,
            };

            let buffer = Arc::new(Mutex::new(PlaybackBuffer {
                samples,
                position: 0,
                finished: false,
            }));
            let buffer_cb = Arc::clone(&buffer);
            let events_err = events.clone();

            let stream = device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    let mut buf = match buffer_cb.lock() {
                        Ok(b) => b,
                        Err(_) => return,
                    };
                    for sample in data.iter_mut() {
                        if buf.position < buf.samples.len() {
                            *sample = buf.samples[buf.position];
                            buf.position += 1;
                        } else {
                            *sample = 0.0;
                            buf.finished = true;
                        }
                    }
                    if let Some(ref tap) = tap {
                        tap.push(data);
                    }
                },
                move |err| {
                    error!("audio output stream error: {err}");
                    let _ = events_err.send(PlaybackEvent::Error(err.to_string()));
                },
                None,
            );

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("failed to build output stream: {e}")));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(format!("failed to start output stream: {e}")));
                return;
            }
            let _ = ready_tx.send(Ok(()));
            let _ = events.send(PlaybackEvent::Started);

            loop {
                std::thread::sleep(std::time::Duration::from_millis(10));
                if stop_rx.try_recv().is_ok() {
                    let _ = events.send(PlaybackEvent::Stopped);
                    break;
                }
                let finished = buffer.lock().map(|b| b.finished).unwrap_or(true);
                if finished {
                    let _ = events.send(PlaybackEvent::Finished);
                    break;
                }
            }
            drop(stream);
        });

        ready_rx
            .recv()
            .map_err(|_| AnimError::Playback("playback thread exited during setup".into()))?
            .map_err(AnimError::Playback)?;

        Ok(PlaybackHandle::new(stop_tx, tapped))
    }
}
