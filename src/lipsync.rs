//! Lip-sync drivers: amplitude-driven and synthetic oscillator.
//!
//! Two strategies behind one handle type, selected by the orchestrator
//! based on which audio signal is available:
//! - **Amplitude**: RMS over a tap window of the samples actually being
//!   played, mapped to mouth openness.
//! - **Synthetic**: fixed-frequency oscillator for streams that cannot be
//!   tapped (local speech engines, or no audio at all).
//!
//! Both write `ParamMouthOpenY` on a timer task and guarantee a terminal
//! write of 0 — either on natural completion or through the handle's
//! synchronous [`LipSyncHandle::stop`]. A per-driver gate serializes each
//! frame's cancelled-check-and-write against `stop()`, so even on a
//! multi-threaded runtime the terminal 0 is the last mouth value and a
//! superseded driver can never dirty the mouth after its successor starts.

use crate::audio::AudioTap;
use crate::avatar::{AvatarSurface, param_ids};
use crate::config::LipSyncConfig;
use crate::events::AnimatorEvent;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Map an analysis window to a mouth-open value.
///
/// Samples are already centred in [-1, 1], so RMS over the window is the
/// signal energy; `clamp(rms * gain + bias, 0, 1)` keeps silence near the
/// bias floor and loud speech near 1.
pub fn mouth_level(window: &[f32], gain: f32, bias: f32) -> f32 {
    (rms(window) * gain + bias).clamp(0.0, 1.0)
}

/// Oscillator mouth value for streams without an analyzable signal.
pub fn synthetic_level(elapsed_ms: f32) -> f32 {
    0.3 + 0.7 * (elapsed_ms / 120.0).sin().abs()
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// How long a synthetic driver runs.
#[derive(Debug, Clone, Copy)]
pub enum SyntheticBound {
    /// Stop (and write 0) after a fixed duration.
    Duration(Duration),
    /// Run until explicitly stopped, bounded by external start/end events.
    External,
}

/// Handle to a running lip-sync task.
pub struct LipSyncHandle {
    cancel: CancellationToken,
    surface: Arc<dyn AvatarSurface>,
    gate: Arc<Mutex<()>>,
}

impl LipSyncHandle {
    /// Stop the driver and reset the mouth to closed.
    ///
    /// The terminal write happens here, synchronously. Taking the gate
    /// first waits out a frame write already in flight, so the 0 always
    /// lands last; the loop exits on its cancelled token without writing
    /// again.
    pub fn stop(&self) {
        let Ok(_gate) = self.gate.lock() else {
            return;
        };
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            self.surface.set_parameter(param_ids::MOUTH_OPEN, 0.0);
        }
    }

    /// Whether the driver has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Start the amplitude-driven mouth loop over `tap`.
///
/// Runs until stopped. Each frame reads the most recent tap window,
/// computes the mouth level, and writes it; the optional `events` sender
/// mirrors the level for external UIs.
pub fn spawn_amplitude(
    surface: Arc<dyn AvatarSurface>,
    tap: AudioTap,
    config: &LipSyncConfig,
    events: Option<broadcast::Sender<AnimatorEvent>>,
) -> LipSyncHandle {
    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();
    let loop_surface = Arc::clone(&surface);
    let gate = Arc::new(Mutex::new(()));
    let loop_gate = Arc::clone(&gate);
    let gain = config.gain;
    let bias = config.bias;
    let frame = Duration::from_millis(config.frame_interval_ms);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(frame);
        loop {
            tokio::select! {
                () = loop_cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // Check and write under the gate so stop() cannot slip
                    // its terminal 0 in between them.
                    let Ok(_gate) = loop_gate.lock() else { break; };
                    if loop_cancel.is_cancelled() {
                        break;
                    }
                    let level = mouth_level(&tap.window(), gain, bias);
                    loop_surface.set_parameter(param_ids::MOUTH_OPEN, level);
                    if let Some(tx) = &events {
                        let _ = tx.send(AnimatorEvent::MouthLevel { value: level });
                    }
                }
            }
        }
    });

    LipSyncHandle {
        cancel,
        surface,
        gate,
    }
}

/// Start the synthetic oscillator mouth loop.
///
/// With [`SyntheticBound::Duration`] the loop writes its own terminal 0
/// when the bound elapses; with [`SyntheticBound::External`] the caller
/// stops it from the speech engine's end event.
pub fn spawn_synthetic(
    surface: Arc<dyn AvatarSurface>,
    config: &LipSyncConfig,
    bound: SyntheticBound,
    events: Option<broadcast::Sender<AnimatorEvent>>,
) -> LipSyncHandle {
    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();
    let loop_surface = Arc::clone(&surface);
    let gate = Arc::new(Mutex::new(()));
    let loop_gate = Arc::clone(&gate);
    let cadence = Duration::from_millis(config.synthetic_interval_ms);

    tokio::spawn(async move {
        let start = tokio::time::Instant::now();
        let mut ticker = tokio::time::interval(cadence);
        loop {
            tokio::select! {
                () = loop_cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let Ok(_gate) = loop_gate.lock() else { break; };
                    if loop_cancel.is_cancelled() {
                        break;
                    }
                    if let SyntheticBound::Duration(limit) = bound
                        && start.elapsed() >= limit
                    {
                        loop_surface.set_parameter(param_ids::MOUTH_OPEN, 0.0);
                        break;
                    }
                    let level = synthetic_level(start.elapsed().as_secs_f32() * 1000.0);
                    loop_surface.set_parameter(param_ids::MOUTH_OPEN, level);
                    if let Some(tx) = &events {
                        let _ = tx.send(AnimatorEvent::MouthLevel { value: level });
                    }
                }
            }
        }
    });

    LipSyncHandle {
        cancel,
        surface,
        gate,
    }
}
