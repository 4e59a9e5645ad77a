//! Expressive overlay: bounded sway/brow motion layered on top of speech.
//!
//! Runs a fixed number of ticks regardless of how long the audio actually
//! is, offsetting vertical position, head yaw and brow around baselines
//! captured at start. Completion and cancellation both restore the
//! baselines exactly, so repeated or interrupted overlays never drift.

use crate::avatar::{AvatarSurface, param_ids};
use crate::config::OverlayConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
struct Baselines {
    position_y: f32,
    yaw: f32,
    brow: f32,
}

/// Handle to a running overlay.
pub struct OverlayHandle {
    cancel: CancellationToken,
    surface: Arc<dyn AvatarSurface>,
    baselines: Baselines,
    gate: Arc<Mutex<()>>,
}

impl OverlayHandle {
    /// Cancel the overlay and restore the captured baselines.
    ///
    /// Restoration happens here, synchronously, so a superseding session
    /// can capture fresh baselines immediately after. Taking the gate
    /// first waits out a tick already mid-write, so the restore always
    /// lands last. Safe to call on a completed overlay (the restore
    /// writes are idempotent).
    pub fn stop(&self) {
        let Ok(_gate) = self.gate.lock() else {
            return;
        };
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            restore(&self.surface, self.baselines);
        }
    }
}

fn restore(surface: &Arc<dyn AvatarSurface>, b: Baselines) {
    surface.set_parameter(param_ids::POSITION_Y, b.position_y);
    surface.set_parameter(param_ids::ANGLE_X, b.yaw);
    surface.set_parameter(param_ids::BROW_L_Y, b.brow);
}

/// Start the overlay. Baselines are captured from the surface before the
/// task is spawned.
pub fn spawn(surface: Arc<dyn AvatarSurface>, config: &OverlayConfig) -> OverlayHandle {
    let baselines = Baselines {
        position_y: surface.parameter(param_ids::POSITION_Y).unwrap_or(0.0),
        yaw: surface.parameter(param_ids::ANGLE_X).unwrap_or(0.0),
        brow: surface.parameter(param_ids::BROW_L_Y).unwrap_or(0.0),
    };

    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();
    let loop_surface = Arc::clone(&surface);
    let gate = Arc::new(Mutex::new(()));
    let loop_gate = Arc::clone(&gate);
    let ticks = config.ticks;
    let cadence = Duration::from_millis(config.tick_interval_ms);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cadence);
        for tick in 1..=ticks {
            tokio::select! {
                () = loop_cancel.cancelled() => return,
                _ = ticker.tick() => {
                    let Ok(_gate) = loop_gate.lock() else { return; };
                    if loop_cancel.is_cancelled() {
                        return;
                    }
                    let t = tick as f32;
                    loop_surface.set_parameter(
                        param_ids::POSITION_Y,
                        baselines.position_y + 6.0 * (t / 2.0).sin(),
                    );
                    loop_surface.set_parameter(
                        param_ids::ANGLE_X,
                        baselines.yaw + 10.0 * (t / 3.0).sin(),
                    );
                    loop_surface.set_parameter(
                        param_ids::BROW_L_Y,
                        baselines.brow + 0.2 * (t / 4.0).sin(),
                    );
                }
            }
        }
        let Ok(_gate) = loop_gate.lock() else { return; };
        if !loop_cancel.is_cancelled() {
            restore(&loop_surface, baselines);
        }
    });

    OverlayHandle {
        cancel,
        surface,
        baselines,
        gate,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::test_utils::{RecordingSurface, StallingSurface};

    fn surface_with_pose(y: f32, yaw: f32, brow: f32) -> Arc<RecordingSurface> {
        let s = Arc::new(RecordingSurface::new());
        s.set_parameter(param_ids::POSITION_Y, y);
        s.set_parameter(param_ids::ANGLE_X, yaw);
        s.set_parameter(param_ids::BROW_L_Y, brow);
        s
    }

    #[tokio::test(start_paused = true)]
    async fn completion_restores_baselines_exactly() {
        let surface = surface_with_pose(12.0, -4.0, 0.55);
        let config = OverlayConfig::default();
        let _handle = spawn(Arc::clone(&surface) as Arc<dyn AvatarSurface>, &config);

        let total = config.ticks as u64 * config.tick_interval_ms + 100;
        tokio::time::sleep(Duration::from_millis(total)).await;

        assert_eq!(surface.parameter(param_ids::POSITION_Y), Some(12.0));
        assert_eq!(surface.parameter(param_ids::ANGLE_X), Some(-4.0));
        assert_eq!(surface.parameter(param_ids::BROW_L_Y), Some(0.55));
    }

    #[tokio::test(start_paused = true)]
    async fn overlay_actually_moves_parameters() {
        let surface = surface_with_pose(0.0, 0.0, 0.0);
        let config = OverlayConfig::default();
        let _handle = spawn(Arc::clone(&surface) as Arc<dyn AvatarSurface>, &config);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let y = surface.parameter(param_ids::POSITION_Y).unwrap();
        assert!(y.abs() > 0.01, "expected sway offset, got {y}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_restores_baselines_immediately() {
        let surface = surface_with_pose(5.0, 2.0, 0.3);
        let config = OverlayConfig::default();
        let handle = spawn(Arc::clone(&surface) as Arc<dyn AvatarSurface>, &config);

        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.stop();

        assert_eq!(surface.parameter(param_ids::POSITION_Y), Some(5.0));
        assert_eq!(surface.parameter(param_ids::ANGLE_X), Some(2.0));
        assert_eq!(surface.parameter(param_ids::BROW_L_Y), Some(0.3));

        // The cancelled task writes nothing further.
        let writes = surface.write_count();
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(surface.write_count(), writes);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_waits_out_an_in_flight_tick() {
        let (surface, entered) =
            StallingSurface::new(param_ids::POSITION_Y, Duration::from_millis(100));
        let handle = spawn(
            Arc::clone(&surface) as Arc<dyn AvatarSurface>,
            &OverlayConfig::default(),
        );

        entered.recv_timeout(Duration::from_secs(2)).unwrap();
        handle.stop();

        // Baselines (0.0 on the empty surface) are restored after the
        // stalled tick, and nothing writes past the restore.
        assert_eq!(surface.parameter(param_ids::POSITION_Y), Some(0.0));
        assert_eq!(surface.parameter(param_ids::ANGLE_X), Some(0.0));
        let writes = surface.write_count();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(surface.write_count(), writes);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_after_completion_is_harmless() {
        let surface = surface_with_pose(1.0, 1.0, 1.0);
        let config = OverlayConfig::default();
        let handle = spawn(Arc::clone(&surface) as Arc<dyn AvatarSurface>, &config);

        let total = config.ticks as u64 * config.tick_interval_ms + 100;
        tokio::time::sleep(Duration::from_millis(total)).await;
        handle.stop();

        assert_eq!(surface.parameter(param_ids::POSITION_Y), Some(1.0));
    }
}
