//! Idle breathing/blink/head-tilt loop.
//!
//! Runs whenever the avatar is not speaking. The loop and the
//! speaking-time writers (lip sync + overlay) share parameters, so the
//! orchestrator suspends this loop for the whole of a speaking session;
//! while suspended the task parks on its watch channel and writes nothing.

use crate::avatar::{AvatarSurface, param_ids};
use crate::config::IdleConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Handle to the idle animation task.
pub struct IdleAnimator {
    enabled: watch::Sender<bool>,
    cancel: CancellationToken,
    gate: Arc<Mutex<()>>,
}

impl IdleAnimator {
    /// Spawn the idle loop, initially running.
    pub fn spawn(surface: Arc<dyn AvatarSurface>, config: &IdleConfig) -> Self {
        let (enabled_tx, mut enabled_rx) = watch::channel(true);
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let gate = Arc::new(Mutex::new(()));
        let loop_gate = Arc::clone(&gate);
        let frame = Duration::from_millis(config.frame_interval_ms);

        tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            let mut ticker = tokio::time::interval(frame);
            loop {
                tokio::select! {
                    () = loop_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        // Park while suspended; no writes until resumed.
                        while !*enabled_rx.borrow() {
                            tokio::select! {
                                () = loop_cancel.cancelled() => return,
                                changed = enabled_rx.changed() => {
                                    if changed.is_err() {
                                        return;
                                    }
                                }
                            }
                        }
                        // Re-check the flag under the gate so suspend() can
                        // wait out a tick already past the park above.
                        let Ok(_gate) = loop_gate.lock() else { return; };
                        if loop_cancel.is_cancelled() || !*enabled_rx.borrow() {
                            continue;
                        }
                        let t = start.elapsed().as_secs_f32();
                        surface.set_parameter(param_ids::BODY_ANGLE_X, 5.0 * (0.7 * t).sin());
                        surface.set_parameter(param_ids::ANGLE_Z, 5.0 * (0.5 * t + 1.0).sin());
                        let blink = 1.0 - (2.2 * t).sin().abs();
                        surface.set_parameter(param_ids::EYE_L_OPEN, blink);
                        surface.set_parameter(param_ids::EYE_R_OPEN, blink);
                    }
                }
            }
        });

        Self {
            enabled: enabled_tx,
            cancel,
            gate,
        }
    }

    /// Suspend the loop. Synchronous: waits out a tick that is already
    /// mid-write, so no idle write can land after this returns.
    pub fn suspend(&self) {
        let _ = self.enabled.send(false);
        let _gate = self.gate.lock();
    }

    /// Resume the loop.
    pub fn resume(&self) {
        let _ = self.enabled.send(true);
    }

    /// Whether the loop is currently suspended.
    pub fn is_suspended(&self) -> bool {
        !*self.enabled.borrow()
    }

    /// Stop the task permanently.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::test_utils::{RecordingSurface, StallingSurface};

    #[tokio::test(start_paused = true)]
    async fn writes_breath_tilt_and_blink() {
        let surface = Arc::new(RecordingSurface::new());
        let idle = IdleAnimator::spawn(
            Arc::clone(&surface) as Arc<dyn AvatarSurface>,
            &IdleConfig::default(),
        );
        tokio::time::sleep(Duration::from_millis(500)).await;

        for id in [
            param_ids::BODY_ANGLE_X,
            param_ids::ANGLE_Z,
            param_ids::EYE_L_OPEN,
            param_ids::EYE_R_OPEN,
        ] {
            assert!(surface.parameter(id).is_some(), "missing write to {id}");
        }
        let blink = surface.parameter(param_ids::EYE_L_OPEN).unwrap();
        assert!((0.0..=1.0).contains(&blink));
        idle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn suspended_loop_writes_nothing() {
        let surface = Arc::new(RecordingSurface::new());
        let idle = IdleAnimator::spawn(
            Arc::clone(&surface) as Arc<dyn AvatarSurface>,
            &IdleConfig::default(),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;

        idle.suspend();
        let writes_when_suspended = surface.write_count();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(surface.write_count(), writes_when_suspended);

        idle.resume();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(surface.write_count() > writes_when_suspended);
        idle.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn suspend_waits_out_an_in_flight_tick() {
        let (surface, entered) =
            StallingSurface::new(param_ids::BODY_ANGLE_X, Duration::from_millis(100));
        let idle = IdleAnimator::spawn(
            Arc::clone(&surface) as Arc<dyn AvatarSurface>,
            &IdleConfig::default(),
        );

        entered.recv_timeout(Duration::from_secs(2)).unwrap();
        idle.suspend();

        // The stalled tick finished before suspend() returned; nothing
        // writes after it.
        let writes = surface.write_count();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(surface.write_count(), writes);
        idle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_writes() {
        let surface = Arc::new(RecordingSurface::new());
        let idle = IdleAnimator::spawn(
            Arc::clone(&surface) as Arc<dyn AvatarSurface>,
            &IdleConfig::default(),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        idle.shutdown();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let writes = surface.write_count();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(surface.write_count(), writes);
    }
}
