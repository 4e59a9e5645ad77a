//! Shared ring of recently played audio samples.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Bounded ring of the most recent output samples.
///
/// The playback callback pushes the frames it writes to the device; the
/// amplitude lip-sync driver reads a fixed-size window once per animation
/// frame. Exactly one tap exists per playing stream; dropping all clones
/// releases it.
#[derive(Clone)]
pub struct AudioTap {
    inner: Arc<Mutex<VecDeque<f32>>>,
    window_size: usize,
}

impl AudioTap {
    /// Create a tap holding at most `window_size` samples.
    pub fn new(window_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(window_size))),
            window_size,
        }
    }

    /// Append played samples, discarding the oldest beyond the window.
    pub fn push(&self, samples: &[f32]) {
        let Ok(mut ring) = self.inner.lock() else {
            return;
        };
        for &s in samples {
            if ring.len() == self.window_size {
                ring.pop_front();
            }
            ring.push_back(s);
        }
    }

    /// Snapshot of the current window (may be shorter than `window_size`
    /// before the ring fills).
    pub fn window(&self) -> Vec<f32> {
        self.inner
            .lock()
            .map(|ring| ring.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Configured window size in samples.
    pub fn window_size(&self) -> usize {
        self.window_size
    }
}
