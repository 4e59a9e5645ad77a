//! Shared test doubles for the animation drivers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::avatar::{AvatarSurface, MotionGroup, MotionPriority, StartedMotion};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

/// An [`AvatarSurface`] that accepts writes to any id without clamping and
/// counts every write, so tests can assert exact values and prove that a
/// stopped driver goes quiet.
pub struct RecordingSurface {
    params: Mutex<HashMap<String, f32>>,
    groups: Vec<MotionGroup>,
    motions: Mutex<Vec<StartedMotion>>,
    writes: AtomicUsize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::with_groups(vec![])
    }

    pub fn with_groups(groups: Vec<MotionGroup>) -> Self {
        Self {
            params: Mutex::new(HashMap::new()),
            groups,
            motions: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Total parameter writes observed so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// All motion playback requests, in order.
    pub fn started_motions(&self) -> Vec<StartedMotion> {
        self.motions.lock().unwrap().clone()
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl AvatarSurface for RecordingSurface {
    fn set_parameter(&self, id: &str, value: f32) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.params.lock().unwrap().insert(id.to_owned(), value);
    }

    fn parameters(&self, ids: &[&str]) -> HashMap<String, f32> {
        let params = self.params.lock().unwrap();
        ids.iter()
            .filter_map(|id| params.get(*id).map(|v| ((*id).to_owned(), *v)))
            .collect()
    }

    fn motion_groups(&self) -> Vec<MotionGroup> {
        self.groups.clone()
    }

    fn start_motion(&self, group: &str, clip_index: usize, priority: MotionPriority) {
        self.motions.lock().unwrap().push(StartedMotion {
            group: group.to_owned(),
            clip_index,
            priority,
        });
    }
}

/// A [`RecordingSurface`] wrapper that blocks inside the first write to one
/// target parameter, signalling the test when it has entered. Used to pin a
/// driver mid-write and race a `stop()`/`suspend()` call against it.
pub struct StallingSurface {
    inner: RecordingSurface,
    target: &'static str,
    entered: mpsc::Sender<()>,
    stalled: AtomicBool,
    stall: Duration,
}

impl StallingSurface {
    pub fn new(target: &'static str, stall: Duration) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (entered, rx) = mpsc::channel();
        (
            Arc::new(Self {
                inner: RecordingSurface::new(),
                target,
                entered,
                stalled: AtomicBool::new(false),
                stall,
            }),
            rx,
        )
    }

    pub fn write_count(&self) -> usize {
        self.inner.write_count()
    }
}

impl AvatarSurface for StallingSurface {
    fn set_parameter(&self, id: &str, value: f32) {
        if id == self.target && !self.stalled.swap(true, Ordering::SeqCst) {
            let _ = self.entered.send(());
            std::thread::sleep(self.stall);
        }
        self.inner.set_parameter(id, value);
    }

    fn parameters(&self, ids: &[&str]) -> HashMap<String, f32> {
        self.inner.parameters(ids)
    }

    fn motion_groups(&self) -> Vec<MotionGroup> {
        self.inner.motion_groups()
    }

    fn start_motion(&self, group: &str, clip_index: usize, priority: MotionPriority) {
        self.inner.start_motion(group, clip_index, priority);
    }
}
