//! Parameter surface contract and the in-memory reference implementation.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::trace;

/// Priority levels for motion playback.
///
/// `Normal` is used for intent-selected speech motions; interaction layers
/// (e.g. pointer-hit reactions) request `Force` to preempt them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MotionPriority {
    /// Background motions, preempted by anything.
    Idle,
    /// Speech-triggered motions.
    Normal,
    /// Interaction reactions; preempts `Normal`.
    Force,
}

/// One pre-authored animation clip inside a motion group.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionClip {
    /// Approximate clip duration in ms (as reported by the asset).
    pub duration_ms: u64,
}

/// A named, ordered group of motion clips supplied by the avatar asset.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionGroup {
    pub name: String,
    pub clips: Vec<MotionClip>,
}

/// Declaration of a continuous parameter: identifier, default, legal range.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub id: String,
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

impl ParameterSpec {
    /// Shorthand for a parameter with an explicit range.
    pub fn new(id: impl Into<String>, default: f32, min: f32, max: f32) -> Self {
        Self {
            id: id.into(),
            default,
            min,
            max,
        }
    }
}

/// A motion playback request observed by the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct StartedMotion {
    pub group: String,
    pub clip_index: usize,
    pub priority: MotionPriority,
}

/// Control surface an avatar asset exposes to the animation core.
///
/// This surface has no internal timing: it is a pure sink/source invoked
/// by every driver. All writes are synchronous and last-write-wins.
pub trait AvatarSurface: Send + Sync {
    /// Set a parameter, clamping to its legal range and applying
    /// immediately. Writing an unknown id is a no-op.
    fn set_parameter(&self, id: &str, value: f32);

    /// Current values for a batch of ids. Unknown ids are silently omitted.
    fn parameters(&self, ids: &[&str]) -> HashMap<String, f32>;

    /// Motion groups available on the loaded asset.
    fn motion_groups(&self) -> Vec<MotionGroup>;

    /// Play a clip from a motion group at the given priority.
    fn start_motion(&self, group: &str, clip_index: usize, priority: MotionPriority);

    /// Current value of a single parameter, if it exists.
    fn parameter(&self, id: &str) -> Option<f32> {
        self.parameters(&[id]).get(id).copied()
    }
}

struct ParameterState {
    value: f32,
    min: f32,
    max: f32,
}

/// In-memory [`AvatarSurface`] over a declared parameter table.
///
/// Renderer bridges read the current values out of this surface each frame;
/// tests read them directly.
pub struct ModelSurface {
    params: Mutex<HashMap<String, ParameterState>>,
    groups: Vec<MotionGroup>,
    last_motion: Mutex<Option<StartedMotion>>,
}

impl ModelSurface {
    /// Build a surface from the asset's parameter and motion declarations.
    pub fn new(specs: Vec<ParameterSpec>, groups: Vec<MotionGroup>) -> Self {
        let params = specs
            .into_iter()
            .map(|s| {
                (
                    s.id,
                    ParameterState {
                        value: s.default.clamp(s.min, s.max),
                        min: s.min,
                        max: s.max,
                    },
                )
            })
            .collect();
        Self {
            params: Mutex::new(params),
            groups,
            last_motion: Mutex::new(None),
        }
    }

    /// The most recent motion playback request, if any.
    pub fn last_motion(&self) -> Option<StartedMotion> {
        self.last_motion.lock().ok().and_then(|m| m.clone())
    }
}

impl AvatarSurface for ModelSurface {
    fn set_parameter(&self, id: &str, value: f32) {
        let Ok(mut params) = self.params.lock() else {
            return;
        };
        match params.get_mut(id) {
            Some(p) => p.value = value.clamp(p.min, p.max),
            None => trace!("ignoring write to unknown parameter '{id}'"),
        }
    }

    fn parameters(&self, ids: &[&str]) -> HashMap<String, f32> {
        let Ok(params) = self.params.lock() else {
            return HashMap::new();
        };
        ids.iter()
            .filter_map(|id| params.get(*id).map(|p| ((*id).to_owned(), p.value)))
            .collect()
    }

    fn motion_groups(&self) -> Vec<MotionGroup> {
        self.groups.clone()
    }

    fn start_motion(&self, group: &str, clip_index: usize, priority: MotionPriority) {
        if let Ok(mut last) = self.last_motion.lock() {
            *last = Some(StartedMotion {
                group: group.to_owned(),
                clip_index,
                priority,
            });
        }
    }
}
