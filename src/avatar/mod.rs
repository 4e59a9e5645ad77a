//! Avatar parameter/motion abstraction.
//!
//! The rendering and model-loading library is an external collaborator;
//! this module defines the control contract the animation core needs from
//! it: named continuous parameters with legal ranges, and named motion
//! groups of pre-authored clips.

mod surface;

pub use surface::{
    AvatarSurface, ModelSurface, MotionClip, MotionGroup, MotionPriority, ParameterSpec,
    StartedMotion,
};

/// Canonical parameter identifiers (Live2D naming).
pub mod param_ids {
    /// Mouth openness, 0..1. Written by exactly one lip-sync driver at a time.
    pub const MOUTH_OPEN: &str = "ParamMouthOpenY";
    /// Head yaw. Offset by the expressive overlay.
    pub const ANGLE_X: &str = "ParamAngleX";
    /// Head tilt. Written by the idle loop.
    pub const ANGLE_Z: &str = "ParamAngleZ";
    /// Left eye openness.
    pub const EYE_L_OPEN: &str = "ParamEyeLOpen";
    /// Right eye openness.
    pub const EYE_R_OPEN: &str = "ParamEyeROpen";
    /// Breathing sway. Written by the idle loop.
    pub const BODY_ANGLE_X: &str = "ParamBodyAngleX";
    /// Left brow height. Offset by the expressive overlay.
    pub const BROW_L_Y: &str = "ParamBrowLY";
    /// Vertical screen offset of the whole model. Offset by the overlay.
    pub const POSITION_Y: &str = "ModelPositionY";
}
