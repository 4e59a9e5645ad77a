//! Haru: real-time animation core for a speaking desktop avatar.
//!
//! Turns a synthesized reply into a coordinated performance:
//! Reply text → intent → motion + expressive overlay, while the audio
//! amplitude drives the mouth frame by frame.
//!
//! # Architecture
//!
//! Independent timer tasks write to a shared [`avatar::AvatarSurface`]:
//! - **Lip sync**: RMS over the playback tap, or a synthetic oscillator
//!   when the audio cannot be tapped
//! - **Intent**: keyword classification of the reply text
//! - **Motion**: intent-matched motion group on whatever asset is loaded
//! - **Overlay**: bounded sway/brow offsets around captured baselines
//! - **Idle**: breathing/blink loop whenever nothing is speaking
//! - **Orchestrator**: one session at a time over a three-tier synthesis
//!   fallback chain (remote → local engine → silent)

pub mod audio;
pub mod avatar;
pub mod config;
pub mod error;
pub mod events;
pub mod idle;
pub mod intent;
pub mod lipsync;
pub mod motion;
pub mod orchestrator;
pub mod overlay;
pub mod session;
pub mod synth;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::AnimatorConfig;
pub use error::{AnimError, Result};
pub use events::AnimatorEvent;
pub use intent::Intent;
pub use orchestrator::{AnimationState, SpeechOrchestrator};
pub use session::SpeechSession;
