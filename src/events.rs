//! Events emitted by the animation core for UI and observability.
//!
//! Intentionally lightweight (no heavy payloads) so the per-frame loops
//! can emit events without blocking.

use crate::orchestrator::AnimationState;
use crate::synth::SynthesisTier;
use uuid::Uuid;

/// Events that describe what the animator is doing "right now".
#[derive(Debug, Clone)]
pub enum AnimatorEvent {
    /// The orchestrator state machine transitioned.
    State { state: AnimationState },
    /// A speech session entered `Speaking`, with the provider tier that won.
    SpeechStart {
        session_id: Uuid,
        tier: SynthesisTier,
    },
    /// A speech session ended (naturally, by error, or superseded).
    SpeechEnd { session_id: Uuid, interrupted: bool },
    /// The audio output reported an error after playback started.
    ///
    /// Surfaced once per session so a frontend can show a notice.
    PlaybackError { session_id: Uuid, message: String },
    /// Best-effort mouth-open level while speaking.
    ///
    /// Mirrors the value written to the mouth parameter, for frontends
    /// that render their own meters.
    MouthLevel { value: f32 },
}
