//! Error types for the avatar animation core.

/// Top-level error type for the animation/audio-sync core.
#[derive(Debug, thiserror::Error)]
pub enum AnimError {
    /// Remote synthesis provider unreachable or returned a non-audio payload.
    ///
    /// Recovered by falling to the local speech engine (tier 2).
    #[error("synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    /// No local speech-synthesis capability present.
    ///
    /// Recovered by falling to the fixed-timeout synthetic driver (tier 3).
    #[error("synthesis unsupported: {0}")]
    SynthesisUnsupported(String),

    /// Audio output reported an error after playback started.
    ///
    /// Surfaced to the caller once per session and treated as session end.
    #[error("playback error: {0}")]
    Playback(String),

    /// Audio payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Audio device or stream error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AnimError>;
