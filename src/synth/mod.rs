//! Speech synthesis provider chain contracts.
//!
//! Three tiers, tried in order by the orchestrator:
//! 1. **Remote** — network synthesis ([`RemoteSynthesizer`]).
//! 2. **Local** — an embedded speech engine with start/end events
//!    ([`LocalSpeechEngine`]).
//! 3. **Silent** — no audio at all; the synthetic lip-sync driver runs on
//!    a fixed timeout.

pub mod local;
pub mod remote;

pub use local::{LocalSpeechEngine, LocalUtterance, UtteranceEvent};
pub use remote::RemoteSynthesizer;

use crate::audio::DecodedAudio;
use crate::error::Result;

/// Which provider tier produced a speaking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisTier {
    /// Remote network synthesis with tappable audio.
    Remote,
    /// Local speech engine (start/end events, no tappable signal).
    Local,
    /// No synthesis at all; fixed-timeout mouth animation only.
    Silent,
}

/// Voice options forwarded to synthesis providers.
#[derive(Debug, Clone)]
pub struct VoiceOptions {
    /// Voice / language code as configured (e.g. "ja", "en-US", "zh-CN").
    pub voice: String,
    /// Pitch multiplier (1.0 = unchanged).
    pub pitch: f32,
    /// Speed multiplier (1.0 = unchanged).
    pub speed: f32,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self {
            voice: "ja".to_owned(),
            pitch: 1.0,
            speed: 1.0,
        }
    }
}

impl VoiceOptions {
    /// Map extended language codes to the short codes providers accept.
    pub fn provider_language(&self) -> &str {
        match self.voice.as_str() {
            "ja-JP" => "ja",
            "en-US" | "en-GB" => "en",
            "zh" => "zh-CN",
            other => other,
        }
    }
}

/// A synthesis provider that resolves text to a playable audio stream.
#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` into decoded audio.
    ///
    /// # Errors
    ///
    /// [`crate::error::AnimError::SynthesisUnavailable`] when the provider
    /// is unreachable or returns a non-audio payload, so the caller can
    /// fall to the next tier.
    async fn synthesize(&self, text: &str, options: &VoiceOptions) -> Result<DecodedAudio>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_code_mapping() {
        let mut opts = VoiceOptions::default();
        assert_eq!(opts.provider_language(), "ja");
        opts.voice = "ja-JP".to_owned();
        assert_eq!(opts.provider_language(), "ja");
        opts.voice = "en-US".to_owned();
        assert_eq!(opts.provider_language(), "en");
        opts.voice = "zh".to_owned();
        assert_eq!(opts.provider_language(), "zh-CN");
        opts.voice = "zh-CN".to_owned();
        assert_eq!(opts.provider_language(), "zh-CN");
    }
}
