//! Remote synthesis provider (tier 1).
//!
//! Posts `{text, voice, pitch, speed}` JSON to the configured endpoint and
//! decodes the returned mp3/wav payload. Any transport failure, non-2xx
//! status, or non-audio payload is `SynthesisUnavailable` so the
//! orchestrator can fall to the next tier.

use crate::audio::{DecodedAudio, decode_bytes};
use crate::config::SynthesisConfig;
use crate::error::{AnimError, Result};
use crate::synth::{Synthesizer, VoiceOptions};
use std::time::Duration;
use tracing::debug;

/// HTTP client for the remote synthesis endpoint.
pub struct RemoteSynthesizer {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteSynthesizer {
    /// Build a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns a config error if the HTTP client cannot be constructed.
    pub fn new(config: &SynthesisConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AnimError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

/// Strip characters the synthesis backend rejects, keeping letters (any
/// script), digits, whitespace and basic punctuation.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| {
            c.is_alphanumeric()
                || c.is_whitespace()
                || matches!(c, '.' | ',' | '!' | '?' | '-' | '！' | '？' | '。' | '，')
        })
        .collect()
}

#[async_trait::async_trait]
impl Synthesizer for RemoteSynthesizer {
    async fn synthesize(&self, text: &str, options: &VoiceOptions) -> Result<DecodedAudio> {
        let body = serde_json::json!({
            "text": sanitize_text(text),
            "voice": options.provider_language(),
            "pitch": options.pitch,
            "speed": options.speed,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnimError::SynthesisUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnimError::SynthesisUnavailable(format!(
                "endpoint returned {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned();
        if !content_type.starts_with("audio/") {
            return Err(AnimError::SynthesisUnavailable(format!(
                "non-audio payload ({content_type})"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AnimError::SynthesisUnavailable(format!("body read failed: {e}")))?;
        debug!("remote synthesis returned {} bytes", bytes.len());

        // A payload that claims to be audio but fails to decode is still a
        // provider fault; map it so the chain can continue.
        decode_bytes(bytes.to_vec())
            .map_err(|e| AnimError::SynthesisUnavailable(format!("undecodable payload: {e}")))
    }
}
