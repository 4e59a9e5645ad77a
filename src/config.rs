//! Configuration types for the avatar animation core.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for the animation core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Audio output settings.
    pub audio: AudioConfig,
    /// Lip-sync driver settings (amplitude + synthetic).
    pub lipsync: LipSyncConfig,
    /// Idle breathing/blink loop settings.
    pub idle: IdleConfig,
    /// Expressive overlay settings.
    pub overlay: OverlayConfig,
    /// Speech synthesis provider settings.
    pub synthesis: SynthesisConfig,
}

/// Audio output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output sample rate in Hz.
    pub output_sample_rate: u32,
    /// Output device name (None = system default).
    pub output_device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            output_sample_rate: 24_000,
            output_device: None,
        }
    }
}

/// Lip-sync configuration.
///
/// The amplitude mapping constants were tuned empirically in the original
/// UI; they are exposed here so tests and deployments can pin them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Number of recent samples the amplitude driver analyses per frame.
    pub window_size: usize,
    /// RMS-to-mouth-open gain.
    ///
    /// With gain 3.0 and bias 0.1, silence yields ~0.1 and loud speech
    /// approaches 1.0.
    pub gain: f32,
    /// Mouth-open floor added to the scaled RMS.
    pub bias: f32,
    /// Amplitude driver frame interval in ms (~30 Hz).
    pub frame_interval_ms: u64,
    /// Synthetic oscillator cadence in ms (~25 Hz).
    pub synthetic_interval_ms: u64,
    /// Hard timeout for the silent fallback, in ms.
    ///
    /// Used when no audio signal and no start/end events exist at all.
    pub synthetic_fallback_ms: u64,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            gain: 3.0,
            bias: 0.1,
            frame_interval_ms: 33,
            synthetic_interval_ms: 40,
            synthetic_fallback_ms: 2000,
        }
    }
}

/// Idle animation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Idle loop frame interval in ms (~30 Hz).
    pub frame_interval_ms: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 33,
        }
    }
}

/// Expressive overlay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Number of ticks the overlay runs before restoring baselines.
    pub ticks: u32,
    /// Tick interval in ms. 40 ticks at 33 ms is roughly 1.3 s.
    pub tick_interval_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            ticks: 40,
            tick_interval_ms: 33,
        }
    }
}

/// Speech synthesis provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Remote synthesis endpoint. Receives `{text, voice, pitch, speed}`
    /// JSON and returns an audio payload.
    pub endpoint: String,
    /// Requested voice / language code (e.g. "ja", "en-US", "zh-CN").
    pub voice: String,
    /// Pitch multiplier (1.0 = unchanged).
    pub pitch: f32,
    /// Speed multiplier (1.0 = unchanged).
    pub speed: f32,
    /// Remote request timeout in ms.
    pub request_timeout_ms: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/api/tts".to_owned(),
            voice: "ja".to_owned(),
            pitch: 1.0,
            speed: 1.0,
            request_timeout_ms: 10_000,
        }
    }
}

impl AnimatorConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AnimError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AnimError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/haru/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("haru").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("haru")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/haru-config/config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnimatorConfig::default();
        assert!(config.audio.output_sample_rate > 0);
        assert!(config.lipsync.window_size > 0);
        assert!(config.lipsync.gain > 0.0);
        assert!(config.lipsync.bias >= 0.0 && config.lipsync.bias <= 1.0);
        assert!(config.lipsync.frame_interval_ms > 0);
        assert!(config.lipsync.synthetic_fallback_ms > 0);
        assert!(config.idle.frame_interval_ms > 0);
        assert!(config.overlay.ticks > 0);
        assert!(!config.synthesis.endpoint.is_empty());
        assert!(config.synthesis.speed > 0.0);
    }

    #[test]
    fn toml_roundtrip_preserves_values() {
        let mut config = AnimatorConfig::default();
        config.lipsync.gain = 2.5;
        config.overlay.ticks = 60;
        config.synthesis.voice = "zh-CN".to_owned();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        config.save_to_file(&path).unwrap();

        let loaded = AnimatorConfig::from_file(&path).unwrap();
        assert!((loaded.lipsync.gain - 2.5).abs() < f32::EPSILON);
        assert_eq!(loaded.overlay.ticks, 60);
        assert_eq!(loaded.synthesis.voice, "zh-CN");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: AnimatorConfig = toml::from_str("[lipsync]\ngain = 4.0\n").unwrap();
        assert!((parsed.lipsync.gain - 4.0).abs() < f32::EPSILON);
        // Everything else falls back to defaults.
        assert_eq!(parsed.lipsync.window_size, 2048);
        assert_eq!(parsed.overlay.ticks, 40);
    }
}
