//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// External service endpoints
    #[serde(default)]
    pub services: ServiceEndpoints,

    /// Text segmentation configuration
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Voice monitor configuration
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Path to the emotion→motion registry JSON
    #[serde(default = "default_emotion_config_path")]
    pub emotion_config_path: String,

    /// Language passed to the synthesis service
    #[serde(default = "default_language")]
    pub language: String,
}

/// External service endpoints and timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    /// Base URL of the speech-synthesis service
    #[serde(default = "default_synthesis_url")]
    pub synthesis_url: String,

    /// Base URL of the speech-recognition service
    #[serde(default = "default_recognition_url")]
    pub recognition_url: String,

    /// Address of the voice-activity service (persistent TCP channel)
    #[serde(default = "default_vad_addr")]
    pub vad_addr: String,

    /// Request timeout for synthesis and recognition calls (ms)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Per-frame round-trip timeout for the voice-activity service (ms)
    #[serde(default = "default_vad_timeout_ms")]
    pub vad_timeout_ms: u64,
}

fn default_synthesis_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_recognition_url() -> String {
    "http://127.0.0.1:1000/v1".to_string()
}

fn default_vad_addr() -> String {
    "127.0.0.1:9400".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_vad_timeout_ms() -> u64 {
    10_000
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            synthesis_url: default_synthesis_url(),
            recognition_url: default_recognition_url(),
            vad_addr: default_vad_addr(),
            request_timeout_ms: default_request_timeout_ms(),
            vad_timeout_ms: default_vad_timeout_ms(),
        }
    }
}

/// Text segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Characters that close a sentence-like unit
    #[serde(default = "default_punctuation")]
    pub punctuation: Vec<char>,
}

fn default_punctuation() -> Vec<char> {
    vec!['，', ',', '。', '！', '!', '？', '?']
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            punctuation: default_punctuation(),
        }
    }
}

/// Voice monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Capture sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Samples per frame sent to the voice-activity service
    #[serde(default = "default_frame_samples")]
    pub frame_samples: usize,

    /// Rolling pre-roll kept ahead of speech onset (ms)
    #[serde(default = "default_pre_roll_ms")]
    pub pre_roll_ms: u64,

    /// Silence duration that finalizes a recording session (ms)
    #[serde(default = "default_silence_debounce_ms")]
    pub silence_debounce_ms: u64,
}

fn default_sample_rate() -> u32 {
    16_000
}

fn default_frame_samples() -> usize {
    512
}

fn default_pre_roll_ms() -> u64 {
    1_000
}

fn default_silence_debounce_ms() -> u64 {
    500
}

impl MonitorConfig {
    /// Number of pre-roll frames implied by the pre-roll window
    pub fn pre_roll_frames(&self) -> usize {
        let samples = self.sample_rate as u64 * self.pre_roll_ms / 1000;
        (samples as usize).div_ceil(self.frame_samples).max(1)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frame_samples: default_frame_samples(),
            pre_roll_ms: default_pre_roll_ms(),
            silence_debounce_ms: default_silence_debounce_ms(),
        }
    }
}

fn default_emotion_config_path() -> String {
    "config/emotion_actions.json".to_string()
}

fn default_language() -> String {
    "zh".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            services: ServiceEndpoints::default(),
            segmenter: SegmenterConfig::default(),
            monitor: MonitorConfig::default(),
            emotion_config_path: default_emotion_config_path(),
            language: default_language(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segmenter.punctuation.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "segmenter.punctuation".into(),
                message: "at least one boundary character is required".into(),
            });
        }
        if self.monitor.frame_samples == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.frame_samples".into(),
                message: "must be non-zero".into(),
            });
        }
        if self.monitor.sample_rate == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.sample_rate".into(),
                message: "must be non-zero".into(),
            });
        }
        Ok(())
    }
}

/// Load settings from config files and the environment
///
/// Priority: env vars > config/{env}.json > config/default.json > defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("AVATAR_VOICE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
