//! Speech service traits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Speech-synthesis service
///
/// One call per clean-text unit. The call is not cancellable once in
/// flight; the synthesis worker discards stale results instead.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// Synthesize text to an audio container (WAV) with decodable duration
    ///
    /// Any transport error or non-success status is a synthesis failure;
    /// the offending unit is dropped and the pipeline continues.
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;
}

/// Speech-recognition service
#[async_trait]
pub trait SpeechRecognizer: Send + Sync + 'static {
    /// Recognize a complete WAV recording, returning the transcript text
    async fn recognize(&self, wav: Vec<u8>) -> Result<String>;
}

/// Per-frame voice-activity verdict
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VadVerdict {
    /// Frame classified as speech
    pub is_speech: bool,
    /// Speech probability reported by the service
    pub probability: f32,
}

/// Voice-activity-detection service
///
/// The client holds a persistent bidirectional channel; one fixed-size mono
/// frame in, one verdict out, in order.
#[async_trait]
pub trait VoiceActivityService: Send + Sync + 'static {
    /// Classify one fixed-size frame (512 samples, 16 kHz, f32 mono)
    async fn classify(&self, frame: &[f32]) -> Result<VadVerdict>;
}
