//! Observability events
//!
//! Events fan out on a broadcast channel owned by the pipeline. Consuming
//! them is optional; the pipeline is correct with no subscriber attached.
//! Events serialize as `{type, payload}` with timestamps inside the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SpeechEvent {
    /// The segmenter emitted a unit and it was queued for synthesis
    SegmentQueued { text: String },

    /// The synthesis worker started a service call
    SynthesisStarted { text: String },

    /// Playback of one utterance began
    PlaybackStarted { text: String, duration: f64 },

    /// Playback of one utterance ran to completion
    PlaybackFinished { text: String },

    /// An emotion cue fired during playback
    EmotionTriggered {
        emotion: String,
        motion_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// Barge-in or explicit stop interrupted the pipeline
    Interrupted { timestamp: DateTime<Utc> },

    /// The voice monitor finalized a recording and recognition returned text
    TranscriptReady { text: String },
}

impl SpeechEvent {
    pub fn emotion_triggered(emotion: impl Into<String>, motion_index: usize) -> Self {
        Self::EmotionTriggered {
            emotion: emotion.into(),
            motion_index,
            timestamp: Utc::now(),
        }
    }

    pub fn interrupted() -> Self {
        Self::Interrupted {
            timestamp: Utc::now(),
        }
    }
}
