//! Streaming speech pipeline
//!
//! This crate provides the real-time audio/interruption pipeline:
//! - Streaming text segmentation at punctuation boundaries
//! - Inline emotion-tag extraction with motion resolution
//! - Speech-synthesis queueing with measured audio durations
//! - Playback scheduling with per-utterance emotion timelines
//! - Voice-activity monitoring with pre-roll and silence debounce
//! - Barge-in coordination with generation-stamped cancellation
//!
//! The [`SpeechPipeline`] owns its queues, workers, and the interrupt
//! signal; nothing lives in ambient global state.

pub mod asr;
pub mod orchestrator;
pub mod playback;
pub mod processors;
pub mod queue;
pub mod tts;
pub mod vad;

// Orchestrator exports
pub use orchestrator::{BargeInCoordinator, PipelineHandles, SpeechPipeline};

// Processor exports
pub use processors::{Segmenter, TagExtractor};

// Worker exports
pub use playback::{compute_timeline, EmotionScheduler, MotionCue, PlaybackState};
pub use queue::DrainQueue;

// Service client exports
pub use asr::HttpRecognizer;
pub use tts::HttpSynthesizer;
pub use vad::{TcpVadClient, VoiceMonitor};
