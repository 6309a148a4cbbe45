//! Core traits and types for the avatar voice front-end
//!
//! This crate provides foundational types used across all other crates:
//! - The pipeline data model (text units, sync data, playable items)
//! - The shared interrupt signal and generation counter
//! - Traits for external collaborators (synthesis, recognition, VAD, avatar)
//! - WAV helpers for duration decoding and recording upload
//! - Observability event types
//! - Error types

pub mod audio;
pub mod error;
pub mod events;
pub mod interrupt;
pub mod traits;
pub mod types;

pub use audio::{encode_wav_pcm16, wav_duration_seconds};
pub use error::{Error, Result};
pub use events::SpeechEvent;
pub use interrupt::{Generation, InterruptSignal};
pub use types::{EmotionMarker, PlayableItem, SyncData, TextUnit};

pub use traits::{
    AudioSink, AvatarController, NoopAvatar, SpeechRecognizer, SpeechSynthesizer, VadVerdict,
    VoiceActivityService,
};
