//! Traits for external collaborators
//!
//! The pipeline treats the synthesis, recognition, and voice-activity
//! services plus the avatar engine and the audio device as collaborators
//! behind these seams. Concrete clients live in the pipeline crate; tests
//! substitute stubs.

mod avatar;
mod speech;

pub use avatar::{AudioSink, AvatarController, NoopAvatar};
pub use speech::{SpeechRecognizer, SpeechSynthesizer, VadVerdict, VoiceActivityService};
