//! Pipeline data model
//!
//! Items flow strictly forward: the segmenter emits [`TextUnit`]s, the tag
//! extractor turns each into a [`SyncData`], the synthesis worker turns each
//! of those into a [`PlayableItem`]. Every stage-crossing item is stamped
//! with the generation it was created under so in-flight work can be
//! discarded after an interrupt (see [`crate::InterruptSignal`]).

use std::time::Instant;

use crate::Generation;

/// One sentence-like unit emitted by the segmenter
///
/// Immutable once created. Units are emitted in strict arrival order and a
/// unit is never split across two emissions.
#[derive(Debug, Clone)]
pub struct TextUnit {
    /// Raw text including any inline emotion markers
    pub raw_text: String,
    /// When the boundary was crossed (or the flush forced)
    pub created_at: Instant,
}

impl TextUnit {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            created_at: Instant::now(),
        }
    }
}

/// One inline emotion marker, resolved at extraction time
///
/// `position` is a character offset into the clean text (the text with all
/// recognized marker spans removed). Positions are monotonically
/// non-decreasing in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionMarker {
    /// Character offset into the clean text
    pub position: usize,
    /// The emotion label as written in the marker, e.g. "开心"
    pub emotion: String,
    /// Avatar motion index, chosen uniformly among the label's candidates
    pub motion_index: usize,
    /// Motion file the index was resolved from
    pub motion_file: String,
}

/// Output of the tag extractor for one text unit
///
/// Consumed exactly once by the synthesis worker. `emotion_markers` is empty
/// (never absent) for units without recognized markers, so downstream code
/// has a single path.
#[derive(Debug, Clone)]
pub struct SyncData {
    /// The unit's text as emitted by the segmenter
    pub original_text: String,
    /// Text with recognized marker spans removed; what gets synthesized
    pub clean_text: String,
    /// Recognized markers with clean-text character offsets
    pub emotion_markers: Vec<EmotionMarker>,
    /// Generation this unit was enqueued under
    pub generation: Generation,
}

/// A synthesized utterance ready for playback
///
/// Consumed exactly once by the playback worker. `audio_duration` is
/// measured by decoding the synthesized container's frame count and sample
/// rate, never estimated from text length.
#[derive(Debug, Clone)]
pub struct PlayableItem {
    /// Synthesized audio, a WAV container
    pub audio: Vec<u8>,
    /// The text that was synthesized
    pub clean_text: String,
    /// Markers carried over from the sync data
    pub emotion_markers: Vec<EmotionMarker>,
    /// Measured audio duration in seconds
    pub audio_duration: f64,
    /// Generation inherited from the sync data
    pub generation: Generation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_unit_keeps_raw_text() {
        let unit = TextUnit::new("你好，");
        assert_eq!(unit.raw_text, "你好，");
    }

    #[test]
    fn test_sync_data_without_markers_has_empty_list() {
        let data = SyncData {
            original_text: "hello.".into(),
            clean_text: "hello.".into(),
            emotion_markers: Vec::new(),
            generation: 0,
        };
        assert!(data.emotion_markers.is_empty());
        assert_eq!(data.original_text, data.clean_text);
    }
}
