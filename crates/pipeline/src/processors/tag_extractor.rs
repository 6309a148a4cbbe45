//! Inline emotion-tag extraction
//!
//! Scans a finished text unit for `<label>` markers in a single
//! left-to-right pass. Recognized labels are stripped from the text and
//! recorded with their character offset in the stripped result; unknown
//! labels pass through as literal text. Motion selection happens here, at
//! extraction time.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use avatar_voice_config::EmotionRegistry;
use avatar_voice_core::{EmotionMarker, Generation, SyncData, TextUnit};

static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([^>]+)>").expect("marker pattern"));

/// Extracts emotion markers from text units
#[derive(Debug, Clone)]
pub struct TagExtractor {
    registry: Arc<EmotionRegistry>,
}

impl TagExtractor {
    pub fn new(registry: Arc<EmotionRegistry>) -> Self {
        Self { registry }
    }

    /// Produce one [`SyncData`] from one unit, stamped with `generation`
    ///
    /// Units with no recognized markers still produce a sync item with an
    /// empty marker list so downstream code has one path. Marker positions
    /// are character offsets into the clean text and come out
    /// non-decreasing because the scan is left to right.
    pub fn extract(&self, unit: &TextUnit, generation: Generation) -> SyncData {
        let text = unit.raw_text.as_str();
        let mut clean = String::new();
        let mut clean_chars = 0usize;
        let mut markers = Vec::new();
        let mut copied_to = 0usize;

        for span in MARKER_RE.find_iter(text) {
            // The delimiters are single-byte, so this slice is the label.
            let label = &text[span.start() + 1..span.end() - 1];

            if !self.registry.is_known(label) {
                // Not in the emotion table: the span stays literal text.
                continue;
            }

            let kept = &text[copied_to..span.start()];
            clean.push_str(kept);
            clean_chars += kept.chars().count();
            copied_to = span.end();

            if let Some(motion) = self.registry.resolve(label) {
                markers.push(EmotionMarker {
                    position: clean_chars,
                    emotion: label.to_string(),
                    motion_index: motion.motion_index,
                    motion_file: motion.motion_file,
                });
            } else {
                tracing::warn!(label, "Emotion label has no usable motion candidate");
            }
        }

        clean.push_str(&text[copied_to..]);

        SyncData {
            original_text: unit.raw_text.clone(),
            clean_text: clean,
            emotion_markers: markers,
            generation,
        }
    }
}
