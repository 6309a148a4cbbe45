//! Streaming text segmentation
//!
//! Splits an incoming stream of text fragments into sentence-like units at
//! punctuation boundaries. The rolling buffer carries partial units across
//! fragment boundaries, so no unit is ever split across two emissions and
//! concatenating all emitted units (plus a final flush) reproduces the
//! input exactly.

use avatar_voice_config::SegmenterConfig;
use avatar_voice_core::TextUnit;

/// Punctuation-boundary segmenter with a rolling buffer
#[derive(Debug)]
pub struct Segmenter {
    punctuation: Vec<char>,
    buffer: String,
}

impl Segmenter {
    pub fn new(config: &SegmenterConfig) -> Self {
        Self {
            punctuation: config.punctuation.clone(),
            buffer: String::new(),
        }
    }

    /// Append a fragment, emitting one unit per boundary character crossed
    ///
    /// Units are emitted in strict arrival order, each including its
    /// closing punctuation character.
    pub fn feed(&mut self, fragment: &str) -> Vec<TextUnit> {
        let mut units = Vec::new();
        for c in fragment.chars() {
            self.buffer.push(c);
            if self.punctuation.contains(&c) {
                units.push(TextUnit::new(std::mem::take(&mut self.buffer)));
            }
        }
        units
    }

    /// Emit any non-empty remainder as a final unit
    ///
    /// Called when the upstream generator signals completion or after an
    /// interrupt.
    pub fn flush(&mut self) -> Option<TextUnit> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(TextUnit::new(std::mem::take(&mut self.buffer)))
        }
    }

    /// Text buffered but not yet emitted
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Discard any buffered remainder
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
