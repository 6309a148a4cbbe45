//! Synchronous text processors
//!
//! The segmenter and tag extractor run on whichever thread feeds text into
//! the pipeline; neither needs a dedicated worker.

mod segmenter;
mod tag_extractor;

pub use segmenter::Segmenter;
pub use tag_extractor::TagExtractor;
