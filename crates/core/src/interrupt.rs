//! Shared interrupt signal
//!
//! A single atomically readable/writable flag plus a generation counter.
//! The coordinator is the only writer; every worker reads. Items are stamped
//! with the generation current at enqueue time; after an interrupt bumps the
//! counter, stamped items observed by a worker are stale and get discarded
//! instead of producing output.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Generation stamp carried by in-flight pipeline items
pub type Generation = u64;

/// Interrupt flag and generation counter shared by all workers
#[derive(Debug, Default)]
pub struct InterruptSignal {
    interrupted: AtomicBool,
    generation: AtomicU64,
}

impl InterruptSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation; stamp items with this at enqueue time
    pub fn generation(&self) -> Generation {
        self.generation.load(Ordering::Acquire)
    }

    /// True between an interrupt and the start of the next turn
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    /// Whether a stamped item belongs to an older generation
    pub fn is_stale(&self, stamp: Generation) -> bool {
        stamp != self.generation()
    }

    /// Record an interrupt: raise the flag and bump the generation
    ///
    /// Returns the new generation. Safe to call concurrently from multiple
    /// triggers; each call bumps once.
    pub fn interrupt(&self) -> Generation {
        self.interrupted.store(true, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Re-arm for a new turn: clear the interrupted flag
    ///
    /// The generation is left as-is so items from the interrupted turn stay
    /// stale.
    pub fn begin_turn(&self) {
        self.interrupted.store(false, Ordering::Release);
    }
}
