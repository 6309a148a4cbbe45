//! Playback worker
//!
//! One long-lived worker pulls playable items in strict FIFO order, arms
//! the emotion scheduler when an item carries markers, hands the audio to
//! the avatar's mouth-sync and to the output device, and blocks until the
//! device finishes or is externally stopped. The single-worker discipline
//! is what guarantees at most one item is active at a time; the device is
//! never locked.

mod emotion_sync;

pub use emotion_sync::{compute_timeline, EmotionScheduler, MotionCue};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use avatar_voice_core::{
    AudioSink, AvatarController, InterruptSignal, PlayableItem, SpeechEvent,
};

use crate::queue::DrainQueue;

/// Shared "audio output in progress" flag
///
/// Written only by the playback worker; read by the voice monitor to decide
/// whether detected speech is a barge-in.
#[derive(Debug, Default)]
pub struct PlaybackState {
    playing: AtomicBool,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn spawn_playback_worker(
    input: Arc<DrainQueue<PlayableItem>>,
    sink: Arc<dyn AudioSink>,
    avatar: Arc<dyn AvatarController>,
    signal: Arc<InterruptSignal>,
    state: Arc<PlaybackState>,
    active_scheduler: Arc<Mutex<Option<EmotionScheduler>>>,
    events: broadcast::Sender<SpeechEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let item = input.pop().await;

            if signal.is_stale(item.generation) {
                tracing::trace!(text = %item.clean_text, "Dropping stale playable item");
                continue;
            }

            let _ = events.send(SpeechEvent::PlaybackStarted {
                text: item.clean_text.clone(),
                duration: item.audio_duration,
            });

            if !item.emotion_markers.is_empty() {
                let scheduler = EmotionScheduler::start(
                    &item.clean_text,
                    &item.emotion_markers,
                    item.audio_duration,
                    avatar.clone(),
                    events.clone(),
                );
                *active_scheduler.lock() = Some(scheduler);
            }

            avatar.start_lip_sync(&item.audio);

            state.set_playing(true);
            if let Err(e) = sink.play(&item.audio).await {
                tracing::warn!(error = %e, text = %item.clean_text, "Audio output failed");
            }
            state.set_playing(false);

            // Normally every cue has fired by now; an externally stopped
            // playback leaves pending cues that must not outlive the item.
            if let Some(scheduler) = active_scheduler.lock().take() {
                scheduler.cancel();
            }
            avatar.stop_lip_sync();

            let _ = events.send(SpeechEvent::PlaybackFinished {
                text: item.clean_text,
            });
        }
    })
}
