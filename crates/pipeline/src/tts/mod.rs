//! Speech-synthesis worker
//!
//! One long-lived worker pulls sync items off the synthesis queue in strict
//! FIFO order, calls the external synthesis service, measures the resulting
//! audio's exact duration from its container, and pushes a playable item
//! downstream. The network call itself is not cancellable; staleness is
//! checked before the call (cheap early exit) and again after it (the
//! result is discarded instead of enqueued).

mod http;

pub use http::HttpSynthesizer;

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use avatar_voice_core::{
    wav_duration_seconds, InterruptSignal, PlayableItem, SpeechEvent, SpeechSynthesizer, SyncData,
};

use crate::queue::DrainQueue;

pub(crate) fn spawn_synthesis_worker(
    input: Arc<DrainQueue<SyncData>>,
    output: Arc<DrainQueue<PlayableItem>>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    signal: Arc<InterruptSignal>,
    language: String,
    events: broadcast::Sender<SpeechEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let item = input.pop().await;

            if signal.is_stale(item.generation) {
                tracing::trace!(text = %item.clean_text, "Dropping stale sync item before synthesis");
                continue;
            }

            if item.clean_text.trim().is_empty() {
                // A unit that was only markers or whitespace synthesizes to
                // nothing; skip the service call.
                continue;
            }

            let _ = events.send(SpeechEvent::SynthesisStarted {
                text: item.clean_text.clone(),
            });

            let audio = match synthesizer.synthesize(&item.clean_text, &language).await {
                Ok(audio) => audio,
                Err(e) => {
                    tracing::warn!(error = %e, text = %item.clean_text, "Synthesis failed, dropping unit");
                    continue;
                }
            };

            let audio_duration = match wav_duration_seconds(&audio) {
                Ok(duration) => duration,
                Err(e) => {
                    tracing::warn!(error = %e, text = %item.clean_text, "Undecodable synthesis result, dropping unit");
                    continue;
                }
            };

            // The service call is not cancellable; an interrupt that landed
            // while it was in flight shows up here as a stale stamp.
            if signal.is_stale(item.generation) {
                tracing::debug!(text = %item.clean_text, "Discarding synthesis result from stale generation");
                continue;
            }

            tracing::debug!(
                text = %item.clean_text,
                duration_s = format!("{:.2}", audio_duration),
                markers = item.emotion_markers.len(),
                "Synthesized unit"
            );

            output.push(PlayableItem {
                audio,
                clean_text: item.clean_text,
                emotion_markers: item.emotion_markers,
                audio_duration,
                generation: item.generation,
            });
        }
    })
}
