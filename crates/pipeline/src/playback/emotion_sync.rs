//! Per-utterance emotion timeline
//!
//! Trigger times are character-proportional: a marker at character position
//! `p` of an `n`-character text fires at `p / n * audio_duration`. This
//! assumes roughly uniform speech rate across the utterance; it is gesture
//! timing, not phoneme alignment.
//!
//! The scheduler is one deadline-ordered timer task, not a polling loop:
//! cues are sorted once and each is awaited with `sleep_until`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use avatar_voice_core::{AvatarController, EmotionMarker, SpeechEvent};

/// One scheduled motion trigger
#[derive(Debug, Clone, PartialEq)]
pub struct MotionCue {
    /// Offset from playback start
    pub offset: Duration,
    pub emotion: String,
    pub motion_index: usize,
}

/// Compute the trigger timeline for one utterance
///
/// Offsets are monotonically non-decreasing in marker-position order and
/// always lie within `[0, audio_duration]`. Empty text or a non-positive
/// duration yields no cues.
pub fn compute_timeline(
    clean_text: &str,
    markers: &[EmotionMarker],
    audio_duration: f64,
) -> Vec<MotionCue> {
    let total_chars = clean_text.chars().count();
    if total_chars == 0 || audio_duration <= 0.0 {
        return Vec::new();
    }

    let per_char = audio_duration / total_chars as f64;

    let mut cues: Vec<MotionCue> = markers
        .iter()
        .map(|marker| MotionCue {
            offset: Duration::from_secs_f64(
                (marker.position.min(total_chars) as f64 * per_char).min(audio_duration),
            ),
            emotion: marker.emotion.clone(),
            motion_index: marker.motion_index,
        })
        .collect();

    cues.sort_by_key(|cue| cue.offset);
    cues
}

/// Fires motion triggers at computed offsets during one utterance
///
/// State machine: armed → firing* → done | canceled. At most one scheduler
/// is active at any instant; the playback worker arms one per item and
/// cancels it before the next item begins.
pub struct EmotionScheduler {
    canceled: Arc<AtomicBool>,
    cancel_notify: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl EmotionScheduler {
    /// Arm a scheduler for one utterance and start its timer task
    pub fn start(
        clean_text: &str,
        markers: &[EmotionMarker],
        audio_duration: f64,
        avatar: Arc<dyn AvatarController>,
        events: broadcast::Sender<SpeechEvent>,
    ) -> Self {
        let cues = compute_timeline(clean_text, markers, audio_duration);
        let canceled = Arc::new(AtomicBool::new(false));
        let cancel_notify = Arc::new(Notify::new());

        let task_canceled = canceled.clone();
        let task_notify = cancel_notify.clone();
        let started = Instant::now();

        let handle = tokio::spawn(async move {
            for cue in cues {
                let deadline = started + cue.offset;
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        if task_canceled.load(Ordering::Acquire) {
                            return;
                        }
                        avatar.trigger_motion(cue.motion_index);
                        tracing::debug!(
                            emotion = %cue.emotion,
                            motion_index = cue.motion_index,
                            offset_ms = cue.offset.as_millis() as u64,
                            "Emotion cue fired"
                        );
                        let _ = events.send(SpeechEvent::emotion_triggered(
                            &cue.emotion,
                            cue.motion_index,
                        ));
                    }
                    _ = task_notify.notified() => {
                        return;
                    }
                }
            }
        });

        Self {
            canceled,
            cancel_notify,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Stop all unfired timers immediately
    ///
    /// Idempotent, and safe to call from a different worker than the one
    /// that armed the scheduler.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
        self.cancel_notify.notify_one();
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatar_voice_core::NoopAvatar;

    fn marker(position: usize) -> EmotionMarker {
        EmotionMarker {
            position,
            emotion: "开心".into(),
            motion_index: 0,
            motion_file: "Hiyori_m02.motion3.json".into(),
        }
    }

    #[test]
    fn test_character_proportional_offsets() {
        // Marker at position 2 of a 4-character text over 4.0 s fires at 2.0 s.
        let cues = compute_timeline("早上好呀", &[marker(2)], 4.0);
        assert_eq!(cues.len(), 1);
        assert!((cues[0].offset.as_secs_f64() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_offsets_monotonic_and_bounded() {
        let markers = vec![marker(0), marker(3), marker(6)];
        let cues = compute_timeline("一二三四五六", &markers, 2.5);

        let mut previous = Duration::ZERO;
        for cue in &cues {
            assert!(cue.offset >= previous);
            assert!(cue.offset.as_secs_f64() <= 2.5);
            previous = cue.offset;
        }
    }

    #[test]
    fn test_empty_text_yields_no_cues() {
        assert!(compute_timeline("", &[marker(0)], 4.0).is_empty());
        assert!(compute_timeline("你好", &[marker(0)], 0.0).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cues_fire_at_offsets() {
        let (events, mut rx) = broadcast::channel(16);
        let scheduler = EmotionScheduler::start(
            "早上好呀",
            &[marker(2)],
            0.4,
            Arc::new(NoopAvatar),
            events,
        );

        tokio::time::sleep(Duration::from_millis(300)).await;
        let event = tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("cue should have fired")
            .unwrap();
        assert!(matches!(event, SpeechEvent::EmotionTriggered { .. }));

        scheduler.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_unfired_cues() {
        let (events, mut rx) = broadcast::channel(16);
        let scheduler = EmotionScheduler::start(
            "早上好呀",
            &[marker(2)],
            4.0,
            Arc::new(NoopAvatar),
            events,
        );

        // Cancel at 1.0 s; the 2.0 s cue must not fire.
        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.cancel();
        scheduler.cancel(); // idempotent

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(rx.try_recv().is_err());
    }
}
