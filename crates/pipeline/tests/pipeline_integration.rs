//! Integration tests for the speech pipeline
//!
//! Drive the full pipeline (segmenter → synthesis → playback → emotion
//! sync, plus the voice monitor) with stub collaborators and verify the
//! ordering, timing, and interrupt guarantees end to end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio::time::timeout;

use avatar_voice_config::{EmotionRegistry, Settings};
use avatar_voice_core::{
    encode_wav_pcm16, wav_duration_seconds, AudioSink, AvatarController, NoopAvatar, Result,
    SpeechEvent, SpeechRecognizer, SpeechSynthesizer, VadVerdict, VoiceActivityService,
};
use avatar_voice_pipeline::{PipelineHandles, SpeechPipeline};

/// Synthesizer producing a fixed-duration silent WAV per unit
struct StubSynthesizer {
    duration_s: f64,
    calls: AtomicUsize,
}

impl StubSynthesizer {
    fn new(duration_s: f64) -> Arc<Self> {
        Arc::new(Self {
            duration_s,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for StubSynthesizer {
    async fn synthesize(&self, _text: &str, _language: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let samples = vec![0.0f32; (16000.0 * self.duration_s) as usize];
        encode_wav_pcm16(&samples, 16000)
    }
}

/// Sink that "plays" for the item's measured duration, stoppable midway
struct TimedSink {
    stop: Notify,
    active: AtomicUsize,
    max_active: AtomicUsize,
    completed: AtomicUsize,
}

impl TimedSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            stop: Notify::new(),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AudioSink for TimedSink {
    async fn play(&self, audio: &[u8]) -> Result<()> {
        let duration = wav_duration_seconds(audio).unwrap_or(0.0);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs_f64(duration)) => {
                self.completed.fetch_add(1, Ordering::SeqCst);
            }
            _ = self.stop.notified() => {}
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stop.notify_waiters();
    }
}

/// Avatar recording triggered motion indices
#[derive(Default)]
struct RecordingAvatar {
    motions: parking_lot::Mutex<Vec<usize>>,
}

impl AvatarController for RecordingAvatar {
    fn start_lip_sync(&self, _audio: &[u8]) {}
    fn stop_lip_sync(&self) {}
    fn trigger_motion(&self, index: usize) {
        self.motions.lock().push(index);
    }
}

/// VAD stub: a frame is speech when its first sample exceeds 0.5
struct AmplitudeVad;

#[async_trait]
impl VoiceActivityService for AmplitudeVad {
    async fn classify(&self, frame: &[f32]) -> Result<VadVerdict> {
        let is_speech = frame.first().copied().unwrap_or(0.0) > 0.5;
        Ok(VadVerdict {
            is_speech,
            probability: if is_speech { 0.95 } else { 0.05 },
        })
    }
}

/// Recognizer that reports the sample count it received
struct StubRecognizer;

#[async_trait]
impl SpeechRecognizer for StubRecognizer {
    async fn recognize(&self, wav: Vec<u8>) -> Result<String> {
        Ok(format!("heard {:.2}s", wav_duration_seconds(&wav)?))
    }
}

fn registry() -> Arc<EmotionRegistry> {
    let mut actions = HashMap::new();
    actions.insert("开心".to_string(), vec!["Hiyori_m02.motion3.json".into()]);
    actions.insert("难过".to_string(), vec!["Hiyori_m03.motion3.json".into()]);
    Arc::new(EmotionRegistry::from_parts(
        actions,
        vec![
            "Hiyori_m02.motion3.json".to_string(),
            "Hiyori_m03.motion3.json".to_string(),
        ],
    ))
}

fn fast_settings() -> Settings {
    let mut settings = Settings::default();
    settings.monitor.silence_debounce_ms = 50;
    settings.monitor.pre_roll_ms = 32; // one frame of pre-roll
    settings
}

async fn next_event(
    rx: &mut tokio::sync::broadcast::Receiver<SpeechEvent>,
    pred: impl Fn(&SpeechEvent) -> bool,
) -> Option<SpeechEvent> {
    loop {
        match timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Ok(event)) if pred(&event) => return Some(event),
            Ok(Ok(_)) => continue,
            _ => return None,
        }
    }
}

#[tokio::test]
async fn test_units_play_in_order_one_at_a_time() {
    let synthesizer = StubSynthesizer::new(0.05);
    let sink = TimedSink::new();
    let pipeline = SpeechPipeline::new(
        &fast_settings(),
        registry(),
        PipelineHandles {
            synthesizer: synthesizer.clone(),
            avatar: Arc::new(NoopAvatar),
            sink: sink.clone(),
        },
    );
    let mut events = pipeline.subscribe();

    pipeline.feed("一，二，三，");
    pipeline.finish_turn();

    let mut started = Vec::new();
    for _ in 0..3 {
        if let Some(SpeechEvent::PlaybackStarted { text, .. }) =
            next_event(&mut events, |e| matches!(e, SpeechEvent::PlaybackStarted { .. })).await
        {
            started.push(text);
        }
    }

    assert_eq!(started, vec!["一，", "二，", "三，"]);
    assert_eq!(sink.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 3);

    pipeline.shutdown();
}

#[tokio::test]
async fn test_emotion_cue_fires_mid_playback() {
    // A 0.4 s utterance of 4 characters with a marker at position 2 should
    // fire its motion near the halfway point of playback.
    let avatar = Arc::new(RecordingAvatar::default());
    let sink = TimedSink::new();
    let pipeline = SpeechPipeline::new(
        &fast_settings(),
        registry(),
        PipelineHandles {
            synthesizer: StubSynthesizer::new(0.4),
            avatar: avatar.clone(),
            sink,
        },
    );
    let mut events = pipeline.subscribe();

    pipeline.feed("早上<难过>好呀，");
    pipeline.finish_turn();

    let playback_started = Instant::now();
    assert!(
        next_event(&mut events, |e| matches!(e, SpeechEvent::PlaybackStarted { .. }))
            .await
            .is_some()
    );

    let fired = next_event(&mut events, |e| matches!(e, SpeechEvent::EmotionTriggered { .. }))
        .await
        .expect("emotion cue should fire during playback");
    let elapsed = playback_started.elapsed();

    if let SpeechEvent::EmotionTriggered { motion_index, .. } = fired {
        assert_eq!(motion_index, 1);
    }
    assert_eq!(*avatar.motions.lock(), vec![1]);
    // Position 2 of "早上好呀，" (5 chars) over 0.4 s is 0.16 s; allow slack.
    assert!(elapsed >= Duration::from_millis(100), "fired at {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(400), "fired at {elapsed:?}");

    pipeline.shutdown();
}

#[tokio::test]
async fn test_interrupt_stops_playback_and_cancels_cues() {
    // An utterance long enough that its late marker never fires once the
    // listener barges in early.
    let avatar = Arc::new(RecordingAvatar::default());
    let sink = TimedSink::new();
    let pipeline = SpeechPipeline::new(
        &fast_settings(),
        registry(),
        PipelineHandles {
            synthesizer: StubSynthesizer::new(2.0),
            avatar: avatar.clone(),
            sink: sink.clone(),
        },
    );
    let mut events = pipeline.subscribe();

    pipeline.feed("一二<开心>三四，五六七八，");
    pipeline.finish_turn();

    assert!(
        next_event(&mut events, |e| matches!(e, SpeechEvent::PlaybackStarted { .. }))
            .await
            .is_some()
    );

    pipeline.interrupt();

    assert!(
        next_event(&mut events, |e| matches!(e, SpeechEvent::Interrupted { .. }))
            .await
            .is_some()
    );
    assert_eq!(pipeline.synthesis_backlog(), 0);
    assert_eq!(pipeline.playback_backlog(), 0);

    // Playback winds down without completing and no cue ever fires.
    timeout(Duration::from_secs(1), async {
        while pipeline.is_playing() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("playback should stop after interrupt");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(avatar.motions.lock().is_empty());
    assert_eq!(sink.completed.load(Ordering::SeqCst), 0);

    // Stale items enqueued before the interrupt never resurface.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(pipeline.playback_backlog(), 0);

    pipeline.shutdown();
}

#[tokio::test]
async fn test_next_turn_plays_after_interrupt() {
    let sink = TimedSink::new();
    let pipeline = SpeechPipeline::new(
        &fast_settings(),
        registry(),
        PipelineHandles {
            synthesizer: StubSynthesizer::new(0.05),
            avatar: Arc::new(NoopAvatar),
            sink,
        },
    );
    let mut events = pipeline.subscribe();

    pipeline.feed("旧的回复，");
    pipeline.interrupt();

    pipeline.begin_turn();
    pipeline.feed("新的回复，");
    pipeline.finish_turn();

    // The interrupted unit may or may not have reached the player first;
    // the fresh-generation unit must.
    let started = next_event(&mut events, |e| {
        matches!(e, SpeechEvent::PlaybackStarted { text, .. } if text == "新的回复，")
    })
    .await;
    assert!(started.is_some(), "fresh-generation unit should play");

    pipeline.shutdown();
}

#[tokio::test]
async fn test_speech_during_playback_barges_in() {
    // Scenario: the agent is speaking a long utterance; the listener talks.
    // The monitor must interrupt before running its own session logic, then
    // record through the debounce and produce a transcript.
    let sink = TimedSink::new();
    let pipeline = SpeechPipeline::new(
        &fast_settings(),
        registry(),
        PipelineHandles {
            synthesizer: StubSynthesizer::new(5.0),
            avatar: Arc::new(NoopAvatar),
            sink,
        },
    );
    let mut events = pipeline.subscribe();

    let (frame_tx, frame_rx) = mpsc::channel(64);
    let mut transcripts =
        pipeline.start_voice_monitor(Arc::new(AmplitudeVad), Arc::new(StubRecognizer), frame_rx);

    pipeline.feed("很长很长的回复，");
    pipeline.finish_turn();

    assert!(
        next_event(&mut events, |e| matches!(e, SpeechEvent::PlaybackStarted { .. }))
            .await
            .is_some()
    );

    // Listener speaks: a few speech frames, then silence past the debounce.
    for _ in 0..3 {
        frame_tx.send(vec![0.9f32; 512]).await.unwrap();
    }
    assert!(
        next_event(&mut events, |e| matches!(e, SpeechEvent::Interrupted { .. }))
            .await
            .is_some()
    );
    assert_eq!(pipeline.synthesis_backlog(), 0);
    assert_eq!(pipeline.playback_backlog(), 0);

    for _ in 0..4 {
        frame_tx.send(vec![0.0f32; 512]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let transcript = timeout(Duration::from_secs(5), transcripts.recv())
        .await
        .expect("transcript should arrive")
        .expect("monitor alive");
    // 1 pre-roll frame + 3 speech + 4 silence frames of 512 samples.
    assert!(transcript.starts_with("heard"));

    assert!(
        next_event(&mut events, |e| matches!(e, SpeechEvent::TranscriptReady { .. }))
            .await
            .is_some()
    );

    pipeline.shutdown();
}

#[tokio::test]
async fn test_disabled_mic_drops_frames() {
    let pipeline = SpeechPipeline::new(
        &fast_settings(),
        registry(),
        PipelineHandles {
            synthesizer: StubSynthesizer::new(0.05),
            avatar: Arc::new(NoopAvatar),
            sink: TimedSink::new(),
        },
    );

    let (frame_tx, frame_rx) = mpsc::channel(64);
    let mut transcripts =
        pipeline.start_voice_monitor(Arc::new(AmplitudeVad), Arc::new(StubRecognizer), frame_rx);

    pipeline.set_mic_enabled(false);
    for _ in 0..3 {
        frame_tx.send(vec![0.9f32; 512]).await.unwrap();
    }
    for _ in 0..4 {
        frame_tx.send(vec![0.0f32; 512]).await.unwrap();
    }

    // No session can start with the mic gated off.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(transcripts.try_recv().is_err());

    pipeline.shutdown();
}
