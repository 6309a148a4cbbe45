//! Pipeline orchestrator
//!
//! [`SpeechPipeline`] is the explicit owner of everything the pipeline
//! shares: both FIFO queues, the worker handles, the interrupt signal, the
//! active emotion scheduler slot, and the event channel. It is constructed
//! once and passed by `Arc` to whoever needs it; there is no ambient global
//! state.
//!
//! [`BargeInCoordinator`] is the one cross-cutting control: its
//! `interrupt()` stops playback, drains the queues, cancels the active
//! scheduler, and flags the upstream feeder, all in a single bounded
//! critical section that never waits on a network call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use avatar_voice_config::{EmotionRegistry, Settings};
use avatar_voice_core::{
    AudioSink, AvatarController, InterruptSignal, PlayableItem, SpeechEvent, SpeechRecognizer,
    SpeechSynthesizer, SyncData, TextUnit, VoiceActivityService,
};

use crate::playback::{spawn_playback_worker, EmotionScheduler, PlaybackState};
use crate::processors::{Segmenter, TagExtractor};
use crate::queue::DrainQueue;
use crate::tts::spawn_synthesis_worker;
use crate::vad::VoiceMonitor;

/// Event channel capacity; slow subscribers lag rather than stall workers
const EVENT_CAPACITY: usize = 256;

/// Transcript channel capacity
const TRANSCRIPT_CAPACITY: usize = 16;

/// External collaborators the pipeline drives
pub struct PipelineHandles {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub avatar: Arc<dyn AvatarController>,
    pub sink: Arc<dyn AudioSink>,
}

/// Cross-cutting barge-in control
///
/// `interrupt()` is idempotent and may be called concurrently from multiple
/// triggers: detected speech, a hotkey, an explicit stop command. Items
/// already dequeued and in flight are left to self-discard via the stale
/// generation check.
pub struct BargeInCoordinator {
    signal: Arc<InterruptSignal>,
    synthesis_queue: Arc<DrainQueue<SyncData>>,
    playback_queue: Arc<DrainQueue<PlayableItem>>,
    sink: Arc<dyn AudioSink>,
    avatar: Arc<dyn AvatarController>,
    active_scheduler: Arc<Mutex<Option<EmotionScheduler>>>,
    events: broadcast::Sender<SpeechEvent>,
    /// Serializes concurrent interrupt() calls into one critical section
    critical: Mutex<()>,
}

impl BargeInCoordinator {
    /// Stop playback, drain the queues, cancel the scheduler, flag upstream
    ///
    /// Completes in bounded time: every step is a local, non-blocking
    /// operation, independent of any outstanding call to the synthesis
    /// service.
    pub fn interrupt(&self) {
        let _critical = self.critical.lock();

        let generation = self.signal.interrupt();
        self.sink.stop();
        if let Some(scheduler) = self.active_scheduler.lock().take() {
            scheduler.cancel();
        }
        let dropped_text = self.synthesis_queue.clear();
        let dropped_audio = self.playback_queue.clear();
        self.avatar.stop_lip_sync();

        tracing::info!(
            generation,
            dropped_text,
            dropped_audio,
            "Pipeline interrupted"
        );
        let _ = self.events.send(SpeechEvent::interrupted());
    }
}

/// The speech pipeline: segmentation → synthesis → playback, plus the
/// voice monitor and barge-in coordination
pub struct SpeechPipeline {
    language: String,
    segmenter: Mutex<Segmenter>,
    extractor: TagExtractor,
    signal: Arc<InterruptSignal>,
    synthesis_queue: Arc<DrainQueue<SyncData>>,
    playback_queue: Arc<DrainQueue<PlayableItem>>,
    coordinator: Arc<BargeInCoordinator>,
    playback: Arc<PlaybackState>,
    monitor_config: avatar_voice_config::MonitorConfig,
    mic_enabled: Arc<AtomicBool>,
    event_tx: broadcast::Sender<SpeechEvent>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SpeechPipeline {
    /// Build the pipeline and spawn its synthesis and playback workers
    pub fn new(
        settings: &Settings,
        registry: Arc<EmotionRegistry>,
        handles: PipelineHandles,
    ) -> Arc<Self> {
        let signal = Arc::new(InterruptSignal::new());
        let synthesis_queue = Arc::new(DrainQueue::new());
        let playback_queue = Arc::new(DrainQueue::new());
        let playback = Arc::new(PlaybackState::new());
        let active_scheduler = Arc::new(Mutex::new(None));
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let coordinator = Arc::new(BargeInCoordinator {
            signal: signal.clone(),
            synthesis_queue: synthesis_queue.clone(),
            playback_queue: playback_queue.clone(),
            sink: handles.sink.clone(),
            avatar: handles.avatar.clone(),
            active_scheduler: active_scheduler.clone(),
            events: event_tx.clone(),
            critical: Mutex::new(()),
        });

        let synthesis_worker = spawn_synthesis_worker(
            synthesis_queue.clone(),
            playback_queue.clone(),
            handles.synthesizer,
            signal.clone(),
            settings.language.clone(),
            event_tx.clone(),
        );

        let playback_worker = spawn_playback_worker(
            playback_queue.clone(),
            handles.sink,
            handles.avatar,
            signal.clone(),
            playback.clone(),
            active_scheduler,
            event_tx.clone(),
        );

        tracing::info!(language = %settings.language, "Speech pipeline started");

        Arc::new(Self {
            language: settings.language.clone(),
            segmenter: Mutex::new(Segmenter::new(&settings.segmenter)),
            extractor: TagExtractor::new(registry),
            signal,
            synthesis_queue,
            playback_queue,
            coordinator,
            playback,
            monitor_config: settings.monitor.clone(),
            mic_enabled: Arc::new(AtomicBool::new(true)),
            event_tx,
            workers: Mutex::new(vec![synthesis_worker, playback_worker]),
        })
    }

    /// Feed a streamed text fragment into the segmenter
    ///
    /// Runs synchronously on the calling thread; each boundary crossed
    /// enqueues one unit for synthesis. A no-op while interrupted; the
    /// upstream generator is expected to stop for the current turn.
    pub fn feed(&self, fragment: &str) {
        if self.signal.is_interrupted() {
            return;
        }
        let units = self.segmenter.lock().feed(fragment);
        for unit in units {
            self.enqueue_unit(unit);
        }
    }

    /// Flush the segmenter remainder when the upstream reply completes
    pub fn finish_turn(&self) {
        if self.signal.is_interrupted() {
            return;
        }
        let flushed = self.segmenter.lock().flush();
        if let Some(unit) = flushed {
            self.enqueue_unit(unit);
        }
    }

    /// Re-arm for a new agent reply
    pub fn begin_turn(&self) {
        self.segmenter.lock().reset();
        self.signal.begin_turn();
    }

    /// Barge in: stop everything for the current turn
    pub fn interrupt(&self) {
        self.segmenter.lock().reset();
        self.coordinator.interrupt();
    }

    fn enqueue_unit(&self, unit: TextUnit) {
        let generation = self.signal.generation();
        let data = self.extractor.extract(&unit, generation);
        let _ = self.event_tx.send(SpeechEvent::SegmentQueued {
            text: data.original_text.clone(),
        });
        self.synthesis_queue.push(data);
    }

    /// Start the voice monitor over a channel of capture frames
    ///
    /// Returns the receiver for recognized transcripts.
    pub fn start_voice_monitor(
        &self,
        vad: Arc<dyn VoiceActivityService>,
        recognizer: Arc<dyn SpeechRecognizer>,
        frames: mpsc::Receiver<Vec<f32>>,
    ) -> mpsc::Receiver<String> {
        let (transcript_tx, transcript_rx) = mpsc::channel(TRANSCRIPT_CAPACITY);

        let monitor = VoiceMonitor::new(
            vad,
            recognizer,
            self.coordinator.clone(),
            self.playback.clone(),
            self.monitor_config.clone(),
            self.event_tx.clone(),
            transcript_tx,
            self.mic_enabled.clone(),
        );

        let handle = tokio::spawn(monitor.run(frames));
        self.workers.lock().push(handle);

        transcript_rx
    }

    /// Subscribe to pipeline events
    pub fn subscribe(&self) -> broadcast::Receiver<SpeechEvent> {
        self.event_tx.subscribe()
    }

    /// Enable or disable microphone input to the voice monitor
    pub fn set_mic_enabled(&self, enabled: bool) {
        self.mic_enabled.store(enabled, Ordering::Release);
    }

    /// The barge-in coordinator, for wiring extra triggers (e.g. a hotkey)
    pub fn coordinator(&self) -> Arc<BargeInCoordinator> {
        self.coordinator.clone()
    }

    /// Language passed to the synthesis service
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_interrupted(&self) -> bool {
        self.signal.is_interrupted()
    }

    /// Whether audio output is currently in progress
    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    /// Units waiting for synthesis
    pub fn synthesis_backlog(&self) -> usize {
        self.synthesis_queue.len()
    }

    /// Items waiting for playback
    pub fn playback_backlog(&self) -> usize {
        self.playback_queue.len()
    }

    /// Abort all workers; queues are left as-is
    pub fn shutdown(&self) {
        for worker in self.workers.lock().drain(..) {
            worker.abort();
        }
    }
}

impl Drop for SpeechPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
