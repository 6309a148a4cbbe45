//! Voice monitor
//!
//! Continuously classifies microphone frames through the voice-activity
//! service and converts frame-level speech/silence flags into discrete
//! recording sessions: `idle → recording → finalizing → idle`. A rolling
//! pre-roll buffer keeps the most recent ~1 second of audio so the start of
//! an utterance is not clipped, and a short silence debounce decides when a
//! session ends. Speech observed while the player is actively outputting
//! audio triggers the barge-in coordinator before any session logic runs.

mod tcp;

pub use tcp::TcpVadClient;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use avatar_voice_config::MonitorConfig;
use avatar_voice_core::{
    encode_wav_pcm16, SpeechEvent, SpeechRecognizer, VoiceActivityService,
};

use crate::orchestrator::BargeInCoordinator;
use crate::playback::PlaybackState;

/// One recording session owned exclusively by the monitor
#[derive(Debug, Default)]
struct RecordingSession {
    frames: Vec<f32>,
    recording: bool,
}

impl RecordingSession {
    /// Speech frame observed. Seeds from the pre-roll on the idle→recording
    /// transition; returns true when a new session started.
    fn on_speech(&mut self, pre_roll: &VecDeque<Vec<f32>>, frame: &[f32]) -> bool {
        let started = !self.recording;
        if started {
            self.recording = true;
            self.frames.clear();
            for buffered in pre_roll {
                self.frames.extend_from_slice(buffered);
            }
        }
        self.frames.extend_from_slice(frame);
        started
    }

    /// Silence frame observed; while recording, every frame is kept
    fn on_silence(&mut self, frame: &[f32]) {
        if self.recording {
            self.frames.extend_from_slice(frame);
        }
    }

    /// Finalize: hand back the accumulated samples and reset to idle
    fn finalize(&mut self) -> Vec<f32> {
        self.recording = false;
        std::mem::take(&mut self.frames)
    }

    fn is_recording(&self) -> bool {
        self.recording
    }
}

/// Continuous microphone monitor with barge-in detection
pub struct VoiceMonitor {
    vad: Arc<dyn VoiceActivityService>,
    recognizer: Arc<dyn SpeechRecognizer>,
    coordinator: Arc<BargeInCoordinator>,
    playback: Arc<PlaybackState>,
    config: MonitorConfig,
    events: broadcast::Sender<SpeechEvent>,
    transcripts: mpsc::Sender<String>,
    mic_enabled: Arc<AtomicBool>,
}

impl VoiceMonitor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        vad: Arc<dyn VoiceActivityService>,
        recognizer: Arc<dyn SpeechRecognizer>,
        coordinator: Arc<BargeInCoordinator>,
        playback: Arc<PlaybackState>,
        config: MonitorConfig,
        events: broadcast::Sender<SpeechEvent>,
        transcripts: mpsc::Sender<String>,
        mic_enabled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            vad,
            recognizer,
            coordinator,
            playback,
            config,
            events,
            transcripts,
            mic_enabled,
        }
    }

    /// Run the sampling loop until the frame channel closes
    pub async fn run(self, mut frames: mpsc::Receiver<Vec<f32>>) {
        let pre_roll_cap = self.config.pre_roll_frames();
        let debounce = Duration::from_millis(self.config.silence_debounce_ms);

        let mut pre_roll: VecDeque<Vec<f32>> = VecDeque::with_capacity(pre_roll_cap);
        let mut session = RecordingSession::default();
        let mut deadline: Option<Instant> = None;

        loop {
            let debounce_at = deadline;
            let debounce_fired = async move {
                match debounce_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                maybe_frame = frames.recv() => {
                    let Some(frame) = maybe_frame else { break };

                    if !self.mic_enabled.load(Ordering::Acquire) {
                        continue;
                    }
                    if frame.len() != self.config.frame_samples {
                        continue;
                    }

                    let verdict = match self.vad.classify(&frame).await {
                        Ok(verdict) => verdict,
                        Err(e) => {
                            // A bad frame is invisible; the next one is
                            // evaluated independently.
                            tracing::warn!(error = %e, "VAD classification failed, skipping frame");
                            continue;
                        }
                    };

                    if verdict.is_speech {
                        // Barge-in fires before any session logic.
                        if self.playback.is_playing() {
                            tracing::info!(
                                probability = verdict.probability,
                                "Speech detected during playback, barging in"
                            );
                            self.coordinator.interrupt();
                        }

                        deadline = None;
                        if session.on_speech(&pre_roll, &frame) {
                            tracing::debug!("Recording started");
                        }
                    } else {
                        session.on_silence(&frame);
                        if session.is_recording() && deadline.is_none() {
                            deadline = Some(Instant::now() + debounce);
                        }
                    }

                    pre_roll.push_back(frame);
                    while pre_roll.len() > pre_roll_cap {
                        pre_roll.pop_front();
                    }
                }

                _ = debounce_fired => {
                    deadline = None;
                    let samples = session.finalize();
                    tracing::debug!(samples = samples.len(), "Recording finalized, recognizing");
                    self.recognize_session(samples).await;
                }
            }
        }

        tracing::debug!("Voice monitor frame channel closed");
    }

    async fn recognize_session(&self, samples: Vec<f32>) {
        if samples.is_empty() {
            return;
        }

        let wav = match encode_wav_pcm16(&samples, self.config.sample_rate) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode recording, dropping session");
                return;
            }
        };

        match self.recognizer.recognize(wav).await {
            Ok(text) => {
                tracing::info!(text = %text, "Recognition result");
                let _ = self.events.send(SpeechEvent::TranscriptReady { text: text.clone() });
                if self.transcripts.send(text).await.is_err() {
                    tracing::debug!("Transcript receiver dropped");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Recognition failed, dropping session");
            }
        }
    }
}
