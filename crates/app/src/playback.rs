//! Audio output device
//!
//! rodio's output stream is not `Send`, so a dedicated thread owns it and
//! plays one container at a time off a command channel. `stop()` acts on
//! the currently playing sink directly, which is what lets the barge-in
//! coordinator cut audio without waiting for the playback worker.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use avatar_voice_core::{AudioSink, Error, Result};

struct PlayRequest {
    audio: Vec<u8>,
    done: oneshot::Sender<Result<()>>,
}

/// System audio output via rodio
pub struct DeviceSink {
    commands: mpsc::UnboundedSender<PlayRequest>,
    current: Arc<Mutex<Option<Arc<rodio::Sink>>>>,
}

impl DeviceSink {
    pub fn new() -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let current: Arc<Mutex<Option<Arc<rodio::Sink>>>> = Arc::new(Mutex::new(None));

        let thread_current = current.clone();
        std::thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || audio_thread(rx, thread_current))
            .map_err(|e| Error::Audio(format!("failed to spawn audio thread: {e}")))?;

        Ok(Self {
            commands: tx,
            current,
        })
    }
}

fn audio_thread(
    mut commands: mpsc::UnboundedReceiver<PlayRequest>,
    current: Arc<Mutex<Option<Arc<rodio::Sink>>>>,
) {
    let stream = rodio::OutputStream::try_default();
    let (_stream, handle) = match stream {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "No audio output device");
            // Fail every request rather than silently hanging callers.
            while let Some(request) = commands.blocking_recv() {
                let _ = request
                    .done
                    .send(Err(Error::Audio("no output device".into())));
            }
            return;
        }
    };

    while let Some(request) = commands.blocking_recv() {
        let result = play_one(&handle, &current, request.audio);
        *current.lock() = None;
        let _ = request.done.send(result);
    }
}

fn play_one(
    handle: &rodio::OutputStreamHandle,
    current: &Mutex<Option<Arc<rodio::Sink>>>,
    audio: Vec<u8>,
) -> Result<()> {
    let sink = rodio::Sink::try_new(handle).map_err(|e| Error::Audio(e.to_string()))?;
    let source = rodio::Decoder::new(Cursor::new(audio)).map_err(|e| Error::Audio(e.to_string()))?;

    let sink = Arc::new(sink);
    sink.append(source);
    *current.lock() = Some(sink.clone());

    // Returns early if stop() empties the sink.
    sink.sleep_until_end();
    Ok(())
}

#[async_trait]
impl AudioSink for DeviceSink {
    async fn play(&self, audio: &[u8]) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.commands
            .send(PlayRequest {
                audio: audio.to_vec(),
                done: done_tx,
            })
            .map_err(|_| Error::Audio("audio thread exited".into()))?;

        done_rx
            .await
            .map_err(|_| Error::Audio("audio thread dropped request".into()))?
    }

    fn stop(&self) {
        if let Some(sink) = self.current.lock().as_ref() {
            sink.stop();
        }
    }
}
