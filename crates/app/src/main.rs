//! Avatar voice front-end entry point
//!
//! Wires the speech pipeline to its external collaborators: the synthesis
//! and recognition HTTP services, the voice-activity TCP service, the
//! microphone, and the audio output device. Text typed on stdin stands in
//! for the upstream reply stream; each line is one agent turn.

mod capture;
mod playback;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use avatar_voice_config::{load_settings, EmotionRegistry, Settings};
use avatar_voice_core::NoopAvatar;
use avatar_voice_pipeline::{
    HttpRecognizer, HttpSynthesizer, PipelineHandles, SpeechPipeline, TcpVadClient,
};

use playback::DeviceSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.json > config/default.json > defaults
    let env = std::env::var("AVATAR_VOICE_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!("Warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting avatar voice front-end v{}", env!("CARGO_PKG_VERSION"));

    // Fatal at startup: the pipeline must not run without its emotion table
    // or its voice-activity service.
    let registry = Arc::new(
        EmotionRegistry::load(&settings.emotion_config_path)
            .context("emotion configuration is required")?,
    );

    let request_timeout = Duration::from_millis(settings.services.request_timeout_ms);
    let synthesizer = Arc::new(HttpSynthesizer::new(
        &settings.services.synthesis_url,
        request_timeout,
    )?);
    let recognizer = Arc::new(HttpRecognizer::new(
        &settings.services.recognition_url,
        request_timeout,
    )?);
    let vad = Arc::new(
        TcpVadClient::connect(
            &settings.services.vad_addr,
            Duration::from_millis(settings.services.vad_timeout_ms),
        )
        .await
        .context("voice-activity service is required")?,
    );

    let sink = Arc::new(DeviceSink::new()?);

    let pipeline = SpeechPipeline::new(
        &settings,
        registry,
        PipelineHandles {
            synthesizer,
            avatar: Arc::new(NoopAvatar),
            sink,
        },
    );

    // Structured event log
    let mut events = pipeline.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                tracing::info!(event = %json, "Pipeline event");
            }
        }
    });

    // Microphone → voice monitor; the capture stream must stay alive
    let _capture_stream = match capture::start_capture(
        settings.monitor.sample_rate,
        settings.monitor.frame_samples,
    ) {
        Ok((stream, frames)) => {
            let mut transcripts = pipeline.start_voice_monitor(vad, recognizer, frames);
            tokio::spawn(async move {
                while let Some(text) = transcripts.recv().await {
                    println!("you said: {text}");
                }
            });
            Some(stream)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Microphone unavailable, running without voice input");
            None
        }
    };

    println!("Type a reply to speak it; /stop interrupts; /quit exits.");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "/quit" => break,
            "/stop" => pipeline.interrupt(),
            text => {
                pipeline.begin_turn();
                pipeline.feed(text);
                pipeline.finish_turn();
            }
        }
    }

    pipeline.shutdown();
    Ok(())
}
