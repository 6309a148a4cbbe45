//! Microphone capture
//!
//! Builds a cpal input stream at the pipeline's sample rate and chops the
//! callback data into fixed-size frames for the voice monitor. The returned
//! stream must be kept alive for capture to continue.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;

/// Frames the capture channel can hold before old audio is dropped
const CHANNEL_CAPACITY: usize = 256;

pub fn start_capture(
    sample_rate: u32,
    frame_samples: usize,
) -> Result<(cpal::Stream, mpsc::Receiver<Vec<f32>>)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("no default input device")?;
    let device_name = device.name().unwrap_or_else(|_| "unknown".into());

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let mut pending: Vec<f32> = Vec::with_capacity(frame_samples);

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for &sample in data {
                    pending.push(sample);
                    if pending.len() == frame_samples {
                        let frame =
                            std::mem::replace(&mut pending, Vec::with_capacity(frame_samples));
                        // The monitor consumes in order; when it falls
                        // behind, dropping the newest frame is acceptable.
                        let _ = tx.try_send(frame);
                    }
                }
            },
            |err| tracing::warn!(error = %err, "Capture stream error"),
            None,
        )
        .context("failed to build input stream")?;

    stream.play().context("failed to start capture")?;
    tracing::info!(device = %device_name, sample_rate, frame_samples, "Microphone capture started");

    Ok((stream, rx))
}
