//! WAV helpers
//!
//! The pipeline never inspects audio content; it only needs two container
//! operations: measuring the duration of a synthesized WAV (frame count over
//! sample rate) and packaging captured f32 frames as PCM16 WAV for the
//! recognition upload.

use std::io::Cursor;

use crate::{Error, Result};

/// PCM16 scaling constant for f32 -> i16 conversion
const PCM16_SCALE: f32 = 32767.0;

/// Decode a WAV container's exact duration in seconds
///
/// Duration is frame count divided by sample rate, taken from the container
/// header. A malformed or truncated container is a decode failure; callers
/// drop the item and continue.
pub fn wav_duration_seconds(bytes: &[u8]) -> Result<f64> {
    let reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| Error::Decode(e.to_string()))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(Error::Decode("zero sample rate".into()));
    }
    let frames = reader.duration() as f64;
    Ok(frames / spec.sample_rate as f64)
}

/// Encode mono f32 samples (normalized to [-1.0, 1.0]) as a PCM16 WAV
pub fn encode_wav_pcm16(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Decode(e.to_string()))?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer
                .write_sample((clamped * PCM16_SCALE) as i16)
                .map_err(|e| Error::Decode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| Error::Decode(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_matches_sample_count() {
        // 8000 samples at 16 kHz is exactly half a second
        let samples = vec![0.0f32; 8000];
        let wav = encode_wav_pcm16(&samples, 16000).unwrap();

        let duration = wav_duration_seconds(&wav).unwrap();
        assert!((duration - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_container_is_decode_error() {
        let garbage = vec![0u8; 16];
        assert!(matches!(
            wav_duration_seconds(&garbage),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_encode_clamps_out_of_range_samples() {
        let samples = vec![2.0f32, -2.0f32];
        let wav = encode_wav_pcm16(&samples, 16000).unwrap();
        assert!(wav_duration_seconds(&wav).is_ok());
    }
}
