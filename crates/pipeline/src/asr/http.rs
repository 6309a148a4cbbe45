//! HTTP client for the speech-recognition service
//!
//! `POST {base}/upload_audio` with a multipart WAV payload, returning
//! `{"text": ...}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use avatar_voice_core::{Error, Result, SpeechRecognizer};

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    text: String,
}

/// Reqwest-based recognition client
#[derive(Debug, Clone)]
pub struct HttpRecognizer {
    client: reqwest::Client,
    url: String,
}

impl HttpRecognizer {
    /// Create a client for the given base URL with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Recognition(format!("failed to build HTTP client: {e}")))?;

        let base = base_url.into();
        let url = format!("{}/upload_audio", base.trim_end_matches('/'));

        Ok(Self { client, url })
    }
}

#[async_trait]
impl SpeechRecognizer for HttpRecognizer {
    async fn recognize(&self, wav: Vec<u8>) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Recognition(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Recognition(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Recognition(format!(
                "service returned {}",
                response.status()
            )));
        }

        let body: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| Error::Recognition(e.to_string()))?;

        Ok(body.text)
    }
}
