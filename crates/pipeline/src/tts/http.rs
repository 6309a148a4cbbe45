//! HTTP client for the speech-synthesis service
//!
//! `POST {base}/synthesize` with `{"text", "language"}`, returning a WAV
//! container. Any transport error or non-success status is a synthesis
//! failure; the caller drops the unit and continues. The request carries an
//! explicit timeout so a stalled service cannot pin the synthesis worker
//! forever.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use avatar_voice_core::{Error, Result, SpeechSynthesizer};

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    language: &'a str,
}

/// Reqwest-based synthesis client
#[derive(Debug, Clone)]
pub struct HttpSynthesizer {
    client: reqwest::Client,
    url: String,
}

impl HttpSynthesizer {
    /// Create a client for the given base URL with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Synthesis(format!("failed to build HTTP client: {e}")))?;

        let base = base_url.into();
        let url = format!("{}/synthesize", base.trim_end_matches('/'));

        Ok(Self { client, url })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.url)
            .json(&SynthesizeRequest { text, language })
            .send()
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Synthesis(format!(
                "service returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
