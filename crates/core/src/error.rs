//! Error types shared across the pipeline

use thiserror::Error;

/// Result alias used throughout the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by pipeline components and service clients
///
/// Per-item failures (synthesis, recognition, a malformed VAD reply) are
/// recoverable: workers log them and continue with the next item. Startup
/// failures (missing config, unreachable required service) are fatal and
/// surface before any worker is spawned.
#[derive(Debug, Error)]
pub enum Error {
    /// Speech synthesis service failure (network error, non-2xx status)
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// Speech recognition service failure
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// Voice activity service failure (connection, malformed reply)
    #[error("vad failed: {0}")]
    Vad(String),

    /// Audio container could not be decoded
    #[error("audio decode failed: {0}")]
    Decode(String),

    /// Audio output device failure
    #[error("audio output failed: {0}")]
    Audio(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Synthesis("connection refused".into());
        assert_eq!(err.to_string(), "synthesis failed: connection refused");

        let err = Error::Vad("round trip timed out".into());
        assert!(err.to_string().contains("timed out"));
    }
}
