//! TCP client for the voice-activity service
//!
//! Persistent bidirectional channel: the client writes fixed-size frames of
//! little-endian f32 samples and the service answers one JSON line
//! `{"is_speech": bool, "probability": float}` per frame, in order. The
//! connection is established once at startup; an unreachable service
//! prevents the pipeline from starting.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use avatar_voice_core::{Error, Result, VadVerdict, VoiceActivityService};

struct VadChannel {
    writer: OwnedWriteHalf,
    reader: BufReader<OwnedReadHalf>,
    line: String,
}

/// Persistent-connection VAD client
pub struct TcpVadClient {
    channel: Mutex<VadChannel>,
    timeout: Duration,
}

impl TcpVadClient {
    /// Connect to the service; fails fast if it is unreachable
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::Vad(format!("connect to {addr} failed: {e}")))?;
        let _ = stream.set_nodelay(true);

        tracing::info!(addr, "Connected to voice-activity service");

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            channel: Mutex::new(VadChannel {
                writer: write_half,
                reader: BufReader::new(read_half),
                line: String::new(),
            }),
            timeout,
        })
    }
}

#[async_trait]
impl VoiceActivityService for TcpVadClient {
    async fn classify(&self, frame: &[f32]) -> Result<VadVerdict> {
        let mut bytes = Vec::with_capacity(frame.len() * 4);
        for sample in frame {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }

        let mut channel = self.channel.lock().await;

        let round_trip = async {
            channel.writer.write_all(&bytes).await?;
            channel.line.clear();
            let read = {
                let VadChannel { reader, line, .. } = &mut *channel;
                reader.read_line(line).await?
            };
            Ok::<usize, std::io::Error>(read)
        };

        let read = tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| Error::Vad("round trip timed out".into()))?
            .map_err(|e| Error::Vad(e.to_string()))?;

        if read == 0 {
            return Err(Error::Vad("service closed the connection".into()));
        }

        serde_json::from_str(channel.line.trim())
            .map_err(|e| Error::Vad(format!("malformed reply: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Minimal in-process stand-in for the service: echoes a verdict per frame.
    async fn spawn_stub_service(frame_samples: usize) -> String {
        use tokio::io::AsyncReadExt;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; frame_samples * 4];
            loop {
                if socket.read_exact(&mut buf).await.is_err() {
                    break;
                }
                let first = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
                let is_speech = first.abs() > 0.1;
                let reply = format!(
                    "{{\"is_speech\": {}, \"probability\": {}}}\n",
                    is_speech,
                    if is_speech { 0.95 } else { 0.05 }
                );
                if socket.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
        });

        addr
    }

    #[tokio::test]
    async fn test_round_trip_in_order() {
        let addr = spawn_stub_service(512).await;
        let client = TcpVadClient::connect(&addr, Duration::from_secs(1))
            .await
            .unwrap();

        let silence = vec![0.0f32; 512];
        let speech = vec![0.5f32; 512];

        assert!(!client.classify(&silence).await.unwrap().is_speech);
        assert!(client.classify(&speech).await.unwrap().is_speech);
        assert!(!client.classify(&silence).await.unwrap().is_speech);
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_fast() {
        let result = TcpVadClient::connect("127.0.0.1:1", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(Error::Vad(_))));
    }
}
