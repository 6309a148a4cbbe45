//! Avatar and audio-output collaborator traits

use async_trait::async_trait;

use crate::Result;

/// Avatar rendering engine
///
/// All calls are fire-and-forget; no return value is consumed by the
/// pipeline. Implementations must not block the caller.
pub trait AvatarController: Send + Sync + 'static {
    /// Begin mouth animation against the given audio
    fn start_lip_sync(&self, audio: &[u8]);

    /// Stop any running mouth animation
    fn stop_lip_sync(&self);

    /// Trigger a discrete motion clip by index
    fn trigger_motion(&self, index: usize);
}

/// Avatar that does nothing; headless operation and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAvatar;

impl AvatarController for NoopAvatar {
    fn start_lip_sync(&self, _audio: &[u8]) {}
    fn stop_lip_sync(&self) {}
    fn trigger_motion(&self, _index: usize) {}
}

/// Audio output device
///
/// Exactly one writer at a time: the playback worker. `play` blocks the
/// worker for the full duration of the item; `stop` may be called from any
/// other task and must take effect immediately and idempotently.
#[async_trait]
pub trait AudioSink: Send + Sync + 'static {
    /// Play a complete audio container, returning when playback completes
    /// or is externally stopped
    async fn play(&self, audio: &[u8]) -> Result<()>;

    /// Stop playback immediately; no-op when nothing is playing
    fn stop(&self);
}
