use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

/// Identifier of a playback target understood by the rendering backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(pub String);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Options handed to the backend when a target is bound.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub autoplay: bool,
    /// Initial position in seconds.
    pub start_at: f64,
    /// Prefer inline rendering over the platform's native fullscreen player.
    pub inline_playback: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            autoplay: true,
            start_at: 0.0,
            inline_playback: true,
        }
    }
}

/// Playback phases reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackChange {
    Playing,
    Paused,
    Ended,
    Buffering,
}

/// Lifecycle events emitted by a backend handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The handle exists and accepts commands; duration and volume are readable.
    Ready,
    StateChanged(PlaybackChange),
    /// Non-fatal playback error with the backend's numeric code.
    Error(i32),
}

/// Narrow command/query contract over the opaque rendering backend.
///
/// Commands are fire-and-forget from the caller's perspective; a failed call
/// is logged by the dispatcher and playback continues in its last known state.
#[async_trait]
pub trait PlayerBackend: Send + Sync {
    async fn play(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn seek_to(&self, seconds: f64, allow_seek_ahead: bool) -> Result<()>;
    async fn current_time(&self) -> f64;
    async fn duration(&self) -> f64;
    /// Buffered fraction in [0, 1].
    async fn loaded_fraction(&self) -> f64;
    async fn set_volume(&self, level: u8) -> Result<()>;
    async fn volume(&self) -> u8;
    async fn mute(&self) -> Result<()>;
    async fn unmute(&self) -> Result<()>;
    async fn is_muted(&self) -> bool;
    async fn set_rate(&self, rate: f64) -> Result<()>;
    /// Dispose the handle. Further commands on it are undefined; the
    /// dispatcher drops the handle right after this resolves.
    async fn destroy(&mut self);
}

/// Creates backend handles for bound targets.
///
/// Lifecycle events for the returned handle flow through `events`; the
/// surface owns the receiving side and forwards them into its input loop.
pub trait BackendFactory: Send {
    fn connect(
        &self,
        target: &TargetId,
        options: &PlayerOptions,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Result<Box<dyn PlayerBackend>>;
}
