// The only component allowed to talk to the rendering backend. Owns the
// handle and the session state; every other component reads the session
// through snapshots and mutates it only by issuing commands here.

use tracing::{debug, info, trace, warn};

use crate::backend::{PlaybackChange, PlayerBackend, PlayerEvent};
use crate::session::PlaybackSession;

/// Issues fire-and-forget commands against the owned backend handle and
/// refreshes the session from backend-reported state.
///
/// Until the backend reports ready, every command is a silent no-op: the
/// remote handle does not exist yet and there is nothing to talk to.
pub struct CommandDispatcher {
    session: PlaybackSession,
    backend: Option<Box<dyn PlayerBackend>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self {
            session: PlaybackSession::default(),
            backend: None,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready
    }

    /// Replace the owned handle wholesale. Any previous handle is disposed
    /// first and the session restarts from its initial values.
    pub async fn bind(&mut self, backend: Box<dyn PlayerBackend>) {
        self.release().await;
        self.backend = Some(backend);
    }

    /// Dispose the current handle and reset the session.
    pub async fn release(&mut self) {
        if let Some(mut old) = self.backend.take() {
            debug!("disposing backend handle");
            old.destroy().await;
        }
        self.session = PlaybackSession::default();
    }

    fn ready_backend(&self) -> Option<&dyn PlayerBackend> {
        if !self.session.is_ready {
            trace!("command dropped: backend not ready");
            return None;
        }
        self.backend.as_deref()
    }

    pub async fn play(&self) {
        let Some(backend) = self.ready_backend() else {
            return;
        };
        trace!("play");
        if let Err(e) = backend.play().await {
            warn!("play failed: {e}");
        }
    }

    pub async fn pause(&self) {
        let Some(backend) = self.ready_backend() else {
            return;
        };
        trace!("pause");
        if let Err(e) = backend.pause().await {
            warn!("pause failed: {e}");
        }
    }

    /// Seek to an absolute time, clamped to the media range. The session
    /// position moves immediately so the overlay does not wait for the
    /// next poll.
    pub async fn seek_to(&mut self, seconds: f64) {
        let target = self.session.clamp_time(seconds);
        let Some(backend) = self.ready_backend() else {
            return;
        };
        trace!(target, "seek");
        if let Err(e) = backend.seek_to(target, true).await {
            warn!("seek failed: {e}");
        }
        self.session.position = target;
    }

    /// Seek relative to the current position.
    pub async fn seek_by(&mut self, delta: f64) {
        let target = self.session.position + delta;
        self.seek_to(target).await;
    }

    /// Set the volume level, clamped to [0, 100]. Dropping to zero counts
    /// as muting; raising it while muted unmutes.
    pub async fn set_volume(&mut self, level: u8) {
        let level = level.min(100);
        let Some(backend) = self.ready_backend() else {
            return;
        };
        trace!(level, "set volume");
        if let Err(e) = backend.set_volume(level).await {
            warn!("set volume failed: {e}");
        }
        if level == 0 {
            self.session.is_muted = true;
        } else if self.session.is_muted {
            if let Err(e) = backend.unmute().await {
                warn!("unmute failed: {e}");
            }
            self.session.is_muted = false;
        }
        self.session.volume = level;
    }

    /// Step the volume by a signed amount of percent points.
    pub async fn step_volume(&mut self, delta: i16) {
        let level = (self.session.volume as i16 + delta).clamp(0, 100) as u8;
        self.set_volume(level).await;
    }

    pub async fn toggle_mute(&mut self) {
        let Some(backend) = self.ready_backend() else {
            return;
        };
        if self.session.is_muted {
            trace!("unmute");
            if let Err(e) = backend.unmute().await {
                warn!("unmute failed: {e}");
            }
            // Restore the pre-mute level the backend may have zeroed.
            if let Err(e) = backend.set_volume(self.session.volume).await {
                warn!("volume restore failed: {e}");
            }
            self.session.is_muted = false;
        } else {
            trace!("mute");
            if let Err(e) = backend.mute().await {
                warn!("mute failed: {e}");
            }
            self.session.is_muted = true;
        }
    }

    /// Advance to the next playback rate in the fixed rotation.
    pub async fn cycle_rate(&mut self) {
        let Some(backend) = self.ready_backend() else {
            return;
        };
        let next = self.session.rate.cycle();
        trace!(rate = next.as_f64(), "cycle playback rate");
        if let Err(e) = backend.set_rate(next.as_f64()).await {
            warn!("set rate failed: {e}");
        }
        self.session.rate = next;
    }

    /// Refresh position and buffered fraction from the backend's
    /// authoritative values. The caller suppresses this while a scrub drag
    /// is live.
    pub async fn poll(&mut self) {
        let Some(backend) = self.ready_backend() else {
            return;
        };
        let position = backend.current_time().await;
        let buffered = backend.loaded_fraction().await;
        self.session.position = self.session.clamp_time(position);
        self.session.buffered = buffered.clamp(0.0, 1.0);
    }

    /// Apply a backend lifecycle event to the session.
    pub async fn apply_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Ready => {
                self.session.is_ready = true;
                if let Some(backend) = &self.backend {
                    self.session.duration = backend.duration().await;
                    let volume = backend.volume().await;
                    // Some backends report 0 before any volume was set.
                    self.session.volume = if volume == 0 { 100 } else { volume.min(100) };
                    self.session.is_muted = backend.is_muted().await;
                }
                info!(duration = self.session.duration, "backend ready");
            }
            PlayerEvent::StateChanged(PlaybackChange::Playing) => {
                self.session.is_playing = true;
            }
            PlayerEvent::StateChanged(PlaybackChange::Paused) => {
                self.session.is_playing = false;
            }
            PlayerEvent::StateChanged(PlaybackChange::Ended) => {
                debug!("playback ended");
                self.session.is_playing = false;
            }
            PlayerEvent::StateChanged(PlaybackChange::Buffering) => {
                if let Some(backend) = &self.backend {
                    self.session.buffered = backend.loaded_fraction().await.clamp(0.0, 1.0);
                }
            }
            PlayerEvent::Error(code) => {
                // Non-fatal: playback stays in its last known state and the
                // user must re-trigger. No automatic retry.
                warn!(code, "backend playback error");
            }
        }
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::PlaybackRate;
    use crate::test_utils::FakeBackend;

    async fn ready_dispatcher(backend: &FakeBackend) -> CommandDispatcher {
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.bind(Box::new(backend.clone())).await;
        dispatcher.apply_event(PlayerEvent::Ready).await;
        dispatcher
    }

    #[tokio::test]
    async fn commands_before_ready_are_dropped() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.bind(Box::new(backend.clone())).await;

        dispatcher.play().await;
        dispatcher.seek_to(100.0).await;
        dispatcher.set_volume(50).await;
        dispatcher.toggle_mute().await;
        dispatcher.cycle_rate().await;

        let state = backend.state.lock().unwrap();
        assert!(!state.playing);
        assert!(state.seeks.is_empty());
        assert_eq!(state.volume, 100);
        assert!(!state.muted);
        assert_eq!(dispatcher.session().rate, PlaybackRate::Normal);
    }

    #[tokio::test]
    async fn ready_primes_session_from_backend() {
        let backend = FakeBackend::with_duration(600.0);
        backend.state.lock().unwrap().volume = 40;
        let dispatcher = ready_dispatcher(&backend).await;

        assert!(dispatcher.is_ready());
        assert_eq!(dispatcher.session().duration, 600.0);
        assert_eq!(dispatcher.session().volume, 40);
    }

    #[tokio::test]
    async fn ready_with_zero_volume_defaults_to_full() {
        let backend = FakeBackend::with_duration(600.0);
        backend.state.lock().unwrap().volume = 0;
        let dispatcher = ready_dispatcher(&backend).await;
        assert_eq!(dispatcher.session().volume, 100);
    }

    #[tokio::test]
    async fn seek_clamps_to_media_range() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&backend).await;

        dispatcher.seek_to(700.0).await;
        assert_eq!(dispatcher.session().position, 600.0);
        dispatcher.seek_to(-5.0).await;
        assert_eq!(dispatcher.session().position, 0.0);

        assert_eq!(backend.seeks(), vec![600.0, 0.0]);
    }

    #[tokio::test]
    async fn relative_seek_moves_from_current_position() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&backend).await;

        dispatcher.seek_to(120.0).await;
        dispatcher.seek_by(10.0).await;
        assert_eq!(dispatcher.session().position, 130.0);
        dispatcher.seek_by(-200.0).await;
        assert_eq!(dispatcher.session().position, 0.0);
    }

    #[tokio::test]
    async fn volume_zero_mutes_and_raising_unmutes() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&backend).await;

        dispatcher.set_volume(0).await;
        assert!(dispatcher.session().is_muted);

        dispatcher.set_volume(30).await;
        assert!(!dispatcher.session().is_muted);
        assert_eq!(dispatcher.session().volume, 30);
        assert!(!backend.state.lock().unwrap().muted);
    }

    #[tokio::test]
    async fn volume_steps_clamp_at_bounds() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&backend).await;

        dispatcher.step_volume(10).await;
        assert_eq!(dispatcher.session().volume, 100);

        for _ in 0..12 {
            dispatcher.step_volume(-10).await;
        }
        assert_eq!(dispatcher.session().volume, 0);
    }

    #[tokio::test]
    async fn unmute_restores_previous_level() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&backend).await;

        dispatcher.set_volume(55).await;
        dispatcher.toggle_mute().await;
        assert!(dispatcher.session().is_muted);
        assert!(backend.state.lock().unwrap().muted);

        dispatcher.toggle_mute().await;
        assert!(!dispatcher.session().is_muted);
        assert_eq!(backend.state.lock().unwrap().volume, 55);
    }

    #[tokio::test]
    async fn rate_cycles_through_backend() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&backend).await;

        dispatcher.cycle_rate().await;
        assert_eq!(dispatcher.session().rate, PlaybackRate::X1_25);
        assert_eq!(backend.state.lock().unwrap().rate, 1.25);

        for _ in 0..7 {
            dispatcher.cycle_rate().await;
        }
        assert_eq!(dispatcher.session().rate, PlaybackRate::X1_25);
    }

    #[tokio::test]
    async fn poll_refreshes_position_and_buffered() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&backend).await;

        {
            let mut state = backend.state.lock().unwrap();
            state.time = 42.5;
            state.loaded = 0.8;
        }
        dispatcher.poll().await;
        assert_eq!(dispatcher.session().position, 42.5);
        assert_eq!(dispatcher.session().buffered, 0.8);
    }

    #[tokio::test]
    async fn poll_never_reports_past_duration() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&backend).await;

        backend.state.lock().unwrap().time = 601.3;
        dispatcher.poll().await;
        assert_eq!(dispatcher.session().position, 600.0);
    }

    #[tokio::test]
    async fn ended_forces_not_playing() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&backend).await;

        dispatcher
            .apply_event(PlayerEvent::StateChanged(PlaybackChange::Playing))
            .await;
        assert!(dispatcher.session().is_playing);

        dispatcher
            .apply_event(PlayerEvent::StateChanged(PlaybackChange::Ended))
            .await;
        assert!(!dispatcher.session().is_playing);
    }

    #[tokio::test]
    async fn error_leaves_session_untouched() {
        let backend = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&backend).await;

        dispatcher
            .apply_event(PlayerEvent::StateChanged(PlaybackChange::Playing))
            .await;
        let before = dispatcher.session().clone();

        dispatcher.apply_event(PlayerEvent::Error(150)).await;
        assert_eq!(dispatcher.session(), &before);
    }

    #[tokio::test]
    async fn rebinding_disposes_the_old_handle() {
        let first = FakeBackend::with_duration(600.0);
        let mut dispatcher = ready_dispatcher(&first).await;
        dispatcher.seek_to(100.0).await;

        let second = FakeBackend::with_duration(120.0);
        dispatcher.bind(Box::new(second.clone())).await;

        assert!(first.state.lock().unwrap().destroyed);
        // Fresh session: nothing carries across targets.
        assert!(!dispatcher.is_ready());
        assert_eq!(dispatcher.session().position, 0.0);
    }
}
