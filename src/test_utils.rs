#![cfg(test)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::backend::{BackendFactory, PlayerBackend, PlayerEvent, PlayerOptions, TargetId};
use crate::fullscreen::{FullscreenApi, Orientation, Platform, PlatformError, SharePayload};

/// Recorded state of a fake backend handle. Tests inspect and mutate it
/// directly through the shared `Arc<Mutex<..>>`.
#[derive(Debug)]
pub struct FakeBackendState {
    pub playing: bool,
    pub muted: bool,
    pub volume: u8,
    pub rate: f64,
    pub time: f64,
    pub duration: f64,
    pub loaded: f64,
    pub seeks: Vec<f64>,
    pub destroyed: bool,
}

impl Default for FakeBackendState {
    fn default() -> Self {
        Self {
            playing: false,
            muted: false,
            volume: 100,
            rate: 1.0,
            time: 0.0,
            duration: 0.0,
            loaded: 0.0,
            seeks: Vec::new(),
            destroyed: false,
        }
    }
}

/// In-memory backend double. Clones share one state so tests keep a handle
/// to what the dispatcher owns.
#[derive(Clone)]
pub struct FakeBackend {
    pub state: Arc<Mutex<FakeBackendState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeBackendState::default())),
        }
    }

    pub fn with_duration(duration: f64) -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().duration = duration;
        backend
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().unwrap().seeks.clone()
    }
}

#[async_trait]
impl PlayerBackend for FakeBackend {
    async fn play(&self) -> Result<()> {
        self.state.lock().unwrap().playing = true;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.state.lock().unwrap().playing = false;
        Ok(())
    }

    async fn seek_to(&self, seconds: f64, _allow_seek_ahead: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.seeks.push(seconds);
        state.time = seconds;
        Ok(())
    }

    async fn current_time(&self) -> f64 {
        self.state.lock().unwrap().time
    }

    async fn duration(&self) -> f64 {
        self.state.lock().unwrap().duration
    }

    async fn loaded_fraction(&self) -> f64 {
        self.state.lock().unwrap().loaded
    }

    async fn set_volume(&self, level: u8) -> Result<()> {
        self.state.lock().unwrap().volume = level;
        Ok(())
    }

    async fn volume(&self) -> u8 {
        self.state.lock().unwrap().volume
    }

    async fn mute(&self) -> Result<()> {
        self.state.lock().unwrap().muted = true;
        Ok(())
    }

    async fn unmute(&self) -> Result<()> {
        self.state.lock().unwrap().muted = false;
        Ok(())
    }

    async fn is_muted(&self) -> bool {
        self.state.lock().unwrap().muted
    }

    async fn set_rate(&self, rate: f64) -> Result<()> {
        self.state.lock().unwrap().rate = rate;
        Ok(())
    }

    async fn destroy(&mut self) {
        self.state.lock().unwrap().destroyed = true;
    }
}

/// Factory double that records every connect and keeps the event senders
/// so tests can emit backend lifecycle events.
#[derive(Clone)]
pub struct FakeFactory {
    duration: f64,
    pub created: Arc<Mutex<Vec<FakeBackend>>>,
    senders: Arc<Mutex<Vec<mpsc::UnboundedSender<PlayerEvent>>>>,
    targets: Arc<Mutex<Vec<TargetId>>>,
}

impl FakeFactory {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            created: Arc::new(Mutex::new(Vec::new())),
            senders: Arc::new(Mutex::new(Vec::new())),
            targets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The most recently connected backend.
    pub fn latest(&self) -> FakeBackend {
        self.created.lock().unwrap().last().expect("no backend connected").clone()
    }

    pub fn targets(&self) -> Vec<TargetId> {
        self.targets.lock().unwrap().clone()
    }

    /// Emit a lifecycle event from the most recent backend.
    pub fn emit(&self, event: PlayerEvent) {
        let senders = self.senders.lock().unwrap();
        let sender = senders.last().expect("no backend connected");
        sender.send(event).expect("surface dropped event channel");
    }
}

impl BackendFactory for FakeFactory {
    fn connect(
        &self,
        target: &TargetId,
        _options: &PlayerOptions,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Result<Box<dyn PlayerBackend>> {
        let backend = FakeBackend::with_duration(self.duration);
        self.created.lock().unwrap().push(backend.clone());
        self.senders.lock().unwrap().push(events);
        self.targets.lock().unwrap().push(target.clone());
        Ok(Box::new(backend))
    }
}

/// Recorded state of the fake platform.
#[derive(Debug)]
pub struct FakePlatformState {
    pub supported: Vec<FullscreenApi>,
    pub active: bool,
    pub deny_fullscreen: bool,
    pub orientation_lock: bool,
    pub deny_orientation: bool,
    pub locked: Option<Orientation>,
    pub touch: bool,
    pub share_supported: bool,
    pub enter_calls: Vec<FullscreenApi>,
    pub exit_calls: Vec<FullscreenApi>,
    pub shared: Vec<SharePayload>,
    pub clipboard: Vec<String>,
}

impl Default for FakePlatformState {
    fn default() -> Self {
        Self {
            supported: FullscreenApi::ENTER_ORDER.to_vec(),
            active: false,
            deny_fullscreen: false,
            orientation_lock: false,
            deny_orientation: false,
            locked: None,
            touch: false,
            share_supported: false,
            enter_calls: Vec::new(),
            exit_calls: Vec::new(),
            shared: Vec::new(),
            clipboard: Vec::new(),
        }
    }
}

/// Platform double granting fullscreen immediately unless told to deny.
/// Tests still replay the change notification themselves, matching the
/// real contract where state follows notifications only.
pub struct FakePlatform {
    pub state: Arc<Mutex<FakePlatformState>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakePlatformState::default())),
        }
    }

    pub fn set_supported(&self, apis: &[FullscreenApi]) {
        self.state.lock().unwrap().supported = apis.to_vec();
    }

    pub fn set_touch(&self, touch: bool) {
        self.state.lock().unwrap().touch = touch;
    }

    pub fn set_orientation_lock(&self, available: bool) {
        self.state.lock().unwrap().orientation_lock = available;
    }

    pub fn deny_fullscreen(&self) {
        self.state.lock().unwrap().deny_fullscreen = true;
    }

    pub fn deny_orientation(&self) {
        self.state.lock().unwrap().deny_orientation = true;
    }

    pub fn set_share_supported(&self, supported: bool) {
        self.state.lock().unwrap().share_supported = supported;
    }

    pub fn locked(&self) -> Option<Orientation> {
        self.state.lock().unwrap().locked
    }

    pub fn enter_calls(&self) -> Vec<FullscreenApi> {
        self.state.lock().unwrap().enter_calls.clone()
    }

    pub fn exit_calls(&self) -> Vec<FullscreenApi> {
        self.state.lock().unwrap().exit_calls.clone()
    }

    pub fn shared(&self) -> Vec<SharePayload> {
        self.state.lock().unwrap().shared.clone()
    }

    pub fn clipboard(&self) -> Vec<String> {
        self.state.lock().unwrap().clipboard.clone()
    }
}

#[async_trait]
impl Platform for FakePlatform {
    fn supports(&self, api: FullscreenApi) -> bool {
        self.state.lock().unwrap().supported.contains(&api)
    }

    fn fullscreen_element(&self, api: FullscreenApi) -> bool {
        let state = self.state.lock().unwrap();
        state.active && state.supported.contains(&api)
    }

    async fn enter_fullscreen(&self, api: FullscreenApi) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.enter_calls.push(api);
        if state.deny_fullscreen {
            return Err(PlatformError::Denied);
        }
        state.active = true;
        Ok(())
    }

    async fn exit_fullscreen(&self, api: FullscreenApi) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.exit_calls.push(api);
        state.active = false;
        Ok(())
    }

    fn supports_orientation_lock(&self) -> bool {
        self.state.lock().unwrap().orientation_lock
    }

    async fn lock_orientation(&self, orientation: Orientation) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.deny_orientation {
            return Err(PlatformError::Denied);
        }
        state.locked = Some(orientation);
        Ok(())
    }

    fn unlock_orientation(&self) {
        self.state.lock().unwrap().locked = None;
    }

    fn is_touch(&self) -> bool {
        self.state.lock().unwrap().touch
    }

    async fn share(&self, payload: &SharePayload) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if !state.share_supported {
            return Err(PlatformError::Unsupported);
        }
        state.shared.push(payload.clone());
        Ok(())
    }

    async fn clipboard_write(&self, text: &str) -> Result<(), PlatformError> {
        self.state.lock().unwrap().clipboard.push(text.to_string());
        Ok(())
    }
}
