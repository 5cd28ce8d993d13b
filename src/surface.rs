// The control surface: a single event loop that owns every control
// component, runs the timers, and publishes render-ready snapshots.
// All state transitions happen inside `run`, one input at a time.

use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::backend::{BackendFactory, PlayerEvent, PlayerOptions, TargetId};
use crate::config::ControlsConfig;
use crate::dispatcher::CommandDispatcher;
use crate::fullscreen::{FullscreenManager, Platform, PlatformError, SharePayload};
use crate::gesture::{GestureRecognizer, TapDecision, TapZone};
use crate::keyboard::{self, Key, KeyCommand};
use crate::scrub::{ScrubController, TrackBounds};
use crate::session::PlaybackSession;
use crate::visibility::ControlsVisibility;

/// Transient feedback glyph flashed at the center of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterIcon {
    Play,
    Pause,
    Forward,
    Backward,
}

/// Render-ready state published to the embedding page layer.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySnapshot {
    pub session: PlaybackSession,
    /// Time to display: the scrub preview while dragging, else the
    /// session position. Never regresses mid-drag.
    pub position: f64,
    pub controls_visible: bool,
    pub is_fullscreen: bool,
    pub center_icon: Option<CenterIcon>,
}

/// Inputs accepted by the control surface.
#[derive(Debug)]
pub enum ControlInput {
    /// Bind a new playback target, replacing any current session.
    Load(TargetId),
    /// Dispose the current session without binding a new target.
    Unload,

    /// Touch or pointer press on the video surface, with the press
    /// x-coordinate and the surface width.
    SurfacePressed { x: f64, width: f64 },
    /// Pointer moved over the surface (non-touch).
    PointerMoved,
    /// Pointer left the surface (non-touch).
    PointerLeft,

    /// Drag started on the progress track.
    ScrubBegin { x: f64, track: TrackBounds },
    ScrubMove { x: f64 },
    ScrubEnd,

    // Overlay buttons and keyboard share one command vocabulary.
    PlayPause,
    SeekForward,
    SeekBackward,
    SeekTo(f64),
    SetVolume(u8),
    VolumeUp,
    VolumeDown,
    ToggleMute,
    CycleRate,
    ToggleFullscreen,
    ExitFullscreen,
    Share { title: String, url: String },

    /// Backend lifecycle event, forwarded from the factory's event channel.
    Backend(PlayerEvent),
    /// Platform fullscreen-change notification (any vendor variant).
    FullscreenChanged(bool),

    // Timer-fed inputs.
    PollTick,
    HideControls,
    TapTimerFired(TapZone),
    CenterIconTimeout,
}

/// Clonable handle for feeding the surface and observing snapshots.
#[derive(Clone)]
pub struct SurfaceHandle {
    input: mpsc::UnboundedSender<ControlInput>,
    snapshot: watch::Receiver<OverlaySnapshot>,
}

impl SurfaceHandle {
    pub fn send(&self, input: ControlInput) -> Result<()> {
        self.input
            .send(input)
            .map_err(|_| anyhow!("control surface disconnected"))
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> OverlaySnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch receiver for change-driven rendering.
    pub fn subscribe(&self) -> watch::Receiver<OverlaySnapshot> {
        self.snapshot.clone()
    }

    /// Feed a key press. Returns true when the key was consumed, in which
    /// case the embedder must suppress the platform default. Wire this on
    /// non-touch surfaces only; the gesture recognizer covers touch.
    pub fn key_pressed(&self, key: Key, in_text_input: bool) -> bool {
        let is_fullscreen = self.snapshot.borrow().is_fullscreen;
        let Some(command) = keyboard::command_for_key(key, is_fullscreen, in_text_input) else {
            return false;
        };
        let input = match command {
            KeyCommand::TogglePlay => ControlInput::PlayPause,
            KeyCommand::SeekForward => ControlInput::SeekForward,
            KeyCommand::SeekBackward => ControlInput::SeekBackward,
            KeyCommand::VolumeUp => ControlInput::VolumeUp,
            KeyCommand::VolumeDown => ControlInput::VolumeDown,
            KeyCommand::ToggleMute => ControlInput::ToggleMute,
            KeyCommand::ToggleFullscreen => ControlInput::ToggleFullscreen,
            KeyCommand::ExitFullscreen => ControlInput::ExitFullscreen,
        };
        self.input.send(input).is_ok()
    }
}

/// Owns the control components and processes inputs one at a time.
pub struct ControlSurface {
    config: ControlsConfig,
    platform: Arc<dyn Platform>,
    factory: Box<dyn BackendFactory>,
    options: PlayerOptions,

    dispatcher: CommandDispatcher,
    scrub: ScrubController,
    gesture: GestureRecognizer,
    visibility: ControlsVisibility,
    fullscreen: FullscreenManager,
    center_icon: Option<CenterIcon>,
    track: Option<TrackBounds>,

    input_tx: mpsc::UnboundedSender<ControlInput>,
    input_rx: mpsc::UnboundedReceiver<ControlInput>,
    snapshot_tx: watch::Sender<OverlaySnapshot>,

    // At most one live task per purpose; aborted on replacement and on
    // target change.
    pending_tap: Option<JoinHandle<()>>,
    icon_timer: Option<JoinHandle<()>>,
    poll_task: Option<JoinHandle<()>>,
    event_pump: Option<JoinHandle<()>>,
}

impl ControlSurface {
    pub fn new(
        config: ControlsConfig,
        platform: Arc<dyn Platform>,
        factory: Box<dyn BackendFactory>,
        options: PlayerOptions,
    ) -> (SurfaceHandle, ControlSurface) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let initial = OverlaySnapshot {
            session: PlaybackSession::default(),
            position: 0.0,
            controls_visible: true,
            is_fullscreen: false,
            center_icon: None,
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let surface = ControlSurface {
            visibility: ControlsVisibility::new(config.auto_hide()),
            gesture: GestureRecognizer::new(config.tap_window()),
            config,
            platform,
            factory,
            options,
            dispatcher: CommandDispatcher::new(),
            scrub: ScrubController::new(),
            fullscreen: FullscreenManager::new(),
            center_icon: None,
            track: None,
            input_tx: input_tx.clone(),
            input_rx,
            snapshot_tx,
            pending_tap: None,
            icon_timer: None,
            poll_task: None,
            event_pump: None,
        };
        let handle = SurfaceHandle {
            input: input_tx,
            snapshot: snapshot_rx,
        };
        (handle, surface)
    }

    /// Drain inputs until every handle is dropped.
    pub async fn run(mut self) {
        debug!("control surface loop started");
        while let Some(input) = self.input_rx.recv().await {
            self.handle_input(input).await;
            self.publish();
        }
        self.teardown().await;
        debug!("control surface loop terminated");
    }

    async fn handle_input(&mut self, input: ControlInput) {
        match input {
            ControlInput::Load(target) => self.load(target).await,
            ControlInput::Unload => self.teardown().await,

            ControlInput::SurfacePressed { x, width } => self.surface_pressed(x, width).await,
            ControlInput::PointerMoved => {
                if !self.platform.is_touch() {
                    self.show_controls();
                }
            }
            ControlInput::PointerLeft => {
                if !self.platform.is_touch()
                    && self.dispatcher.session().is_playing
                    && !self.scrub.is_dragging()
                {
                    self.visibility.hide();
                }
            }

            ControlInput::ScrubBegin { x, track } => {
                self.track = Some(track);
                let duration = self.dispatcher.session().duration;
                self.scrub.begin(x, track, duration);
                // Controls stay up through the whole drag: no deadline.
                self.show_controls();
            }
            ControlInput::ScrubMove { x } => {
                if let Some(track) = self.track {
                    let duration = self.dispatcher.session().duration;
                    self.scrub.update(x, track, duration);
                }
            }
            ControlInput::ScrubEnd => {
                if let Some(commit) = self.scrub.finish() {
                    self.dispatcher.seek_to(commit).await;
                }
                // The drag ended; re-arm the deadline if playing.
                self.show_controls();
            }

            ControlInput::PlayPause => {
                self.show_controls();
                self.toggle_play().await;
            }
            ControlInput::SeekForward => {
                self.show_controls();
                self.seek_relative(self.config.seek_step_secs).await;
            }
            ControlInput::SeekBackward => {
                self.show_controls();
                self.seek_relative(-self.config.seek_step_secs).await;
            }
            ControlInput::SeekTo(seconds) => {
                self.show_controls();
                self.dispatcher.seek_to(seconds).await;
            }
            ControlInput::SetVolume(level) => {
                self.show_controls();
                self.dispatcher.set_volume(level).await;
            }
            ControlInput::VolumeUp => {
                self.show_controls();
                self.dispatcher.step_volume(self.config.volume_step as i16).await;
            }
            ControlInput::VolumeDown => {
                self.show_controls();
                self.dispatcher.step_volume(-(self.config.volume_step as i16)).await;
            }
            ControlInput::ToggleMute => {
                self.show_controls();
                self.dispatcher.toggle_mute().await;
            }
            ControlInput::CycleRate => {
                self.show_controls();
                self.dispatcher.cycle_rate().await;
            }
            ControlInput::ToggleFullscreen => {
                self.show_controls();
                self.spawn_fullscreen_toggle();
            }
            ControlInput::ExitFullscreen => {
                if self.fullscreen.is_fullscreen() {
                    self.spawn_fullscreen_exit();
                }
            }
            ControlInput::Share { title, url } => self.spawn_share(title, url),

            ControlInput::Backend(event) => self.apply_backend_event(event).await,
            ControlInput::FullscreenChanged(active) => {
                self.fullscreen.on_change(active, self.platform.as_ref());
            }

            ControlInput::PollTick => {
                // Backend reads are suppressed while dragging so the shown
                // time cannot regress under the user's finger.
                if !self.scrub.is_dragging() {
                    self.dispatcher.poll().await;
                }
            }
            ControlInput::HideControls => {
                if self.dispatcher.session().is_playing && !self.scrub.is_dragging() {
                    self.visibility.hide();
                }
            }
            ControlInput::TapTimerFired(zone) => self.single_tap(zone).await,
            ControlInput::CenterIconTimeout => self.center_icon = None,
        }
    }

    // -- gestures ---------------------------------------------------------

    async fn surface_pressed(&mut self, x: f64, width: f64) {
        if !self.platform.is_touch() {
            // Desktop: a click on the surface is a plain play/pause toggle.
            self.toggle_play().await;
            return;
        }

        let zone = TapZone::classify(x, width);
        match self.gesture.on_tap(zone, Instant::now()) {
            TapDecision::Double(zone) => {
                self.cancel_pending_tap();
                self.double_tap(zone).await;
            }
            TapDecision::Deferred(zone) => self.arm_tap_timer(zone),
        }
    }

    async fn double_tap(&mut self, zone: TapZone) {
        trace!(?zone, "double tap");
        match zone {
            TapZone::Left => self.seek_relative(-self.config.seek_step_secs).await,
            TapZone::Right => self.seek_relative(self.config.seek_step_secs).await,
            TapZone::Center => {
                // Exit-only: a windowed double tap on the center band does
                // nothing.
                if self.fullscreen.is_fullscreen() {
                    self.spawn_fullscreen_toggle();
                }
            }
        }
    }

    async fn single_tap(&mut self, zone: TapZone) {
        self.pending_tap = None;
        trace!(?zone, "single tap resolved");
        if self.fullscreen.is_fullscreen() {
            self.toggle_play().await;
        } else if self.visibility.visible() {
            self.visibility.hide();
        } else {
            self.show_controls();
        }
    }

    fn arm_tap_timer(&mut self, zone: TapZone) {
        // A newer provisional tap replaces the pending timer.
        self.cancel_pending_tap();
        let tx = self.input_tx.clone();
        let window = self.config.tap_window();
        self.pending_tap = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = tx.send(ControlInput::TapTimerFired(zone));
        }));
    }

    fn cancel_pending_tap(&mut self) {
        if let Some(timer) = self.pending_tap.take() {
            timer.abort();
        }
    }

    // -- commands ---------------------------------------------------------

    async fn toggle_play(&mut self) {
        if !self.dispatcher.is_ready() {
            return;
        }
        if self.dispatcher.session().is_playing {
            self.dispatcher.pause().await;
            self.flash_icon(CenterIcon::Pause);
        } else {
            self.dispatcher.play().await;
            self.flash_icon(CenterIcon::Play);
        }
    }

    async fn seek_relative(&mut self, delta: f64) {
        if !self.dispatcher.is_ready() {
            return;
        }
        self.dispatcher.seek_by(delta).await;
        self.flash_icon(if delta >= 0.0 {
            CenterIcon::Forward
        } else {
            CenterIcon::Backward
        });
    }

    fn flash_icon(&mut self, icon: CenterIcon) {
        if let Some(timer) = self.icon_timer.take() {
            timer.abort();
        }
        self.center_icon = Some(icon);
        let tx = self.input_tx.clone();
        let hold = self.config.center_icon();
        self.icon_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            let _ = tx.send(ControlInput::CenterIconTimeout);
        }));
    }

    fn show_controls(&mut self) {
        let arm = self.dispatcher.session().is_playing && !self.scrub.is_dragging();
        self.visibility.show(arm, &self.input_tx);
    }

    // Platform calls run as detached tasks so a pending request never
    // blocks input handling; their outcomes come back as change
    // notifications or are swallowed.

    fn spawn_fullscreen_toggle(&self) {
        let platform = self.platform.clone();
        tokio::spawn(async move {
            FullscreenManager::toggle(platform.as_ref()).await;
        });
    }

    fn spawn_fullscreen_exit(&self) {
        let platform = self.platform.clone();
        tokio::spawn(async move {
            FullscreenManager::exit(platform.as_ref()).await;
        });
    }

    fn spawn_share(&self, title: String, url: String) {
        let platform = self.platform.clone();
        tokio::spawn(async move {
            let payload = SharePayload { title, url };
            match platform.share(&payload).await {
                Ok(()) => debug!("share sheet accepted"),
                Err(PlatformError::Unsupported) => {
                    // No share sheet on this platform: copy the link instead.
                    if let Err(e) = platform.clipboard_write(&payload.url).await {
                        warn!("clipboard fallback failed: {e}");
                    }
                }
                Err(e) => debug!("share dismissed: {e}"),
            }
        });
    }

    // -- backend lifecycle ------------------------------------------------

    async fn apply_backend_event(&mut self, event: PlayerEvent) {
        let was_playing = self.dispatcher.session().is_playing;
        self.dispatcher.apply_event(event).await;

        if self.dispatcher.is_ready() && self.poll_task.is_none() {
            self.start_poll();
        }
        if was_playing && !self.dispatcher.session().is_playing {
            // Pausing or ending always reveals the controls; with playback
            // stopped no deadline is armed.
            self.show_controls();
        }
    }

    fn start_poll(&mut self) {
        let tx = self.input_tx.clone();
        let every = self.config.poll_interval();
        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(ControlInput::PollTick).is_err() {
                    break;
                }
            }
        }));
    }

    async fn load(&mut self, target: TargetId) {
        info!(%target, "binding playback target");
        self.teardown().await;

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        match self.factory.connect(&target, &self.options, event_tx) {
            Ok(backend) => {
                self.dispatcher.bind(backend).await;
                let tx = self.input_tx.clone();
                self.event_pump = Some(tokio::spawn(async move {
                    while let Some(event) = event_rx.recv().await {
                        if tx.send(ControlInput::Backend(event)).is_err() {
                            break;
                        }
                    }
                }));
            }
            Err(e) => warn!(%target, "failed to connect backend: {e}"),
        }
    }

    /// Cancel every live timer, dispose the backend handle, and reset all
    /// component state. Nothing stale can fire against the next session.
    async fn teardown(&mut self) {
        self.cancel_pending_tap();
        if let Some(timer) = self.icon_timer.take() {
            timer.abort();
        }
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        if let Some(pump) = self.event_pump.take() {
            pump.abort();
        }
        self.dispatcher.release().await;
        self.scrub.reset();
        self.gesture.reset();
        self.visibility.reset();
        self.center_icon = None;
        self.track = None;
        // Fullscreen keeps mirroring the platform: a target change does not
        // report a fullscreen transition.
    }

    fn publish(&self) {
        let session = self.dispatcher.session().clone();
        let position = if self.scrub.is_dragging() {
            self.scrub.preview()
        } else {
            session.position
        };
        self.snapshot_tx.send_replace(OverlaySnapshot {
            position,
            controls_visible: self.visibility.visible(),
            is_fullscreen: self.fullscreen.is_fullscreen(),
            center_icon: self.center_icon,
            session,
        });
    }
}
