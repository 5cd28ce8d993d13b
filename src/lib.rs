// Headless control core for an embedded video playback surface.
// Embedders feed input through a SurfaceHandle and render the published
// OverlaySnapshot values; the rendering backend and the host platform are
// injected behind narrow trait contracts.

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod fullscreen;
pub mod gesture;
pub mod keyboard;
pub mod scrub;
pub mod session;
pub mod surface;
mod test_utils;
pub mod visibility;

pub use backend::{
    BackendFactory, PlaybackChange, PlayerBackend, PlayerEvent, PlayerOptions, TargetId,
};
pub use config::ControlsConfig;
pub use fullscreen::{FullscreenApi, Orientation, Platform, PlatformError, SharePayload};
pub use keyboard::{Key, KeyCommand};
pub use scrub::TrackBounds;
pub use session::{PlaybackRate, PlaybackSession};
pub use surface::{CenterIcon, ControlInput, ControlSurface, OverlaySnapshot, SurfaceHandle};
