// Fullscreen and orientation negotiation across vendor-prefixed platform
// APIs. Variance is isolated into one ordered capability list; scattered
// per-vendor branches are not allowed anywhere else in the crate.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Vendor-prefixed fullscreen API variants, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenApi {
    Standard,
    WebkitRequest,
    /// Media-element inline-to-fullscreen, the iOS-style variant. Has no
    /// document-level exit or change notification.
    WebkitMediaElement,
    Moz,
    Ms,
}

impl FullscreenApi {
    /// Probe order when entering fullscreen: generic first, then vendors.
    pub const ENTER_ORDER: [FullscreenApi; 5] = [
        FullscreenApi::Standard,
        FullscreenApi::WebkitRequest,
        FullscreenApi::WebkitMediaElement,
        FullscreenApi::Moz,
        FullscreenApi::Ms,
    ];

    /// Probe order when exiting.
    pub const EXIT_ORDER: [FullscreenApi; 4] = [
        FullscreenApi::Standard,
        FullscreenApi::WebkitRequest,
        FullscreenApi::Moz,
        FullscreenApi::Ms,
    ];

    /// The change-notification name for this variant. Embedders must
    /// subscribe to every non-`None` entry so exits triggered outside this
    /// crate (a system back gesture) are still observed.
    pub fn change_event(&self) -> Option<&'static str> {
        match self {
            FullscreenApi::Standard => Some("fullscreenchange"),
            FullscreenApi::WebkitRequest => Some("webkitfullscreenchange"),
            FullscreenApi::WebkitMediaElement => None,
            FullscreenApi::Moz => Some("mozfullscreenchange"),
            FullscreenApi::Ms => Some("MSFullscreenChange"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
}

/// Content handed to the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub url: String,
}

/// Failures surfaced by platform capability calls. Callers swallow these;
/// authoritative state arrives through change notifications instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    #[error("capability denied by platform")]
    Denied,

    #[error("capability not supported")]
    Unsupported,
}

/// Host environment contract: fullscreen, orientation, share and clipboard.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Whether this API variant exists on the platform.
    fn supports(&self, api: FullscreenApi) -> bool;

    /// Whether this variant's accessor currently reports an active
    /// fullscreen element.
    fn fullscreen_element(&self, api: FullscreenApi) -> bool;

    async fn enter_fullscreen(&self, api: FullscreenApi) -> Result<(), PlatformError>;
    async fn exit_fullscreen(&self, api: FullscreenApi) -> Result<(), PlatformError>;

    fn supports_orientation_lock(&self) -> bool;
    async fn lock_orientation(&self, orientation: Orientation) -> Result<(), PlatformError>;
    fn unlock_orientation(&self);

    /// Touch/mobile form factor.
    fn is_touch(&self) -> bool;

    async fn share(&self, payload: &SharePayload) -> Result<(), PlatformError>;
    async fn clipboard_write(&self, text: &str) -> Result<(), PlatformError>;
}

/// Negotiates fullscreen transitions against the probed capability list.
///
/// The negotiation functions are free of instance state so the surface can
/// run them as detached tasks: a pending request must never block input
/// handling. `is_fullscreen` mirrors platform change notifications only;
/// the request path never sets it, since the platform may deny or delay
/// the transition.
pub struct FullscreenManager {
    is_fullscreen: bool,
}

impl FullscreenManager {
    pub fn new() -> Self {
        Self {
            is_fullscreen: false,
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    fn any_active(platform: &dyn Platform) -> bool {
        FullscreenApi::ENTER_ORDER
            .iter()
            .any(|api| platform.supports(*api) && platform.fullscreen_element(*api))
    }

    /// Enter fullscreen if no accessor reports one active, else exit.
    pub async fn toggle(platform: &dyn Platform) {
        if Self::any_active(platform) {
            Self::exit(platform).await;
        } else {
            Self::enter(platform).await;
        }
    }

    /// Request fullscreen via the first supported API variant. On success,
    /// touch form factors with lock capability get a landscape lock; a
    /// refused lock is non-fatal.
    pub async fn enter(platform: &dyn Platform) {
        let Some(api) = FullscreenApi::ENTER_ORDER
            .iter()
            .copied()
            .find(|api| platform.supports(*api))
        else {
            warn!("no fullscreen capability available");
            return;
        };

        match platform.enter_fullscreen(api).await {
            Ok(()) => {
                debug!(?api, "fullscreen requested");
                if platform.is_touch() && platform.supports_orientation_lock() {
                    if let Err(e) = platform.lock_orientation(Orientation::Landscape).await {
                        debug!("orientation lock refused: {e}");
                    }
                }
            }
            Err(e) => warn!(?api, "fullscreen request rejected: {e}"),
        }
    }

    /// Exit via the first supported API variant and unlock orientation.
    pub async fn exit(platform: &dyn Platform) {
        if let Some(api) = FullscreenApi::EXIT_ORDER
            .iter()
            .copied()
            .find(|api| platform.supports(*api))
        {
            if let Err(e) = platform.exit_fullscreen(api).await {
                warn!(?api, "fullscreen exit rejected: {e}");
            }
        }
        if platform.supports_orientation_lock() {
            platform.unlock_orientation();
        }
    }

    /// Apply a platform fullscreen-change notification. An exit observed
    /// here also unlocks orientation, covering transitions this component
    /// did not initiate.
    pub fn on_change(&mut self, active: bool, platform: &dyn Platform) {
        debug!(active, "fullscreen change notification");
        self.is_fullscreen = active;
        if !active && platform.supports_orientation_lock() {
            platform.unlock_orientation();
        }
    }
}

impl Default for FullscreenManager {
    fn default() -> Self {
        Self::new()
    }
}
