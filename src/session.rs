// Playback session state and the fixed playback-rate rotation.
// The session is the single source of truth for what the overlay renders;
// it is owned by the command dispatcher and cloned into published snapshots.

/// Selectable playback rates, in cycling order. Cycling wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackRate {
    X0_25,
    X0_5,
    X0_75,
    #[default]
    Normal,
    X1_25,
    X1_5,
    X1_75,
    X2,
}

impl PlaybackRate {
    pub const ALL: [PlaybackRate; 8] = [
        PlaybackRate::X0_25,
        PlaybackRate::X0_5,
        PlaybackRate::X0_75,
        PlaybackRate::Normal,
        PlaybackRate::X1_25,
        PlaybackRate::X1_5,
        PlaybackRate::X1_75,
        PlaybackRate::X2,
    ];

    pub fn as_f64(&self) -> f64 {
        match self {
            PlaybackRate::X0_25 => 0.25,
            PlaybackRate::X0_5 => 0.5,
            PlaybackRate::X0_75 => 0.75,
            PlaybackRate::Normal => 1.0,
            PlaybackRate::X1_25 => 1.25,
            PlaybackRate::X1_5 => 1.5,
            PlaybackRate::X1_75 => 1.75,
            PlaybackRate::X2 => 2.0,
        }
    }

    /// Next rate in the rotation, wrapping from 2x back to 0.25x.
    pub fn cycle(&self) -> Self {
        let index = Self::ALL.iter().position(|r| r == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn label(&self) -> String {
        match self {
            PlaybackRate::Normal => "Normal".to_string(),
            other => format!("{}x", other.as_f64()),
        }
    }
}

/// Mutable playback state mirrored from the rendering backend.
///
/// `is_ready` gates every command except target binding: until the backend
/// reports ready, the handle does not exist and commands are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub is_playing: bool,
    pub is_muted: bool,
    pub is_ready: bool,
    /// Volume level in [0, 100].
    pub volume: u8,
    pub rate: PlaybackRate,
    /// Current position in seconds. Never exceeds `duration` once ready.
    pub position: f64,
    /// Media duration in seconds; 0.0 until the backend reports ready.
    pub duration: f64,
    /// Buffered fraction in [0, 1].
    pub buffered: f64,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            is_playing: false,
            is_muted: false,
            is_ready: false,
            volume: 100,
            rate: PlaybackRate::default(),
            position: 0.0,
            duration: 0.0,
            buffered: 0.0,
        }
    }
}

impl PlaybackSession {
    /// Clamp a seek target into the valid range for this session.
    pub fn clamp_time(&self, seconds: f64) -> f64 {
        if self.duration > 0.0 {
            seconds.clamp(0.0, self.duration)
        } else {
            seconds.max(0.0)
        }
    }
}
