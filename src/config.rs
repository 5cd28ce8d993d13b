use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Timing and step tunables for the control surface.
///
/// Every behavioral window lives here as a named field so embedders can
/// tune them without recompiling; the defaults match the shipped behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsConfig {
    /// Width of the single/double tap disambiguation window, in ms.
    #[serde(default = "default_tap_window_ms")]
    pub tap_window_ms: u64,

    /// Idle time before the overlay auto-hides during playback, in ms.
    #[serde(default = "default_auto_hide_ms")]
    pub auto_hide_ms: u64,

    /// Backend state poll cadence, in ms.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long the center feedback glyph stays up, in ms.
    #[serde(default = "default_center_icon_ms")]
    pub center_icon_ms: u64,

    /// Relative seek step for double taps and arrow keys, in seconds.
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,

    /// Volume increment for arrow keys, in percent points.
    #[serde(default = "default_volume_step")]
    pub volume_step: u8,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            tap_window_ms: default_tap_window_ms(),
            auto_hide_ms: default_auto_hide_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            center_icon_ms: default_center_icon_ms(),
            seek_step_secs: default_seek_step_secs(),
            volume_step: default_volume_step(),
        }
    }
}

impl ControlsConfig {
    /// Load from the user config directory, falling back to defaults when
    /// no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading controls config from {:?}", path);
            let contents = fs::read_to_string(path).context("Failed to read config file")?;
            let config = toml::from_str(&contents).context("Failed to parse config file")?;
            Ok(config)
        } else {
            info!("No controls config found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;
        debug!("Controls config saved to {:?}", path);
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("overplay").join("config.toml"))
    }

    pub fn tap_window(&self) -> Duration {
        Duration::from_millis(self.tap_window_ms)
    }

    pub fn auto_hide(&self) -> Duration {
        Duration::from_millis(self.auto_hide_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn center_icon(&self) -> Duration {
        Duration::from_millis(self.center_icon_ms)
    }
}

// Default value functions
fn default_tap_window_ms() -> u64 {
    300
}
fn default_auto_hide_ms() -> u64 {
    3000
}
fn default_poll_interval_ms() -> u64 {
    250
}
fn default_center_icon_ms() -> u64 {
    500
}
fn default_seek_step_secs() -> f64 {
    10.0
}
fn default_volume_step() -> u8 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_behavior() {
        let config = ControlsConfig::default();
        assert_eq!(config.tap_window_ms, 300);
        assert_eq!(config.auto_hide_ms, 3000);
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.center_icon_ms, 500);
        assert_eq!(config.seek_step_secs, 10.0);
        assert_eq!(config.volume_step, 10);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ControlsConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ControlsConfig::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overplay").join("config.toml");

        let config = ControlsConfig {
            tap_window_ms: 250,
            auto_hide_ms: 5000,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = ControlsConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "auto_hide_ms = 1500\n").unwrap();

        let config = ControlsConfig::load_from(&path).unwrap();
        assert_eq!(config.auto_hide_ms, 1500);
        assert_eq!(config.tap_window_ms, 300);
    }
}
