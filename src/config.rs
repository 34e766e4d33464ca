// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON at `<config dir>/qr-scanner/config.json`. Missing keys take
//! their defaults; a missing file means all defaults.

use crate::app::frame_processor::settings::EnhancementSettings;
use crate::app::session::SessionConfig;
use crate::constants::{self, enhancement};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Directory name under the platform config dir
const APP_DIR: &str = "qr-scanner";
const CONFIG_FILE: &str = "config.json";

/// Upper bound for the sleep between capture cycles
const MAX_FRAME_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera index (`/dev/videoN`)
    pub camera_index: u32,
    /// Brightness multiplier
    pub brightness: f32,
    /// Contrast multiplier
    pub contrast: f32,
    /// Minimum seconds between two reported scans
    pub cooldown_secs: f64,
    /// Sleep between capture cycles in milliseconds
    pub frame_interval_ms: u64,
    /// Preview viewport size
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: 0,
            brightness: enhancement::DEFAULT,
            contrast: enhancement::DEFAULT,
            cooldown_secs: constants::DEFAULT_SCAN_COOLDOWN.as_secs_f64(),
            frame_interval_ms: constants::DEFAULT_FRAME_INTERVAL.as_millis() as u64,
            viewport_width: constants::DEFAULT_VIEWPORT_WIDTH,
            viewport_height: constants::DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl Config {
    /// Default config file location, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Io(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Config = serde_json::from_str(&contents)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config.validated())
    }

    /// Save to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::default_path()
            .ok_or_else(|| ConfigError::Io("no config directory on this platform".to_string()))?;
        self.save_to(&path)
    }

    /// Save to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Io(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| ConfigError::Io(format!("failed to write {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Copy with every value forced into its valid range
    pub fn validated(self) -> Self {
        let defaults = Self::default();
        let settings = EnhancementSettings::new(self.brightness, self.contrast);

        // Cooldown must be strictly positive; zero would report every frame
        let cooldown_secs = if self.cooldown_secs.is_finite() && self.cooldown_secs > 0.0 {
            self.cooldown_secs
        } else {
            defaults.cooldown_secs
        };

        let nonzero_or = |value: u32, default: u32| if value == 0 { default } else { value };

        Self {
            camera_index: self.camera_index,
            brightness: settings.brightness,
            contrast: settings.contrast,
            cooldown_secs,
            frame_interval_ms: self.frame_interval_ms.clamp(1, MAX_FRAME_INTERVAL_MS),
            viewport_width: nonzero_or(self.viewport_width, defaults.viewport_width),
            viewport_height: nonzero_or(self.viewport_height, defaults.viewport_height),
        }
    }

    pub fn enhancement(&self) -> EnhancementSettings {
        EnhancementSettings::new(self.brightness, self.contrast)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(constants::DEFAULT_SCAN_COOLDOWN)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Parameters for a [`crate::app::ScanSession`]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            camera_index: self.camera_index,
            cooldown: self.cooldown(),
            frame_interval: self.frame_interval(),
            enhancement: self.enhancement(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_clamps() {
        let config = Config {
            camera_index: 3,
            brightness: 9.0,
            contrast: 0.0,
            cooldown_secs: f64::NAN,
            frame_interval_ms: 0,
            viewport_width: 0,
            viewport_height: 200,
        }
        .validated();

        assert_eq!(config.camera_index, 3);
        assert_eq!(config.brightness, enhancement::MAX);
        assert_eq!(config.contrast, enhancement::MIN);
        assert_eq!(config.cooldown_secs, 1.0);
        assert_eq!(config.frame_interval_ms, 1);
        assert_eq!(config.viewport_width, 640);
        assert_eq!(config.viewport_height, 200);
    }

    #[test]
    fn test_zero_cooldown_falls_back_to_default() {
        let config = Config {
            cooldown_secs: 0.0,
            ..Config::default()
        };
        assert_eq!(config.cooldown(), constants::DEFAULT_SCAN_COOLDOWN);
        assert_eq!(config.validated().cooldown_secs, 1.0);

        let config = Config {
            cooldown_secs: 0.25,
            ..Config::default()
        }
        .validated();
        assert_eq!(config.cooldown_secs, 0.25);
    }

    #[test]
    fn test_session_config() {
        let config = Config {
            camera_index: 1,
            cooldown_secs: 2.5,
            frame_interval_ms: 50,
            ..Config::default()
        };
        let session = config.session_config();
        assert_eq!(session.camera_index, 1);
        assert_eq!(session.cooldown, Duration::from_millis(2500));
        assert_eq!(session.frame_interval, Duration::from_millis(50));
        assert!(session.enhancement.is_identity());
    }
}
