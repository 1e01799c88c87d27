//! Application configuration
//!
//! Optional JSON file at `<config dir>/gesture-calculator/config.json`. Every
//! field has a default, so a partial file (or none at all) is fine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculator::session::{DEFAULT_COOLDOWN_FRAMES, DEFAULT_PINCH_THRESHOLD};
use crate::calculator::SessionSettings;

const CONFIG_DIR_NAME: &str = "gesture-calculator";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Camera device index.
    pub camera_index: u32,
    /// Requested capture width (the device may deliver another size).
    pub capture_width: u32,
    /// Requested capture height.
    pub capture_height: u32,
    /// Interval between processing ticks while running.
    pub tick_interval_ms: u64,
    /// Maximum fingertip distance in pixels that counts as a pinch.
    pub pinch_threshold: f32,
    /// Frames before another click is accepted.
    pub cooldown_frames: u32,
    /// Minimum hand presence score.
    pub min_hand_confidence: f32,
    /// Directory holding `hand_landmark.onnx`; searched for when unset.
    pub model_dir: Option<PathBuf>,
    /// Initial window width.
    pub window_width: u32,
    /// Initial window height.
    pub window_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            capture_width: 1400,
            capture_height: 900,
            tick_interval_ms: 10,
            pinch_threshold: DEFAULT_PINCH_THRESHOLD,
            cooldown_frames: DEFAULT_COOLDOWN_FRAMES,
            min_hand_confidence: 0.5,
            model_dir: None,
            window_width: 1800,
            window_height: 1000,
        }
    }
}

impl AppConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Read a config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load from the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            log::info!("No config directory on this platform, using defaults");
            return Self::default();
        };

        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config.sanitized()
            }
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Clamp values that would make the app unusable
    pub fn sanitized(mut self) -> Self {
        self.capture_width = self.capture_width.max(1);
        self.capture_height = self.capture_height.max(1);
        self.tick_interval_ms = self.tick_interval_ms.max(1);
        self.min_hand_confidence = self.min_hand_confidence.clamp(0.0, 1.0);
        if !self.pinch_threshold.is_finite() || self.pinch_threshold < 0.0 {
            self.pinch_threshold = DEFAULT_PINCH_THRESHOLD;
        }
        self
    }

    /// Click resolver settings
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            pinch_threshold: self.pinch_threshold,
            cooldown_frames: self.cooldown_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.capture_width, 1400);
        assert_eq!(config.capture_height, 900);
        assert_eq!(config.tick_interval_ms, 10);
        assert_eq!(config.session_settings(), SessionSettings::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AppConfig::from_json(r#"{ "camera_index": 2, "pinch_threshold": 30.0 }"#).unwrap();
        assert_eq!(config.camera_index, 2);
        assert_eq!(config.pinch_threshold, 30.0);
        assert_eq!(config.cooldown_frames, 10);
        assert!(config.model_dir.is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig {
            model_dir: Some(PathBuf::from("/opt/models")),
            ..AppConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(AppConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json() {
        assert!(AppConfig::from_json("{ camera_index: }").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load_from(Path::new("/definitely/not/here/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_sanitized() {
        let config = AppConfig {
            tick_interval_ms: 0,
            min_hand_confidence: 3.0,
            pinch_threshold: -1.0,
            ..AppConfig::default()
        }
        .sanitized();
        assert_eq!(config.tick_interval_ms, 1);
        assert_eq!(config.min_hand_confidence, 1.0);
        assert_eq!(config.pinch_threshold, DEFAULT_PINCH_THRESHOLD);
    }
}
