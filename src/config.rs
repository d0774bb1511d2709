//! Configuration for the proctor monitor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main configuration for the monitor binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Session features used when none are given on the command line
    pub session: SessionConfig,

    /// Directory session reports are written to
    pub report_path: PathBuf,

    /// Capacity of the UI event channel
    pub ui_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("proctor-monitor");

        Self {
            session: SessionConfig::default(),
            report_path: data_dir.join("reports"),
            ui_channel_capacity: 1_000,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("proctor-monitor")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.report_path)?;
        Ok(())
    }
}

/// Monitoring features for one session. Fixed once the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub camera_enabled: bool,
    pub screen_share_enabled: bool,
    pub lockdown_enabled: bool,
    pub face_detection_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            camera_enabled: true,
            screen_share_enabled: true,
            lockdown_enabled: true,
            face_detection_enabled: false,
        }
    }
}

impl SessionConfig {
    /// Every feature off.
    pub fn none() -> Self {
        Self {
            camera_enabled: false,
            screen_share_enabled: false,
            lockdown_enabled: false,
            face_detection_enabled: false,
        }
    }

    /// Lockdown only, no capture devices.
    pub fn lockdown_only() -> Self {
        Self {
            lockdown_enabled: true,
            ..Self::none()
        }
    }

    /// Parse features from a comma-separated string
    /// (`camera`, `screen`, `lockdown`, `face`, or `all`).
    pub fn from_csv(s: &str) -> Self {
        let features: Vec<String> = s.split(',').map(|s| s.trim().to_lowercase()).collect();
        let has = |name: &str| features.iter().any(|f| f == name || f == "all");

        Self {
            camera_enabled: has("camera"),
            screen_share_enabled: has("screen"),
            lockdown_enabled: has("lockdown"),
            face_detection_enabled: has("face"),
        }
    }

    /// Check if any capture device is requested.
    pub fn any_capture(&self) -> bool {
        self.camera_enabled || self.screen_share_enabled
    }
}

impl fmt::Display for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool| if on { "enabled" } else { "disabled" };
        write!(
            f,
            "camera: {}, screen share: {}, lockdown: {}, face detection: {}",
            flag(self.camera_enabled),
            flag(self.screen_share_enabled),
            flag(self.lockdown_enabled),
            flag(self.face_detection_enabled)
        )
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(serde_json::Error),

    #[error("Serialize error: {0}")]
    Serialize(serde_json::Error),
}
