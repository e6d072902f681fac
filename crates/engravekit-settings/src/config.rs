//! Configuration management for EngraveKit
//!
//! One file holds every section: the serial connection, text engraving
//! parameters, machine constants, and the preview canvas. JSON and TOML are
//! both supported, chosen by file extension. Missing sections and fields take
//! their defaults.

use crate::error::{Result, SettingsError};
use engravekit_communication::{LinkSettings, MachineSettings};
use engravekit_core::ValidationError;
use engravekit_designer::GeneratorConfig;
use engravekit_visualizer::PreviewConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Port value that asks for discovery instead of a fixed device
pub const AUTO_PORT: &str = "Auto";

/// Serial connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial port, or "Auto" to probe the platform's candidates
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Reply read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Delay after opening the port in milliseconds
    pub settle_delay_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: AUTO_PORT.to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 1000,
            settle_delay_ms: 2000,
        }
    }
}

impl ConnectionSettings {
    /// True if the port should be discovered
    pub fn is_auto(&self) -> bool {
        self.port.trim().is_empty() || self.port.eq_ignore_ascii_case(AUTO_PORT)
    }

    /// Link parameters for [`engravekit_communication::DeviceLink::connect`]
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            baud_rate: self.baud_rate,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }

    /// Validate connection settings
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.baud_rate == 0 {
            return Err(ValidationError::config("baud_rate", "must be > 0"));
        }
        if self.read_timeout_ms == 0 {
            return Err(ValidationError::config("read_timeout_ms", "must be > 0"));
        }
        Ok(())
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial connection
    pub connection: ConnectionSettings,
    /// Text engraving parameters
    pub engraving: GeneratorConfig,
    /// Machine constants for control and safety stop
    pub machine: MachineSettings,
    /// Preview canvas
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(SettingsError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform config location, e.g. `~/.config/engravekit/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no config or home directory".to_string())
            })?;
        Ok(dir.join("engravekit").join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate every section
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.connection.validate()?;
        self.engraving.validate()?;
        self.machine.validate()?;
        self.preview.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert!(config.connection.is_auto());
        assert_eq!(config.connection.baud_rate, 115_200);
        assert_eq!(config.engraving.feed_rate, 228.6);
        assert_eq!(config.machine.safe_height, 20.0);
        assert_eq!(config.preview.background_color, "#deb887");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_link_settings_conversion() {
        let connection = ConnectionSettings {
            read_timeout_ms: 250,
            settle_delay_ms: 0,
            ..Default::default()
        };
        let link = connection.link_settings();
        assert_eq!(link.read_timeout, Duration::from_millis(250));
        assert!(link.settle_delay.is_zero());
    }

    #[test]
    fn test_explicit_port_is_not_auto() {
        let connection = ConnectionSettings {
            port: "/dev/ttyUSB3".to_string(),
            ..Default::default()
        };
        assert!(!connection.is_auto());
        let connection = ConnectionSettings {
            port: "auto".to_string(),
            ..Default::default()
        };
        assert!(connection.is_auto());
    }

    #[test]
    fn test_invalid_sections_are_rejected() {
        let mut config = Config::new();
        config.connection.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.preview.stroke_color = "black".to_string();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidColor { .. })
        ));

        let mut config = Config::new();
        config.engraving.line_spacing = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            Config::new().save_to_file(Path::new("config.yaml")),
            Err(SettingsError::UnsupportedFormat(_))
        ));
    }
}
