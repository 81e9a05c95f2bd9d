//! Engine configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! refresh_rate = 30
//! display_mode = "ansi"
//! double_click_ms = 400
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::renderer::output::DEFAULT_CHUNK_SIZE;
use crate::renderer::DisplayMode;

/// Runtime settings for an [`Engine`](crate::pipeline::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Display ticks per second. Must be at least 1.
    pub refresh_rate: u32,
    pub display_mode: DisplayMode,
    /// Bytes per terminal write when flushing a frame.
    pub output_chunk_size: usize,
    /// Longest gap between two left presses on one cell that still counts as a double click.
    pub double_click_ms: u64,
    /// Terminate the process with status 1 after a fatal loop failure.
    pub exit_on_failure: bool,
    /// Route Ctrl+C to the focused control instead of the cancel handlers.
    pub treat_ctrl_c_as_input: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_rate: 20,
            display_mode: DisplayMode::Auto,
            output_chunk_size: DEFAULT_CHUNK_SIZE,
            double_click_ms: 500,
            exit_on_failure: true,
            treat_ctrl_c_as_input: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_rate < 1 {
            return Err(ConfigError::InvalidRefreshRate(self.refresh_rate));
        }
        if self.output_chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(())
    }

    /// Target duration of one display tick (`1000 / rate` ms).
    pub fn frame_time(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.refresh_rate.max(1)))
    }

    pub fn double_click_interval(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.refresh_rate, 20);
        assert_eq!(config.frame_time(), Duration::from_millis(50));
        assert_eq!(config.output_chunk_size, 1000);
        assert_eq!(config.display_mode, DisplayMode::Auto);
        assert!(config.exit_on_failure);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_parse_fields() {
        let config = EngineConfig::from_toml_str(
            r#"
            refresh_rate = 30
            display_mode = "native"
            exit_on_failure = false
            "#,
        )
        .unwrap();
        assert_eq!(config.refresh_rate, 30);
        assert_eq!(config.frame_time(), Duration::from_millis(33));
        assert_eq!(config.display_mode, DisplayMode::Native);
        assert!(!config.exit_on_failure);
        assert_eq!(config.double_click_ms, 500);
    }

    #[test]
    fn test_zero_refresh_rate_rejected() {
        let err = EngineConfig::from_toml_str("refresh_rate = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRefreshRate(0)));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = EngineConfig::from_toml_str("output_chunk_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChunkSize));
    }

    #[test]
    fn test_bad_toml() {
        let err = EngineConfig::from_toml_str("refresh_rate = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
