//! Configuration schema definitions.
//!
//! Defines the structure of the configuration file using serde. All
//! sections have defaults, so a missing or partial file is fine.

use crate::panel::PanelOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link configuration
    pub serial: SerialConfig,
    /// Panel behavior configuration
    pub panel: PanelConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Build runtime panel options from the configured durations.
    pub fn panel_options(&self) -> PanelOptions {
        PanelOptions {
            baud_rate: self.serial.default_baud,
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms),
            settle_delay: Duration::from_millis(self.serial.settle_delay_ms),
            reader_poll_interval: Duration::from_millis(self.serial.reader_poll_ms),
            auto_close_delay: Duration::from_millis(self.panel.auto_close_delay_ms),
            polling_interval: Duration::from_millis(self.panel.polling_interval_ms),
            join_timeout: Duration::from_millis(self.serial.join_timeout_ms),
        }
    }
}

/// Serial link configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate for the device link
    pub default_baud: u32,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Device reset latency after opening the port, in milliseconds
    pub settle_delay_ms: u64,
    /// Reader-loop idle backoff in milliseconds
    pub reader_poll_ms: u64,
    /// Bound on joining the reader thread at disconnect, in milliseconds
    pub join_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            default_baud: 9600,
            read_timeout_ms: 1000,
            settle_delay_ms: 2000,
            reader_poll_ms: 100,
            join_timeout_ms: 1000,
        }
    }
}

/// Panel behavior configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Door auto-close delay in milliseconds
    pub auto_close_delay_ms: u64,
    /// Period of the automatic target-reading poll, in milliseconds
    pub polling_interval_ms: u64,
    /// Port-list rescan interval while disconnected, in milliseconds
    pub port_rescan_ms: u64,
    /// Command launched when the doorbell button is pressed
    pub camera_command: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            auto_close_delay_ms: 5000,
            polling_interval_ms: 1000,
            port_rescan_ms: 2000,
            camera_command: Some("cheese".to_string()),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_profile() {
        let config = Config::default();
        assert_eq!(config.serial.default_baud, 9600);
        assert_eq!(config.serial.settle_delay_ms, 2000);
        assert_eq!(config.panel.auto_close_delay_ms, 5000);
        assert_eq!(config.panel.polling_interval_ms, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let toml = r#"
            [serial]
            default_baud = 115200

            [panel]
            camera_command = "vlc"
        "#;
        let config: Config = toml::from_str(toml).expect("parse");
        assert_eq!(config.serial.default_baud, 115200);
        assert_eq!(config.serial.read_timeout_ms, 1000);
        assert_eq!(config.panel.camera_command.as_deref(), Some("vlc"));
        assert_eq!(config.panel.auto_close_delay_ms, 5000);
    }

    #[test]
    fn panel_options_mapping() {
        let mut config = Config::default();
        config.serial.settle_delay_ms = 250;
        config.panel.auto_close_delay_ms = 750;

        let options = config.panel_options();
        assert_eq!(options.baud_rate, 9600);
        assert_eq!(options.settle_delay, Duration::from_millis(250));
        assert_eq!(options.auto_close_delay, Duration::from_millis(750));
        assert_eq!(options.polling_interval, Duration::from_secs(1));
    }
}
