//! Configuration module.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of
//! priority):
//!
//! 1. `DOMU_PANEL_CONFIG` environment variable (explicit path)
//! 2. `./config.toml` (current directory)
//! 3. The platform config directory (`~/.config/domu-panel/config.toml` on
//!    Linux/macOS, `%APPDATA%\domu-panel\config.toml` on Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Selected values can be overridden via `DOMU_PANEL_<SECTION>_<KEY>`:
//!
//! - `DOMU_PANEL_SERIAL_DEFAULT_BAUD=115200`
//! - `DOMU_PANEL_SERIAL_SETTLE_DELAY_MS=500`
//! - `DOMU_PANEL_PANEL_AUTO_CLOSE_DELAY_MS=10000`
//! - `DOMU_PANEL_PANEL_POLLING_INTERVAL_MS=2000`
//! - `DOMU_PANEL_PANEL_CAMERA_COMMAND=vlc`
//! - `DOMU_PANEL_LOGGING_LEVEL=debug`

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_config_path, ConfigLoader};
pub use schema::{Config, LoggingConfig, PanelConfig, SerialConfig};
