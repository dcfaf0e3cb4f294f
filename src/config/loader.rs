//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "DOMU_PANEL";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "DOMU_PANEL_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `DOMU_PANEL_CONFIG` environment variable (explicit path)
    /// 2. `./config.toml` (current directory)
    /// 3. The platform config directory (`~/.config/domu-panel/` on Linux)
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override selected config values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Env overrides still apply on top of defaults.
        let _ = apply_env_overrides(&mut config);

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    if let Some(dirs) = directories::ProjectDirs::from("", "", "domu-panel") {
        let app_config = dirs.config_dir().join(CONFIG_FILE_NAME);
        if app_config.exists() {
            return Some(app_config);
        }
    }

    // 4. No config file found - defaults apply
    None
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(toml::from_str(&contents)?)
}

/// Apply environment-variable overrides onto a loaded config.
///
/// The pattern is `DOMU_PANEL_<SECTION>_<KEY>`, e.g.
/// `DOMU_PANEL_SERIAL_DEFAULT_BAUD=115200`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(baud) = env_parse::<u32>(&format!("{ENV_PREFIX}_SERIAL_DEFAULT_BAUD"))? {
        config.serial.default_baud = baud;
    }
    if let Some(ms) = env_parse::<u64>(&format!("{ENV_PREFIX}_SERIAL_SETTLE_DELAY_MS"))? {
        config.serial.settle_delay_ms = ms;
    }
    if let Some(ms) = env_parse::<u64>(&format!("{ENV_PREFIX}_PANEL_AUTO_CLOSE_DELAY_MS"))? {
        config.panel.auto_close_delay_ms = ms;
    }
    if let Some(ms) = env_parse::<u64>(&format!("{ENV_PREFIX}_PANEL_POLLING_INTERVAL_MS"))? {
        config.panel.polling_interval_ms = ms;
    }
    if let Ok(cmd) = std::env::var(format!("{ENV_PREFIX}_PANEL_CAMERA_COMMAND")) {
        config.panel.camera_command = if cmd.is_empty() { None } else { Some(cmd) };
    }
    if let Ok(level) = std::env::var(format!("{ENV_PREFIX}_LOGGING_LEVEL")) {
        config.logging.level = level;
    }
    Ok(())
}

fn env_parse<T: std::str::FromStr>(var: &str) -> ConfigResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::env_parse(var, e.to_string())),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_from_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "[serial]\ndefault_baud = 57600\n\n[logging]\nlevel = \"debug\"\n"
        )
        .expect("write");

        let loader = ConfigLoader::load_from(file.path()).expect("load");
        assert_eq!(loader.config().serial.default_baud, 57600);
        assert_eq!(loader.config().logging.level, "debug");
        assert_eq!(loader.config_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn load_from_missing_file_is_not_found() {
        let result = ConfigLoader::load_from("/definitely/not/here/config.toml");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn load_from_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "this is not toml at all [").expect("write");

        let result = ConfigLoader::load_from(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn with_defaults_needs_no_file() {
        let loader = ConfigLoader::with_defaults();
        assert!(loader.config_path.is_none());
        assert_eq!(loader.config().serial.default_baud, 9600);
    }

    #[test]
    fn env_override_applies_and_reports_garbage() {
        // Touch only override vars unique to this test to stay
        // parallel-safe.
        std::env::set_var("DOMU_PANEL_SERIAL_DEFAULT_BAUD", "115200");
        let mut config = Config::default();
        apply_env_overrides(&mut config).expect("override");
        assert_eq!(config.serial.default_baud, 115200);

        std::env::set_var("DOMU_PANEL_SERIAL_DEFAULT_BAUD", "not-a-number");
        let result = apply_env_overrides(&mut config);
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));

        std::env::remove_var("DOMU_PANEL_SERIAL_DEFAULT_BAUD");
    }
}
