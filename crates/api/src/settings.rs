//! Layered settings: defaults, optional TOML file, then environment

use camera_capture::CameraConfig;
use config::{Config, ConfigError, Environment, File};
use emotion::ClassifierConfig;
use monitor::MonitorConfig;
use serde::Deserialize;
use std::path::Path;

/// Settings file read when `EMOTION_MONITOR_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "emotion-monitor.toml";

/// Environment variable naming an alternative settings file
pub const CONFIG_PATH_ENV: &str = "EMOTION_MONITOR_CONFIG";

/// Prefix of environment overrides, e.g. `EMOTION_MONITOR__SERVER__ADDR`
pub const ENV_PREFIX: &str = "EMOTION_MONITOR";

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Max level: trace, debug, info, warn or error
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `/metrics`
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub camera: CameraConfig,
    pub classifier: ClassifierConfig,
    pub monitor: MonitorConfig,
}

impl Settings {
    /// Load from the file named by `EMOTION_MONITOR_CONFIG` (or the default
    /// file if present), then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path), true),
            Err(_) => Self::from_file(Path::new(DEFAULT_CONFIG_FILE), false),
        }
    }

    /// Load from `path`; a missing file is an error only when `required`
    pub fn from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings
            .monitor
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(settings)
    }
}
