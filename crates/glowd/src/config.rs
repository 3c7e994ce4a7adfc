//! Configuration file parsing and structures.
//!
//! glowd uses TOML for declarative configuration. Every section has a
//! working default, so an empty file (or no file at all) yields a usable
//! daemon; a file that exists but cannot be read or parsed is startup-fatal.

use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;

use tracing_subscriber::filter::LevelFilter;

use crate::store::State;
use crate::store::lights;
use crate::store::state::LightDevice;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
    pub prediction: PredictionConfig,
    pub storage: StorageConfig,

    /// Initial light devices; the built-in set is used when empty.
    pub lights: Vec<LightSeed>,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: LogLevel,
}

/// Gate configuration. One plaintext secret for the whole system; this is
/// deliberately not a security boundary.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: "123456".to_string(),
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to listen on (e.g. "127.0.0.1")
    pub listen: String,

    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1".to_string(),
            port: 8565,
        }
    }
}

/// Prediction service configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Endpoint answering `{"status", "rule"}` to a sensor-sample POST.
    pub endpoint: String,

    pub timeout_ms: u64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/api/predict_rule".to_string(),
            timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON file holding the persisted settings record.
    pub settings_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("glowd_settings.json"),
        }
    }
}

/// One configured light device.
#[derive(Debug, Deserialize)]
pub struct LightSeed {
    pub name: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub on: bool,

    #[serde(default)]
    pub brightness: u8,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Build the initial state tree: configured lights when present, the
    /// built-in dashboard set otherwise.
    pub fn seed_state(&self) -> State {
        let mut state = State::default();
        if self.lights.is_empty() {
            return state;
        }

        state.lights = self
            .lights
            .iter()
            .enumerate()
            .map(|(i, seed)| LightDevice {
                id: i as u32 + 1,
                name: seed.name.clone(),
                location: seed.location.clone(),
                is_on: seed.on,
                brightness: seed.brightness.min(lights::MAX_BRIGHTNESS),
            })
            .collect();
        state.total_power = lights::total_power(&state.lights);
        state
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}
