//! Durable user settings.
//!
//! One JSON file holds the whole record. Absence, unreadable contents, or
//! a failed write never surface to the caller: load falls back to the
//! defaults and save logs and moves on. Stored records merge by presence,
//! so a record written by an older build keeps its known fields and
//! defaults the rest.

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

/// Voice prompt playback speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the client's color-scheme preference.
    Auto,
}

/// Flat record of display, voice, and account preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub voice_enabled: bool,
    pub voice_rules: bool,
    pub voice_status: bool,
    pub voice_alerts: bool,

    /// Voice volume, 0-100.
    pub voice_volume: u8,
    pub voice_speed: VoiceSpeed,

    pub username: String,

    /// Plaintext account password. Persisted on save, but the in-memory
    /// copy in the state tree is always cleared.
    pub password: String,
    pub two_factor: bool,

    pub theme: Theme,
    pub notifications: bool,
    pub auto_backup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voice_enabled: true,
            voice_rules: true,
            voice_status: true,
            voice_alerts: true,
            voice_volume: 50,
            voice_speed: VoiceSpeed::Normal,
            username: "User".to_string(),
            password: String::new(),
            two_factor: false,
            theme: Theme::Light,
            notifications: true,
            auto_backup: true,
        }
    }
}

/// File-backed settings storage.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored record, defaulting on absence or unreadable data.
    pub fn load(&self) -> Settings {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored settings, using defaults");
                return Settings::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read settings, using defaults");
                return Settings::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to parse settings, using defaults");
                Settings::default()
            }
        }
    }

    /// Overwrite the stored record wholesale. Failures are logged, never
    /// surfaced.
    pub fn save(&self, settings: &Settings) {
        let contents = match serde_json::to_string_pretty(settings) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(error = %e, "failed to serialize settings");
                return;
            }
        };

        if let Err(e) = std::fs::write(&self.path, contents) {
            warn!(path = %self.path.display(), error = %e, "failed to write settings");
        }
    }

    /// Remove the stored record so the next load yields the defaults.
    pub fn reset(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove settings");
            }
        }
    }
}
