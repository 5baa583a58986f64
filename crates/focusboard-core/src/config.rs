//! Client configuration.
//!
//! Read from `config.toml` in the platform config directory (or an explicit
//! path), then overridden by `FOCUSBOARD_*` environment variables. A missing
//! file is not an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinator::MoveFailurePolicy;
use crate::error::{FocusError, FocusResult};
use crate::pomodoro::{FocusDurations, FocusSettings};
use crate::reminders::ReminderPreferences;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const API_URL_ENV: &str = "FOCUSBOARD_API_URL";
pub const TOKEN_ENV: &str = "FOCUSBOARD_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Transport timeout for every remote call, in seconds.
    pub timeout_secs: u64,
    pub move_failure: MoveFailurePolicy,
    pub focus: FocusConfig,
    pub reminders: ReminderPreferences,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: 30,
            move_failure: MoveFailurePolicy::default(),
            focus: FocusConfig::default(),
            reminders: ReminderPreferences::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub durations: FocusDurations,
    pub settings: FocusSettings,
}

impl ClientConfig {
    /// `$CONFIG_DIR/focusboard/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("focusboard").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`, then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> FocusResult<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> FocusResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| FocusError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
    }

    pub fn validate(&self) -> FocusResult<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(FocusError::Config(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(FocusError::Config("timeout_secs must be positive".into()));
        }
        self.reminders.parsed_time()?;
        self.focus.durations.validate()?;
        Ok(())
    }

    pub fn to_toml(&self) -> FocusResult<String> {
        toml::to_string_pretty(self).map_err(|e| FocusError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> FocusResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}
