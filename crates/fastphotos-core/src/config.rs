//! Configuration system for the receiver.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $FASTPHOTOS_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/fastphotos/config.toml
//!   3. ~/.config/fastphotos/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FastPhotosConfig {
    pub network: NetworkConfig,
    pub timing: TimingConfig,
    pub stream: StreamConfig,
    pub display: DisplayConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the sender transport listens on.
    pub listen_addr: String,
    /// Port of the local status API.
    pub api_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Foreground image load timeout.
    pub image_load_timeout_secs: u64,
    /// Delay before the start-up spinner gives way to the splash screen.
    pub splash_delay_secs: u64,
    /// Grace period between the last sender leaving and shutdown.
    pub session_close_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// How long a stream may stall before dropping one quality level.
    pub degrade_timeout_ms: u64,
    /// Time since the last quality change after which the highest quality
    /// is tried again.
    pub quality_reset_secs: u64,
    /// Playback progress that counts as "playing".
    pub progress_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Viewport of the headless display surface.
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Images larger than this are treated as failed fetches.
    pub max_image_bytes: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8009".to_string(),
            api_port: 9011,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            image_load_timeout_secs: 30,
            splash_delay_secs: 2,
            session_close_delay_secs: 1,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            degrade_timeout_ms: 7_000,
            quality_reset_secs: 5 * 60,
            progress_threshold_ms: 500,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("fastphotos/", env!("CARGO_PKG_VERSION")).to_string(),
            max_image_bytes: 32 * 1024 * 1024,
        }
    }
}

impl TimingConfig {
    pub fn image_load_timeout(&self) -> Duration {
        Duration::from_secs(self.image_load_timeout_secs)
    }

    pub fn splash_delay(&self) -> Duration {
        Duration::from_secs(self.splash_delay_secs)
    }

    pub fn session_close_delay(&self) -> Duration {
        Duration::from_secs(self.session_close_delay_secs)
    }
}

impl StreamConfig {
    pub fn degrade_timeout(&self) -> Duration {
        Duration::from_millis(self.degrade_timeout_ms)
    }

    pub fn quality_reset(&self) -> Duration {
        Duration::from_secs(self.quality_reset_secs)
    }

    pub fn progress_threshold(&self) -> Duration {
        Duration::from_millis(self.progress_threshold_ms)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("fastphotos")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl FastPhotosConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            FastPhotosConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("FASTPHOTOS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&FastPhotosConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply FASTPHOTOS_* env var overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("FASTPHOTOS_NETWORK__LISTEN_ADDR") {
            self.network.listen_addr = v;
        }
        if let Some(p) = lookup("FASTPHOTOS_NETWORK__API_PORT").and_then(|v| v.parse().ok()) {
            self.network.api_port = p;
        }
        if let Some(w) = lookup("FASTPHOTOS_DISPLAY__WIDTH").and_then(|v| v.parse().ok()) {
            self.display.width = w;
        }
        if let Some(h) = lookup("FASTPHOTOS_DISPLAY__HEIGHT").and_then(|v| v.parse().ok()) {
            self.display.height = h;
        }
    }
}
