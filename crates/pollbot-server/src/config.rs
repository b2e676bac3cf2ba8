use anyhow::{Context, Result};
use chrono::Weekday;
use pollbot_core::window::WeekWindow;
use pollbot_core::PollSettings;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const BOT_TOKEN_ENV: &str = "POLLBOT_BOT_TOKEN";
pub const PUBLIC_KEY_ENV: &str = "POLLBOT_PUBLIC_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub platform: PlatformConfig,
    pub storage: StorageConfig,
    pub window: WindowConfig,
    pub polls: PollsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub application_id: i64,
    /// Hex-encoded Ed25519 key used to verify interaction requests.
    pub public_key: String,
    pub bot_token: String,
    pub api_base: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            application_id: 0,
            public_key: String::new(),
            bot_token: String::new(),
            api_base: "https://discord.com/api/v10".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub snapshot_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "./data/polls.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Weekday the vote window resets on, e.g. "sunday" or "mon".
    pub anchor: String,
    pub utc_offset_minutes: i32,
    pub sweep_interval_seconds: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            anchor: "sunday".to_string(),
            utc_offset_minutes: 0,
            sweep_interval_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollsConfig {
    pub echo_counts_publicly: bool,
    pub recent_log_capacity: usize,
}

impl Default for PollsConfig {
    fn default() -> Self {
        Self {
            echo_counts_publicly: false,
            recent_log_capacity: 100,
        }
    }
}

impl Config {
    /// Read the config file, falling back to defaults when it doesn't exist,
    /// then apply secret overrides from the environment.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path}"))?;
            Self::parse(&raw).with_context(|| format!("invalid config file {path}"))?
        } else {
            tracing::warn!("Config file {path} not found, using defaults");
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(token) = var(BOT_TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            self.platform.bot_token = token.trim().to_string();
        }
        if let Some(key) = var(PUBLIC_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.platform.public_key = key.trim().to_string();
        }
    }

    pub fn week_window(&self) -> Result<WeekWindow> {
        let anchor: Weekday = self
            .window
            .anchor
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown weekday '{}'", self.window.anchor))?;
        Ok(WeekWindow::new(anchor, self.window.utc_offset_minutes)?)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            echo_counts_publicly: self.polls.echo_counts_publicly,
            recent_log_capacity: self.polls.recent_log_capacity,
            sweep_interval: Duration::from_secs(self.window.sweep_interval_seconds.max(1)),
        }
    }
}
