use crate::models::DateRange;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Remote service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the edge service
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Cookie header value forwarded on every request
    #[serde(default)]
    pub session_cookie: Option<String>,
    /// TCP connect timeout (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Name recorded when this console acknowledges an event
    #[serde(default = "default_operator_name")]
    pub operator_name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_operator_name() -> String {
    "operator".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Activity feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Rows requested from the events endpoint
    #[serde(default = "default_fetch_limit")]
    pub event_limit: u32,
    /// Rows requested from the detection samples endpoint
    #[serde(default = "default_fetch_limit")]
    pub sample_limit: u32,
    /// Maximum merged rows shown
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,
    /// Background refresh period (seconds)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Date range used when none is given
    #[serde(default)]
    pub default_range: DateRange,
}

fn default_fetch_limit() -> u32 {
    300
}

fn default_display_limit() -> usize {
    200
}

fn default_refresh_interval() -> u64 {
    20
}

/// Moment playback configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Ask the service for the transcoded (mp4) rendition first
    #[serde(default = "default_prefer_transcoded")]
    pub prefer_transcoded: bool,
    /// Directory for downloaded media; the system temp dir when unset
    #[serde(default)]
    pub media_dir: Option<PathBuf>,
    /// Age after which the recording catalog is fetched again (seconds)
    #[serde(default = "default_catalog_max_age")]
    pub catalog_max_age_secs: u64,
    /// Fraction of the media duration the seek position is clamped to
    #[serde(default = "default_seek_guard_ratio")]
    pub seek_guard_ratio: f64,
}

fn default_prefer_transcoded() -> bool {
    true
}

fn default_catalog_max_age() -> u64 {
    30
}

fn default_seek_guard_ratio() -> f64 {
    0.99
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_cookie: None,
            connect_timeout_secs: default_connect_timeout(),
            operator_name: default_operator_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            event_limit: default_fetch_limit(),
            sample_limit: default_fetch_limit(),
            display_limit: default_display_limit(),
            refresh_interval_secs: default_refresh_interval(),
            default_range: DateRange::default(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            prefer_transcoded: default_prefer_transcoded(),
            media_dir: None,
            catalog_max_age_secs: default_catalog_max_age(),
            seek_guard_ratio: default_seek_guard_ratio(),
        }
    }
}

/// Load configuration from a file or use default
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .context(format!("Failed to read config file: {:?}", path))?;

            let config = if path.extension().map_or(false, |ext| ext == "json") {
                serde_json::from_str(&config_str).context("Failed to parse JSON config")?
            } else if path.extension().map_or(false, |ext| ext == "toml") {
                toml::from_str(&config_str).context("Failed to parse TOML config")?
            } else {
                return Err(anyhow::anyhow!("Unsupported config file format"));
            };

            Ok(config)
        }
        None => Ok(Config::default()),
    }
}
