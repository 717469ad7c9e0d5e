//! Configuration management for gores.
//!
//! Configuration is loaded from the first source that exists:
//! 1. The file named by `GORES_CONFIG`
//! 2. `../gores.toml` (next to `cgi-bin/`)
//! 3. Default values
//!
//! Missing keys in a file fall back to their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "GORES_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub booking: BookingConfig,

    /// Look and feel, handed to the templates as-is
    #[serde(default)]
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// How long to wait for a lock held by a concurrent request
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Prefix of every URL the program serves, e.g. `/cgi-bin/gores`
    #[serde(default = "default_root_path")]
    pub root_path: String,

    /// Log file; stdout carries the response, so logs never go there
    #[serde(default = "default_log_file")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Users allowed to delete any booking
    #[serde(default)]
    pub admin_users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_bg_color")]
    pub bg_color: String,

    #[serde(default = "default_content_bg_color")]
    pub content_bg_color: String,
}

// Default value functions
fn default_db_path() -> PathBuf {
    PathBuf::from("../gores.db")
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_root_path() -> String {
    "/cgi-bin/gores".to_string()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("../gores.log"))
}

fn default_ttl_minutes() -> i64 {
    gores_core::session::DEFAULT_TTL_MINUTES
}

fn default_title() -> String {
    "Reservationen".to_string()
}

fn default_bg_color() -> String {
    "#d8e4bc".to_string()
}

fn default_content_bg_color() -> String {
    "#ffffff".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            log_file: default_log_file(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            bg_color: default_bg_color(),
            content_bg_color: default_content_bg_color(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, or defaults if there is none.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from("../gores.toml"),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.database.busy_timeout_ms)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session.ttl_minutes)
    }
}
