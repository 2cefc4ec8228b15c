//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use wayfare_chat::{ChatConfig, Locale, Notices};
use wayfare_wire::{Dialect, HistoryMode, api::DEFAULT_BASE_URL, client::DEFAULT_ENDPOINT};

/// Configuration for wayfare
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Streaming agent endpoint
    pub endpoint: Option<String>,
    /// Base URL of the REST API used by the booking commands
    pub base_url: Option<String>,
    /// History mode (full, latest)
    pub history: Option<String>,
    /// Frame dialect (auto, delta, message)
    pub dialect: Option<String>,
    /// Notice language (zh, en)
    pub locale: Option<String>,
    /// Remove a trailing FINISH sentinel from replies
    pub strip_finish_marker: Option<bool>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wayfare")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("WAYFARE_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific path, falling back to defaults
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Parse config file content
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Create the config file with the commented example if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, example_config())?;
        Ok(path)
    }
}

/// Effective settings after merging flags, the config file and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub base_url: String,
    pub history: HistoryMode,
    pub dialect: Dialect,
    pub locale: Locale,
    pub strip_finish_marker: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            history: HistoryMode::default(),
            dialect: Dialect::default(),
            locale: Locale::default(),
            strip_finish_marker: true,
        }
    }
}

impl Settings {
    /// Merge command-line values over the config file over defaults
    pub fn resolve(flags: &Config, file: &Config) -> anyhow::Result<Self> {
        fn pick(flag: &Option<String>, file: &Option<String>) -> Option<String> {
            flag.as_ref()
                .or(file.as_ref())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        fn parse<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
        where
            T: std::str::FromStr<Err = String>,
        {
            match value {
                Some(v) => v
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid {}: {}", key, e)),
                None => Ok(default),
            }
        }

        let defaults = Self::default();
        Ok(Self {
            endpoint: pick(&flags.endpoint, &file.endpoint).unwrap_or(defaults.endpoint),
            base_url: pick(&flags.base_url, &file.base_url).unwrap_or(defaults.base_url),
            history: parse(pick(&flags.history, &file.history), "history", defaults.history)?,
            dialect: parse(pick(&flags.dialect, &file.dialect), "dialect", defaults.dialect)?,
            locale: parse(pick(&flags.locale, &file.locale), "locale", defaults.locale)?,
            strip_finish_marker: flags
                .strip_finish_marker
                .or(file.strip_finish_marker)
                .unwrap_or(defaults.strip_finish_marker),
        })
    }

    /// Chat session configuration for these settings
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            dialect: self.dialect,
            notices: Notices::for_locale(self.locale),
            strip_finish_marker: self.strip_finish_marker,
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# wayfare configuration file
# Place at ~/.config/wayfare/config.toml (Linux), ~/Library/Application Support/wayfare/config.toml (Mac)
# or set WAYFARE_CONFIG_PATH

# Streaming agent endpoint
endpoint = "http://localhost:8000/api/agent/vibe/stream"

# REST API used by /flights, /hotels, /book-flight and /book-hotel
base_url = "http://localhost:8000"

# What goes out with each request:
#   full   - the whole visible conversation (stateless service)
#   latest - only the new message; the service keeps context by session id
history = "full"

# Frame vocabulary of the service (auto, delta, message)
dialect = "auto"

# Language of notices written into the transcript (zh, en)
locale = "zh"

# Remove a trailing FINISH sentinel from replies
strip_finish_marker = true
"#
}
