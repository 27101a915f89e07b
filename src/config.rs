//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub poller: PollerConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the result document lives
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// `http(s)://` URL, `file://` URL or plain path
    #[serde(default = "default_source_url")]
    pub url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_source_url() -> String {
    "http://127.0.0.1:3000/result.json".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// How a successful fetch updates the charted series
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// The fetched document replaces the series
    #[default]
    Replace,
    /// The fetched document is merged into the series by year
    Merge,
}

/// Poll timer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Fetch as soon as the poller is mounted instead of after one interval
    #[serde(default = "default_fetch_on_start")]
    pub fetch_on_start: bool,

    #[serde(default)]
    pub update_mode: UpdateMode,
}

fn default_interval_secs() -> u64 {
    10
}

fn default_fetch_on_start() -> bool {
    true
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            fetch_on_start: default_fetch_on_start(),
            update_mode: UpdateMode::default(),
        }
    }
}

impl PollerConfig {
    /// Timer period, never shorter than one second
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Chart surface configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_max_x_labels")]
    pub max_x_labels: usize,
}

fn default_width() -> u32 {
    1500
}

fn default_height() -> u32 {
    800
}

fn default_max_x_labels() -> usize {
    20
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            max_x_labels: default_max_x_labels(),
        }
    }
}

/// Dashboard server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_ws_connections")]
    pub max_ws_connections: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_max_ws_connections() -> usize {
    64
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_ws_connections: default_max_ws_connections(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("popchart").join("config.toml")),
            Some(PathBuf::from("/etc/popchart/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (environment in production)
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("POPCHART_SOURCE_URL") {
            self.source.url = url;
        }
        if let Some(secs) = lookup("POPCHART_POLL_INTERVAL_SECS") {
            match secs.parse() {
                Ok(s) => self.poller.interval_secs = s,
                Err(_) => tracing::warn!("Ignoring invalid POPCHART_POLL_INTERVAL_SECS={}", secs),
            }
        }

        if let Some(host) = lookup("POPCHART_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("POPCHART_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!("Ignoring invalid POPCHART_API_PORT={}", port),
            }
        }

        if let Some(level) = lookup("POPCHART_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("POPCHART_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Popchart Configuration
#
# Environment variables override these settings:
# - POPCHART_SOURCE_URL
# - POPCHART_POLL_INTERVAL_SECS
# - POPCHART_API_HOST
# - POPCHART_API_PORT
# - POPCHART_LOG_LEVEL
# - POPCHART_LOG_FORMAT

[source]
# Result document: http(s):// URL, file:// URL or plain path
url = "http://127.0.0.1:3000/result.json"

# Per-request timeout (ms)
request_timeout_ms = 5000

[poller]
# Seconds between fetches
interval_secs = 10

# Fetch immediately on start instead of waiting one interval
fetch_on_start = true

# "replace" shows each fetched document as-is, "merge" merges by year
update_mode = "replace"

[chart]
# Fixed chart surface size (pixels)
width = 1500
height = 800

# Maximum number of year labels drawn on the x-axis
max_x_labels = 20

[api]
# Dashboard server host
host = "127.0.0.1"

# Dashboard server port
port = 8090

# Maximum concurrent WebSocket clients
max_ws_connections = 64

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.source.url, "http://127.0.0.1:3000/result.json");
        assert_eq!(config.poller.interval(), Duration::from_secs(10));
        assert!(config.poller.fetch_on_start);
        assert_eq!(config.poller.update_mode, UpdateMode::Replace);
        assert_eq!((config.chart.width, config.chart.height), (1500, 800));
        assert_eq!(config.api.addr(), "127.0.0.1:8090");
    }

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let parsed = Config::parse(&generate_default_config()).unwrap();
        let defaults = Config::default();

        assert_eq!(parsed.source.url, defaults.source.url);
        assert_eq!(parsed.poller.interval_secs, defaults.poller.interval_secs);
        assert_eq!(parsed.chart.max_x_labels, defaults.chart.max_x_labels);
        assert_eq!(parsed.api.port, defaults.api.port);
        assert_eq!(parsed.logging.format, defaults.logging.format);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[poller]\ninterval_secs = 3\nupdate_mode = \"merge\"\n\n[source]\nurl = \"./result.json\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.poller.interval_secs, 3);
        assert_eq!(config.poller.update_mode, UpdateMode::Merge);
        assert_eq!(config.source.url, "./result.json");
        assert_eq!(config.source.request_timeout_ms, 5000);
        assert_eq!(config.api.port, 8090);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = Config::parse("[poller]\ninterval_secs = 0\n").unwrap();
        assert_eq!(config.poller.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[poller]\ninterval_secs = \"often\"\n").unwrap();
        assert!(matches!(Config::load(&bad), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("POPCHART_SOURCE_URL", "file:///srv/result.json"),
            ("POPCHART_POLL_INTERVAL_SECS", "30"),
            ("POPCHART_API_PORT", "not-a-port"),
            ("POPCHART_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.source.url, "file:///srv/result.json");
        assert_eq!(config.poller.interval_secs, 30);
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.logging.format, "json");
    }
}
