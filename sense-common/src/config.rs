//! Configuration management for the Sense client.
//!
//! The client reads a single configuration file at `~/.sense/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (SENSE_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `SENSE_CONFIG` → alternative config file path (`~` is expanded)
//! - `SENSE_BASE_URL` → service.base_url
//! - `SENSE_TIMEOUT_SECS` → service.timeout_secs
//! - `SENSE_LOG_LEVEL` → observability.log_level
//! - `SENSE_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".sense"),
        |dirs| dirs.home_dir().join(".sense"),
    )
}

/// Get the configuration file path, honouring `SENSE_CONFIG`.
pub fn config_path() -> PathBuf {
    match std::env::var("SENSE_CONFIG") {
        Ok(path) if !path.trim().is_empty() => {
            PathBuf::from(shellexpand::tilde(path.trim()).into_owned())
        }
        _ => config_dir().join("config.json"),
    }
}

// ============================================================================
// Remote Service
// ============================================================================

/// Remote market service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the market service (screener, historical, detail endpoints)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://groqsense.onrender.com".into()
}

fn default_timeout_secs() -> u64 {
    30
}

// ============================================================================
// Chart
// ============================================================================

/// Chart rendering defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Trailing window applied to every chart series
    #[serde(default = "default_max_points")]
    pub max_points: usize,

    /// Range selected when a chart is first opened (5d, 1w, 1m, 6m, 1y, 5y)
    #[serde(default = "default_range")]
    pub default_range: String,

    /// Render the volume bars on the secondary axis
    #[serde(default = "default_true")]
    pub show_volume: bool,

    /// Render the 20/50 period moving averages
    #[serde(default = "default_true")]
    pub show_moving_averages: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            default_range: default_range(),
            show_volume: true,
            show_moving_averages: true,
        }
    }
}

fn default_max_points() -> usize {
    200
}

fn default_range() -> String {
    "1m".into()
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Observability
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets forced to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote market service
    #[serde(default)]
    pub service: ServiceConfig,

    /// Chart defaults
    #[serde(default)]
    pub chart: ChartConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Nothing at this path, defaults used
    Defaults(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) | Self::Defaults(path) => path,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<(Self, ConfigSource)> {
        Self::load_with_source(&config_path())
    }

    /// Load from `path`, falling back to defaults when it does not exist.
    ///
    /// Runs before logging is set up, so the caller reports the source.
    pub fn load_with_source(path: &Path) -> Result<(Self, ConfigSource)> {
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults(path.to_path_buf())));
        }

        let config = Self::load_from(path)?;
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Returns the variables that were set but could not be parsed.
    pub fn apply_env_overrides(&mut self) -> Vec<&'static str> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if let Some(url) = lookup("SENSE_BASE_URL") {
            self.service.base_url = url;
        }
        if let Some(secs) = lookup("SENSE_TIMEOUT_SECS") {
            match secs.trim().parse() {
                Ok(s) => self.service.timeout_secs = s,
                Err(_) => ignored.push("SENSE_TIMEOUT_SECS"),
            }
        }
        if let Some(level) = lookup("SENSE_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("SENSE_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        ignored
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let path = config_path();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create config directory {}", dir.display())
                })?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Service base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.service.base_url.trim_end_matches('/')
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.service.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.chart.max_points, 200);
        assert_eq!(config.chart.default_range, "1m");
        assert!(config.chart.show_volume);
        assert!(config.chart.show_moving_averages);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"service": {{"base_url": "http://localhost:5000/"}}, "chart": {{"max_points": 50}}}}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.base_url(), "http://localhost:5000");
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.chart.max_points, 50);
        assert_eq!(config.chart.default_range, "1m");
    }

    #[test]
    fn test_observability_aliases() {
        let config: Config =
            serde_json::from_str(r#"{"observability": {"level": "debug", "format": "json"}}"#)
                .unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ nope").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SENSE_BASE_URL", "http://127.0.0.1:9000"),
            ("SENSE_TIMEOUT_SECS", "5"),
            ("SENSE_LOG_LEVEL", "trace"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        let ignored = config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert!(ignored.is_empty());

        assert_eq!(config.service.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.service.timeout_secs, 5);
        assert_eq!(config.observability.log_level, "trace");
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_invalid_timeout_override_ignored() {
        let mut config = Config::default();
        let ignored =
            config.apply_overrides(|k| (k == "SENSE_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert_eq!(ignored, vec!["SENSE_TIMEOUT_SECS"]);
        assert_eq!(config.service.timeout_secs, 30);
    }

    #[test]
    fn test_missing_file_reports_defaults_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let (config, source) = Config::load_with_source(&path).unwrap();
        assert_eq!(source, ConfigSource::Defaults(path.clone()));
        assert_eq!(config.service.timeout_secs, 30);
    }

    #[test]
    fn test_existing_file_reports_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"chart": {{"default_range": "1y"}}}}"#).unwrap();

        let (config, source) = Config::load_with_source(file.path()).unwrap();
        assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
        assert_eq!(source.path(), file.path());
        assert_eq!(config.chart.default_range, "1y");
    }
}
