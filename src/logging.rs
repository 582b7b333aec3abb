//! Logging System
//!
//! Structured logging implementation using the `tracing` crate. Provides
//! configurable log levels, output formats, and destinations for the
//! engine's CLI callers.

use crate::error::SetupError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output is file; None means use runtime default
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
        }
    }
}

/// Resolve the log file path with precedence: FILEMEM_LOG_FILE env, config
/// file, platform default.
///
/// The default uses the `ProjectDirs` state directory.
pub fn resolve_log_file_path(config_file: Option<PathBuf>) -> Result<PathBuf, SetupError> {
    if let Ok(env_path) = std::env::var("FILEMEM_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    let project_dirs = directories::ProjectDirs::from("", "filemem", "filemem").ok_or_else(|| {
        SetupError::Config("Could not determine platform state directory for log file".to_string())
    })?;
    let state_dir = project_dirs.state_dir().ok_or_else(|| {
        SetupError::Config("Platform state directory not available for log file".to_string())
    })?;
    Ok(state_dir.join("filemem.log"))
}

/// Initialize the logging system
///
/// Priority order (highest to lowest): environment variables (FILEMEM_LOG,
/// FILEMEM_LOG_FORMAT, FILEMEM_LOG_FILE), configuration, defaults.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), SetupError> {
    let disabled = config.map(|c| !c.enabled).unwrap_or(false);
    if disabled {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(|| std::io::sink()))
            .init();
        return Ok(());
    }

    let filter = build_env_filter(config);
    let format = determine_format(config);
    let output = config
        .map(|c| c.output.clone())
        .unwrap_or_else(default_output);
    let use_color = config.map(|c| c.color).unwrap_or(true);

    let base_subscriber = Registry::default().with(filter);

    if output == "file" {
        let log_file = resolve_log_file_path(config.and_then(|c| c.file.clone()))?;
        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SetupError::Config(format!("Failed to create log directory: {}", e))
            })?;
        }
        let file_writer = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .map_err(|e| {
                SetupError::Config(format!("Failed to open log file {:?}: {}", log_file, e))
            })?;
        if format == "json" {
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(file_writer),
                )
                .init();
        } else {
            base_subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(false)
                        .with_writer(file_writer),
                )
                .init();
        }
    } else if output == "stdout" {
        if format == "json" {
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(std::io::stdout),
                )
                .init();
        } else {
            base_subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(use_color)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    } else if format == "json" {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}

/// Build environment filter from config or the FILEMEM_LOG variable
fn build_env_filter(config: Option<&LoggingConfig>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("FILEMEM_LOG") {
        return filter;
    }
    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    EnvFilter::new(level)
}

/// Determine output format from config or environment
fn determine_format(config: Option<&LoggingConfig>) -> String {
    if let Ok(format) = std::env::var("FILEMEM_LOG_FORMAT") {
        if format == "json" || format == "text" {
            return format;
        }
    }
    config
        .map(|c| c.format.clone())
        .unwrap_or_else(default_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "text");
        assert_eq!(config.output, "stderr");
        assert!(config.file.is_none());
        assert!(config.color);
    }

    #[test]
    fn test_config_deserializes_with_partial_fields() {
        let config: LoggingConfig = serde_json::from_str(r#"{"level": "debug"}"#).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, "text");
        assert!(config.enabled);
    }

    #[test]
    fn test_explicit_file_path_wins_over_default() {
        let path = resolve_log_file_path(Some(PathBuf::from("/tmp/custom.log"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.log"));
    }
}
