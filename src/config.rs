use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::analysis::{AnalysisParams, Analyzer};
use crate::error::ConfigError;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_workers() -> usize {
    4
}

fn default_channel_capacity() -> usize {
    1024
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub indicators: AnalysisParams,
    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"coin_analyzer=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Where the `stream` command publishes snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Structured log lines on stderr.
    #[default]
    Terminal,
    /// One JSON object per snapshot on stdout.
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Number of shard workers in the analysis hub.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Queued commands per shard before senders wait.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Publish a snapshot only when the overall signal of its series changes.
    #[serde(default)]
    pub only_changes: bool,
    #[serde(default)]
    pub output: OutputKind,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            channel_capacity: default_channel_capacity(),
            only_changes: false,
            output: OutputKind::default(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(config)?;
    validate_stream(config)?;
    validate_indicators(config)?;
    Ok(())
}

fn validate_general(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let general = &config.general;
    if !VALID_LOG_FORMATS.contains(&general.log_format.as_str()) {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "general.log_format \"{}\" is not one of {VALID_LOG_FORMATS:?}",
                general.log_format
            ),
        }));
    }
    tracing_subscriber::EnvFilter::try_new(&general.log_level).change_context(
        ConfigError::Validation {
            field: format!("general.log_level \"{}\" is not a valid filter", general.log_level),
        },
    )?;
    Ok(())
}

fn validate_stream(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let stream = &config.stream;
    if stream.workers == 0 {
        return Err(Report::new(ConfigError::Validation {
            field: "stream.workers must be >= 1".into(),
        }));
    }
    if stream.channel_capacity == 0 {
        return Err(Report::new(ConfigError::Validation {
            field: "stream.channel_capacity must be >= 1".into(),
        }));
    }
    Ok(())
}

fn validate_indicators(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    Analyzer::new(&config.indicators).change_context(ConfigError::Validation {
        field: "indicators".into(),
    })?;
    Ok(())
}
