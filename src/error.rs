use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

/// Failure raised by an indicator engine.
///
/// Too little history is never an error: every engine has a degraded result for
/// short series. Only structurally broken input or parameters end up here.
#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("{indicator}: invalid input: {reason}")]
    InvalidInput {
        indicator: &'static str,
        reason: String,
    },
    #[display("{indicator}: invalid parameter `{parameter}`: {reason}")]
    Configuration {
        indicator: &'static str,
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Display, Error)]
pub enum SourceError {
    #[display("failed to read candle file")]
    ReadFile,
    #[display("failed to parse {format} candles")]
    Parse { format: String },
    #[display("malformed stream event")]
    Event,
}

#[derive(Debug, Display, Error)]
pub enum HubError {
    #[display("analysis hub is closed")]
    Closed,
}
