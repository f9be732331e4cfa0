pub mod binance;

use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::SourceError;
use crate::model::{Candle, SeriesKey, TimeFrame};

/// On-disk layout of a candle file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CandleFormat {
    /// JSON array of [`Candle`] objects.
    Json,
    /// Raw Binance `/api/v3/klines` response rows.
    BinanceKlines,
}

impl CandleFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::BinanceKlines => "binance-klines",
        }
    }
}

/// Load and parse a candle file in the given format.
pub fn load_candles(path: &Path, format: CandleFormat) -> Result<Vec<Candle>, Report<SourceError>> {
    let content = std::fs::read_to_string(path)
        .change_context(SourceError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;
    parse_candles(&content, format).attach_with(|| format!("path: {}", path.display()))
}

pub fn parse_candles(content: &str, format: CandleFormat) -> Result<Vec<Candle>, Report<SourceError>> {
    let parse_error = || SourceError::Parse {
        format: format.as_str().into(),
    };
    match format {
        CandleFormat::Json => serde_json::from_str(content).change_context_lazy(parse_error),
        CandleFormat::BinanceKlines => {
            let rows: Vec<binance::KlineRow> =
                serde_json::from_str(content).change_context_lazy(parse_error)?;
            rows.into_iter().map(binance::KlineRow::into_candle).collect()
        }
    }
}

/// One line of the `stream` input: newline-delimited JSON, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Replace the series state with a block of history.
    Seed {
        symbol: String,
        timeframe: TimeFrame,
        candles: Vec<Candle>,
    },
    /// Append one closed candle.
    Candle {
        symbol: String,
        timeframe: TimeFrame,
        candle: Candle,
    },
    /// Drop all state for the series.
    Reset { symbol: String, timeframe: TimeFrame },
}

impl StreamEvent {
    pub fn parse(line: &str) -> Result<Self, Report<SourceError>> {
        serde_json::from_str(line)
            .change_context(SourceError::Event)
            .attach_with(|| format!("line: {line}"))
    }

    pub fn key(&self) -> SeriesKey {
        match self {
            Self::Seed {
                symbol, timeframe, ..
            }
            | Self::Candle {
                symbol, timeframe, ..
            }
            | Self::Reset { symbol, timeframe } => SeriesKey::new(symbol.clone(), *timeframe),
        }
    }
}
