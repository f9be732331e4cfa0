pub mod stream;

use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;
use crate::indicator::bollinger::{BollingerBands, BollingerReading};
use crate::indicator::long_ma::{LongMa, MaReading};
use crate::indicator::macd::{Macd, MacdReading};
use crate::indicator::rsi::{Rsi, RsiReading};
use crate::indicator::{Indicator, close_prices, validate_series};
use crate::model::Candle;
use crate::signal::Signal;
use crate::signal::aggregator::aggregate;

fn default_rsi_period() -> usize {
    14
}

fn default_oversold() -> f64 {
    30.0
}

fn default_overbought() -> f64 {
    70.0
}

fn default_fast_period() -> usize {
    12
}

fn default_slow_period() -> usize {
    26
}

fn default_signal_period() -> usize {
    9
}

fn default_bollinger_period() -> usize {
    20
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_ma_period() -> usize {
    200
}

/// Indicator parameters, read from the `[indicators]` config table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalysisParams {
    #[serde(default)]
    pub rsi: RsiParams,
    #[serde(default)]
    pub macd: MacdParams,
    #[serde(default)]
    pub bollinger: BollingerParams,
    #[serde(default)]
    pub ma: MaParams,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RsiParams {
    #[serde(default = "default_rsi_period")]
    pub period: usize,
    #[serde(default = "default_oversold")]
    pub oversold: f64,
    #[serde(default = "default_overbought")]
    pub overbought: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: default_rsi_period(),
            oversold: default_oversold(),
            overbought: default_overbought(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MacdParams {
    #[serde(default = "default_fast_period")]
    pub fast_period: usize,
    #[serde(default = "default_slow_period")]
    pub slow_period: usize,
    #[serde(default = "default_signal_period")]
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: default_fast_period(),
            slow_period: default_slow_period(),
            signal_period: default_signal_period(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BollingerParams {
    #[serde(default = "default_bollinger_period")]
    pub period: usize,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: default_bollinger_period(),
            multiplier: default_multiplier(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MaParams {
    #[serde(default = "default_ma_period")]
    pub period: usize,
}

impl Default for MaParams {
    fn default() -> Self {
        Self {
            period: default_ma_period(),
        }
    }
}

/// Result of one recomputation: every indicator reading plus the overall vote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    /// Latest close the readings were evaluated at.
    pub price: f64,
    pub rsi: RsiReading,
    pub macd: MacdReading,
    pub bollinger: BollingerReading,
    pub ma: MaReading,
    pub overall_signal: Signal,
}

impl AnalysisSnapshot {
    fn assemble(
        price: f64,
        rsi: RsiReading,
        macd: MacdReading,
        bollinger: BollingerReading,
        ma: MaReading,
    ) -> Self {
        Self {
            price,
            rsi,
            macd,
            bollinger,
            ma,
            overall_signal: aggregate(rsi.signal, macd.signal, bollinger.signal, ma.signal),
        }
    }
}

/// The four indicator engines built from validated [`AnalysisParams`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Analyzer {
    rsi: Rsi,
    macd: Macd,
    bollinger: BollingerBands,
    ma: LongMa,
}

impl Analyzer {
    /// Build the engines, rejecting inconsistent parameters before any computation.
    pub fn new(params: &AnalysisParams) -> Result<Self, Report<IndicatorError>> {
        Ok(Self {
            rsi: Rsi::with_thresholds(
                params.rsi.period,
                params.rsi.oversold,
                params.rsi.overbought,
            )?,
            macd: Macd::new(
                params.macd.fast_period,
                params.macd.slow_period,
                params.macd.signal_period,
            )?,
            bollinger: BollingerBands::new(params.bollinger.period, params.bollinger.multiplier)?,
            ma: LongMa::new(params.ma.period)?,
        })
    }

    /// Candles needed before no indicator runs in its degraded mode.
    pub fn required_candles(&self) -> usize {
        [
            self.rsi.required_candles(),
            self.macd.required_candles(),
            self.bollinger.required_candles(),
            self.ma.required_candles(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Closes kept by a streaming analyzer to serve the windowed indicators.
    pub(crate) fn window_len(&self) -> usize {
        self.bollinger.period().max(self.ma.period())
    }

    pub fn analyze(&self, candles: &[Candle]) -> Result<AnalysisSnapshot, Report<IndicatorError>> {
        validate_series("analysis", candles)?;
        self.analyze_prices(&close_prices(candles))
    }

    pub fn analyze_prices(&self, prices: &[f64]) -> Result<AnalysisSnapshot, Report<IndicatorError>> {
        let Some(&price) = prices.last() else {
            bail!(IndicatorError::InvalidInput {
                indicator: "analysis",
                reason: "price series is empty".into(),
            });
        };
        Ok(AnalysisSnapshot::assemble(
            price,
            self.rsi.compute(prices)?,
            self.macd.compute(prices)?,
            self.bollinger.compute(prices)?,
            self.ma.compute(prices)?,
        ))
    }
}
