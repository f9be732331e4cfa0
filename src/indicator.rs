pub mod bollinger;
pub mod long_ma;
pub mod ma;
pub mod macd;
pub mod rsi;

use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::model::Candle;

/// A technical analysis indicator evaluated at the latest point of a close-price series.
///
/// Prices must be in ascending chronological order (oldest first). Series that
/// are shorter than [`Indicator::required_candles`] produce a degraded reading
/// instead of an error.
pub trait Indicator {
    type Reading;

    /// Unique name of this indicator (e.g., "rsi", "macd").
    fn name(&self) -> &'static str;

    /// Number of candles needed for a fully supported (non-degraded) reading.
    fn required_candles(&self) -> usize;

    fn compute(&self, prices: &[f64]) -> Result<Self::Reading, Report<IndicatorError>>;
}

/// Extract close prices from a slice of candles.
pub fn close_prices(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

pub(crate) fn ensure_finite(indicator: &'static str, prices: &[f64]) -> Result<(), Report<IndicatorError>> {
    if let Some(index) = prices.iter().position(|p| !p.is_finite()) {
        bail!(IndicatorError::InvalidInput {
            indicator,
            reason: format!("non-finite price {} at index {index}", prices[index]),
        });
    }
    Ok(())
}

pub(crate) fn ensure_non_empty(indicator: &'static str, prices: &[f64]) -> Result<(), Report<IndicatorError>> {
    if prices.is_empty() {
        bail!(IndicatorError::InvalidInput {
            indicator,
            reason: "price series is empty".into(),
        });
    }
    Ok(())
}

pub(crate) fn ensure_period(
    indicator: &'static str,
    parameter: &'static str,
    period: usize,
) -> Result<(), Report<IndicatorError>> {
    if period == 0 {
        bail!(IndicatorError::Configuration {
            indicator,
            parameter,
            reason: "must be > 0".into(),
        });
    }
    Ok(())
}

/// Check that candles are strictly ascending by open time and carry finite values.
pub fn validate_series(indicator: &'static str, candles: &[Candle]) -> Result<(), Report<IndicatorError>> {
    for (index, pair) in candles.windows(2).enumerate() {
        if pair[1].open_time <= pair[0].open_time {
            bail!(IndicatorError::InvalidInput {
                indicator,
                reason: format!(
                    "candle {} at {} is not after {}",
                    index + 1,
                    pair[1].open_time,
                    pair[0].open_time
                ),
            });
        }
    }
    for (index, candle) in candles.iter().enumerate() {
        let fields = [candle.open, candle.high, candle.low, candle.close, candle.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            bail!(IndicatorError::InvalidInput {
                indicator,
                reason: format!("candle {index} at {} has a non-finite value", candle.open_time),
            });
        }
    }
    Ok(())
}
