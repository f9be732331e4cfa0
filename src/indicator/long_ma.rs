use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::{Indicator, ensure_finite, ensure_non_empty};
use crate::signal::Signal;
use crate::signal::classifier::classify_trend;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaReading {
    pub value: f64,
    pub signal: Signal,
}

/// Long trend filter (MA200 by default): the latest price against a long SMA.
///
/// Shorter series average every available price instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongMa {
    sma: Sma,
}

impl LongMa {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        Ok(Self {
            sma: Sma::new(period).map_err(|report| {
                report.change_context(IndicatorError::Configuration {
                    indicator: "ma",
                    parameter: "period",
                    reason: "must be > 0".into(),
                })
            })?,
        })
    }

    pub fn period(&self) -> usize {
        self.sma.period()
    }
}

impl Indicator for LongMa {
    type Reading = MaReading;

    fn name(&self) -> &'static str {
        "ma"
    }

    fn required_candles(&self) -> usize {
        self.period()
    }

    fn compute(&self, prices: &[f64]) -> Result<MaReading, Report<IndicatorError>> {
        ensure_non_empty(self.name(), prices)?;
        ensure_finite(self.name(), prices)?;
        let value = self.sma.value(prices)?;
        let price = prices[prices.len() - 1];
        Ok(MaReading {
            value,
            signal: classify_trend(price, value),
        })
    }
}
