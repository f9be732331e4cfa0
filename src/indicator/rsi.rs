use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_finite, ensure_period};
use crate::signal::Signal;
use crate::signal::classifier::classify_rsi;

/// RSI reported while fewer than `period + 1` prices are available.
pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiReading {
    pub value: f64,
    pub signal: Signal,
}

/// RSI (Relative Strength Index) using Wilder's smoothing method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rsi {
    period: usize,
    oversold: f64,
    overbought: f64,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        Self::with_thresholds(period, 30.0, 70.0)
    }

    pub fn with_thresholds(
        period: usize,
        oversold: f64,
        overbought: f64,
    ) -> Result<Self, Report<IndicatorError>> {
        ensure_period("rsi", "period", period)?;
        for (parameter, value) in [("oversold", oversold), ("overbought", overbought)] {
            if !(0.0..=100.0).contains(&value) {
                bail!(IndicatorError::Configuration {
                    indicator: "rsi",
                    parameter,
                    reason: format!("{value} is outside 0..=100"),
                });
            }
        }
        if oversold >= overbought {
            bail!(IndicatorError::Configuration {
                indicator: "rsi",
                parameter: "oversold",
                reason: format!("{oversold} must be below overbought ({overbought})"),
            });
        }
        Ok(Self {
            period,
            oversold,
            overbought,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Fresh streaming state for this configuration.
    pub fn state(&self) -> RsiState {
        RsiState::new(self.period)
    }

    pub fn reading(&self, state: &RsiState) -> RsiReading {
        let value = state.value();
        RsiReading {
            value,
            signal: classify_rsi(value, self.oversold, self.overbought),
        }
    }
}

impl Indicator for Rsi {
    type Reading = RsiReading;

    fn name(&self) -> &'static str {
        "rsi"
    }

    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, prices: &[f64]) -> Result<RsiReading, Report<IndicatorError>> {
        ensure_finite(self.name(), prices)?;
        let mut state = self.state();
        for &price in prices {
            state.update(price);
        }
        Ok(self.reading(&state))
    }
}

/// Running Wilder averages of gains and losses.
///
/// The first `period` deltas are summed into a simple average; every later
/// delta is blended in with weight `1/period`.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiState {
    period: usize,
    last_price: Option<f64>,
    deltas: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiState {
    /// Built through [`Rsi::state`], which owns the period validation.
    pub(crate) fn new(period: usize) -> Self {
        Self {
            period,
            last_price: None,
            deltas: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    pub fn update(&mut self, price: f64) {
        if let Some(last) = self.last_price {
            let delta = price - last;
            let gain = delta.max(0.0);
            let loss = (-delta).max(0.0);
            let period = self.period as f64;
            self.deltas += 1;

            if self.deltas <= self.period {
                self.gain_sum += gain;
                self.loss_sum += loss;
                if self.deltas == self.period {
                    self.avg_gain = self.gain_sum / period;
                    self.avg_loss = self.loss_sum / period;
                }
            } else {
                self.avg_gain = (self.avg_gain * (period - 1.0) + gain) / period;
                self.avg_loss = (self.avg_loss * (period - 1.0) + loss) / period;
            }
        }
        self.last_price = Some(price);
    }

    /// Current RSI; [`NEUTRAL_RSI`] until `period` deltas have been seen.
    ///
    /// A zero average loss gives 100, which includes a perfectly flat market.
    pub fn value(&self) -> f64 {
        if self.deltas < self.period {
            return NEUTRAL_RSI;
        }
        if self.avg_loss == 0.0 {
            return 100.0;
        }
        let rs = self.avg_gain / self.avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.period);
    }
}
