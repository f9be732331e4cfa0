use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{ensure_finite, ensure_non_empty, ensure_period};

/// Simple Moving Average over the most recent `period` prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period("sma", "period", period)?;
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Mean of the last `period` prices, or of every price when the series is shorter.
    pub fn value(&self, prices: &[f64]) -> Result<f64, Report<IndicatorError>> {
        ensure_non_empty("sma", prices)?;
        ensure_finite("sma", prices)?;
        let window = &prices[prices.len().saturating_sub(self.period)..];
        Ok(window.iter().sum::<f64>() / window.len() as f64)
    }
}

/// Exponential Moving Average evaluated at the latest price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period("ema", "period", period)?;
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// EMA seeded with the SMA of the first `period` prices. A series shorter
    /// than `period` yields the mean of every price.
    pub fn value(&self, prices: &[f64]) -> Result<f64, Report<IndicatorError>> {
        ensure_non_empty("ema", prices)?;
        ensure_finite("ema", prices)?;
        let mut state = EmaState::new(self.period);
        let mut ema = 0.0;
        for &price in prices {
            ema = state.update(price);
        }
        Ok(ema)
    }
}

/// Running EMA updated one price at a time.
///
/// Until `period` samples have been seen the value is the running mean, which
/// makes the value after the `period`-th sample the SMA seed. Folding any series
/// through the state gives the same result as [`Ema::value`] on that series.
#[derive(Debug, Clone, PartialEq)]
pub struct EmaState {
    period: usize,
    k: f64,
    count: usize,
    sum: f64,
    value: Option<f64>,
}

impl EmaState {
    /// `period` must already be validated as non-zero.
    pub(crate) fn new(period: usize) -> Self {
        Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            count: 0,
            sum: 0.0,
            value: None,
        }
    }

    pub fn update(&mut self, price: f64) -> f64 {
        self.count += 1;
        let next = match self.value {
            Some(prev) if self.count > self.period => (price - prev) * self.k + prev,
            _ => {
                self.sum += price;
                self.sum / self.count as f64
            }
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn samples(&self) -> usize {
        self.count
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.period);
    }
}
