use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;
use crate::indicator::ma::EmaState;
use crate::indicator::{Indicator, ensure_finite, ensure_period};
use crate::signal::Signal;
use crate::signal::classifier::classify_macd;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
    pub previous_histogram: f64,
    pub signal: Signal,
}

impl MacdReading {
    /// All-zero reading used until `slow_period + signal_period` prices exist.
    pub const DEGRADED: Self = Self {
        macd_line: 0.0,
        signal_line: 0.0,
        histogram: 0.0,
        previous_histogram: 0.0,
        signal: Signal::Neutral,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        ensure_period("macd", "fast_period", fast_period)?;
        ensure_period("macd", "slow_period", slow_period)?;
        ensure_period("macd", "signal_period", signal_period)?;
        if fast_period >= slow_period {
            bail!(IndicatorError::Configuration {
                indicator: "macd",
                parameter: "fast_period",
                reason: format!("{fast_period} must be < slow_period ({slow_period})"),
            });
        }
        Ok(Self {
            fast_period,
            slow_period,
            signal_period,
        })
    }

    /// Fresh streaming state for this configuration.
    pub fn state(&self) -> MacdState {
        MacdState::new(self.fast_period, self.slow_period, self.signal_period)
    }

    pub fn reading(&self, state: &MacdState) -> MacdReading {
        if state.samples() < self.required_candles() {
            return MacdReading::DEGRADED;
        }
        let histogram = state.histogram;
        let previous_histogram = state.previous_histogram;
        MacdReading {
            macd_line: state.macd_line,
            signal_line: state.signal_line,
            histogram,
            previous_histogram,
            signal: classify_macd(histogram, previous_histogram),
        }
    }
}

impl Indicator for Macd {
    type Reading = MacdReading;

    fn name(&self) -> &'static str {
        "macd"
    }

    fn required_candles(&self) -> usize {
        self.slow_period + self.signal_period
    }

    /// Folds the whole series through a fresh [`MacdState`], so the signal
    /// line covers the full MACD-line history in a single pass.
    fn compute(&self, prices: &[f64]) -> Result<MacdReading, Report<IndicatorError>> {
        ensure_finite(self.name(), prices)?;
        let mut state = self.state();
        for &price in prices {
            state.update(price);
        }
        Ok(self.reading(&state))
    }
}

/// Streaming MACD: fast, slow and signal EMAs carried as scalars, plus the
/// histogram of the previous step for trend comparison.
///
/// Each EMA follows the warm-up rule of [`EmaState`], so the MACD line at every
/// index equals `EMA(prefix, fast) - EMA(prefix, slow)` for that prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdState {
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
    macd_line: f64,
    signal_line: f64,
    histogram: f64,
    previous_histogram: f64,
}

impl MacdState {
    /// Built through [`Macd::state`], which owns the period validation.
    pub(crate) fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast: EmaState::new(fast_period),
            slow: EmaState::new(slow_period),
            signal: EmaState::new(signal_period),
            macd_line: 0.0,
            signal_line: 0.0,
            histogram: 0.0,
            previous_histogram: 0.0,
        }
    }

    pub fn update(&mut self, price: f64) {
        let macd_line = self.fast.update(price) - self.slow.update(price);
        let signal_line = self.signal.update(macd_line);
        self.previous_histogram = self.histogram;
        self.macd_line = macd_line;
        self.signal_line = signal_line;
        self.histogram = macd_line - signal_line;
    }

    /// Number of prices folded in so far.
    pub fn samples(&self) -> usize {
        self.fast.samples()
    }

    pub fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
        self.macd_line = 0.0;
        self.signal_line = 0.0;
        self.histogram = 0.0;
        self.previous_histogram = 0.0;
    }
}
