use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use error_stack::{Report, bail};

use crate::analysis::{AnalysisSnapshot, Analyzer};
use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::macd::MacdState;
use crate::indicator::rsi::RsiState;
use crate::indicator::validate_series;
use crate::model::Candle;

/// Incremental analyzer for a single (symbol, timeframe) series.
///
/// RSI and MACD are carried as running state and cost O(1) per candle. Bollinger
/// and the long MA read a bounded window of recent closes. Feeding a series one
/// candle at a time yields the same snapshot as [`Analyzer::analyze`] on the
/// whole series.
///
/// Not synchronized: a single owner must apply updates for a given key.
#[derive(Debug, Clone)]
pub struct StreamingAnalyzer {
    analyzer: Analyzer,
    rsi: RsiState,
    macd: MacdState,
    window: VecDeque<f64>,
    last_open_time: Option<DateTime<Utc>>,
}

impl StreamingAnalyzer {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            rsi: analyzer.rsi.state(),
            macd: analyzer.macd.state(),
            window: VecDeque::new(),
            last_open_time: None,
            analyzer,
        }
    }

    /// Replace all state with the given history (cold start).
    ///
    /// Returns the snapshot at the last candle, or `None` for an empty history.
    pub fn seed(&mut self, candles: &[Candle]) -> Result<Option<AnalysisSnapshot>, Report<IndicatorError>> {
        validate_series("analysis", candles)?;
        self.reset();
        for candle in candles {
            self.push(candle);
        }
        if candles.is_empty() {
            return Ok(None);
        }
        self.snapshot().map(Some)
    }

    pub fn reset(&mut self) {
        self.rsi.reset();
        self.macd.reset();
        self.window.clear();
        self.last_open_time = None;
    }

    /// Append the next candle and return the fresh snapshot.
    ///
    /// The candle must open strictly after the previous one.
    pub fn update(&mut self, candle: &Candle) -> Result<AnalysisSnapshot, Report<IndicatorError>> {
        validate_series("analysis", std::slice::from_ref(candle))?;
        if let Some(last) = self.last_open_time.filter(|last| candle.open_time <= *last) {
            bail!(IndicatorError::InvalidInput {
                indicator: "analysis",
                reason: format!("candle at {} is not after {last}", candle.open_time),
            });
        }
        self.push(candle);
        self.snapshot()
    }

    pub fn snapshot(&self) -> Result<AnalysisSnapshot, Report<IndicatorError>> {
        let window: Vec<f64> = self.window.iter().copied().collect();
        let Some(&price) = window.last() else {
            bail!(IndicatorError::InvalidInput {
                indicator: "analysis",
                reason: "no candles received yet".into(),
            });
        };
        Ok(AnalysisSnapshot::assemble(
            price,
            self.analyzer.rsi.reading(&self.rsi),
            self.analyzer.macd.reading(&self.macd),
            self.analyzer.bollinger.compute(&window)?,
            self.analyzer.ma.compute(&window)?,
        ))
    }

    /// Number of candles folded in since the last seed or reset.
    pub fn samples(&self) -> usize {
        self.macd.samples()
    }

    pub fn last_open_time(&self) -> Option<DateTime<Utc>> {
        self.last_open_time
    }

    fn push(&mut self, candle: &Candle) {
        self.rsi.update(candle.close);
        self.macd.update(candle.close);
        if self.window.len() == self.analyzer.window_len() {
            self.window.pop_front();
        }
        self.window.push_back(candle.close);
        self.last_open_time = Some(candle.open_time);
    }
}
