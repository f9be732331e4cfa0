use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::{Indicator, ensure_finite, ensure_non_empty, ensure_period};
use crate::signal::Signal;
use crate::signal::classifier::classify_bands;

/// Fixed band factors used when the series is shorter than `period`.
const DEGRADED_UPPER: f64 = 1.1;
const DEGRADED_LOWER: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub signal: Signal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    sma: Sma,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        ensure_period("bollinger", "period", period)?;
        if !std_dev_multiplier.is_finite() || std_dev_multiplier < 0.0 {
            bail!(IndicatorError::Configuration {
                indicator: "bollinger",
                parameter: "multiplier",
                reason: format!("{std_dev_multiplier} must be finite and >= 0"),
            });
        }
        Ok(Self {
            sma: Sma::new(period)?,
            std_dev_multiplier,
        })
    }

    pub fn period(&self) -> usize {
        self.sma.period()
    }

    /// Returns (upper, middle, lower) at the latest price.
    ///
    /// With fewer than `period` prices this is not a statistical band: the
    /// middle is the mean of every price and the bands sit a fixed 10% away.
    /// For a negative mean the 1.1 and 0.9 factors swap so upper stays above lower.
    pub fn bands(&self, prices: &[f64]) -> Result<(f64, f64, f64), Report<IndicatorError>> {
        let middle = self.sma.value(prices)?;
        let period = self.period();

        if prices.len() < period {
            let (upper, lower) = if middle >= 0.0 {
                (middle * DEGRADED_UPPER, middle * DEGRADED_LOWER)
            } else {
                (middle * DEGRADED_LOWER, middle * DEGRADED_UPPER)
            };
            return Ok((upper, middle, lower));
        }

        let window = &prices[prices.len() - period..];
        let variance = window.iter().map(|&p| (p - middle).powi(2)).sum::<f64>() / period as f64;
        let std_dev = variance.sqrt();
        Ok((
            middle + self.std_dev_multiplier * std_dev,
            middle,
            middle - self.std_dev_multiplier * std_dev,
        ))
    }
}

impl Indicator for BollingerBands {
    type Reading = BollingerReading;

    fn name(&self) -> &'static str {
        "bollinger"
    }

    fn required_candles(&self) -> usize {
        self.period()
    }

    fn compute(&self, prices: &[f64]) -> Result<BollingerReading, Report<IndicatorError>> {
        ensure_non_empty(self.name(), prices)?;
        ensure_finite(self.name(), prices)?;
        let (upper, middle, lower) = self.bands(prices)?;
        let price = prices[prices.len() - 1];
        Ok(BollingerReading {
            upper,
            middle,
            lower,
            signal: classify_bands(price, upper, lower),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_period_zero_invalid() {
        assert!(BollingerBands::new(0, 2.0).is_err());
    }

    #[test]
    fn bollinger_negative_multiplier_invalid() {
        let err = BollingerBands::new(20, -1.0).unwrap_err();
        assert!(matches!(
            err.current_context(),
            IndicatorError::Configuration { parameter: "multiplier", .. }
        ));
        assert!(BollingerBands::new(20, f64::NAN).is_err());
    }

    #[test]
    fn bollinger_empty_prices_invalid() {
        let bb = BollingerBands::new(20, 2.0).unwrap();
        let err = bb.compute(&[]).unwrap_err();
        assert!(matches!(
            err.current_context(),
            IndicatorError::InvalidInput { indicator: "bollinger", .. }
        ));
    }

    #[test]
    fn bollinger_short_series_uses_fixed_band() {
        let bb = BollingerBands::new(20, 2.0).unwrap();
        let prices = [100.0, 102.0, 98.0, 101.0, 99.0];
        let reading = bb.compute(&prices).unwrap();
        let mean = prices.iter().sum::<f64>() / prices.len() as f64;
        assert_eq!(reading.middle, mean);
        assert_eq!(reading.upper, mean * 1.1);
        assert_eq!(reading.lower, mean * 0.9);
        assert_eq!(reading.signal, Signal::Neutral);
    }

    #[test]
    fn bollinger_short_negative_series_keeps_order() {
        let bb = BollingerBands::new(20, 2.0).unwrap();
        let reading = bb.compute(&[-5.0, -3.0]).unwrap();
        assert!(reading.upper >= reading.middle && reading.middle >= reading.lower);
    }

    #[test]
    fn bollinger_flat_prices_zero_width() {
        let bb = BollingerBands::new(20, 2.0).unwrap();
        let reading = bb.compute(&[100.0; 300]).unwrap();
        assert_eq!(reading.upper, 100.0);
        assert_eq!(reading.middle, 100.0);
        assert_eq!(reading.lower, 100.0);
        assert_eq!(reading.signal, Signal::Neutral);
    }

    #[test]
    fn bollinger_population_std_dev() {
        let bb = BollingerBands::new(4, 1.0).unwrap();
        // window 2,4,4,6: mean 4, population variance (4+0+0+4)/4 = 2
        let (upper, middle, lower) = bb.bands(&[100.0, 2.0, 4.0, 4.0, 6.0]).unwrap();
        assert!((middle - 4.0).abs() < 1e-9);
        assert!((upper - (4.0 + 2f64.sqrt())).abs() < 1e-9);
        assert!((lower - (4.0 - 2f64.sqrt())).abs() < 1e-9);
    }

    #[test]
    fn bollinger_bands_ordered_on_both_paths() {
        let bb = BollingerBands::new(20, 2.0).unwrap();
        let prices: Vec<f64> = (0..60).map(|i| 50.0 + ((i * 13) % 7) as f64).collect();
        for end in 1..=prices.len() {
            let reading = bb.compute(&prices[..end]).unwrap();
            assert!(reading.upper >= reading.middle, "upper below middle at {end}");
            assert!(reading.middle >= reading.lower, "lower above middle at {end}");
        }
    }

    #[test]
    fn bollinger_breakout_signals() {
        let bb = BollingerBands::new(10, 2.0).unwrap();
        let mut prices = vec![10.0; 9];
        prices.push(20.0);
        assert_eq!(bb.compute(&prices).unwrap().signal, Signal::Sell);
        prices.pop();
        prices.push(0.5);
        assert_eq!(bb.compute(&prices).unwrap().signal, Signal::Buy);
    }

    #[test]
    fn zero_multiplier_collapses_bands() {
        let bb = BollingerBands::new(3, 0.0).unwrap();
        let (upper, middle, lower) = bb.bands(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(upper, middle);
        assert_eq!(lower, middle);
    }
}
