//! Per-indicator mapping from raw values to a [`Signal`].

use crate::signal::Signal;

/// Overbought RSI reads as `sell`, oversold as `buy`. RSI never yields a strong tier.
pub fn classify_rsi(value: f64, oversold: f64, overbought: f64) -> Signal {
    if value > overbought {
        Signal::Sell
    } else if value < oversold {
        Signal::Buy
    } else {
        Signal::Neutral
    }
}

/// Histogram sign picks the direction; a histogram still moving away from zero
/// (compared with the previous bar) upgrades it to the strong tier.
pub fn classify_macd(histogram: f64, previous_histogram: f64) -> Signal {
    if histogram > 0.0 {
        if histogram > previous_histogram {
            Signal::StrongBuy
        } else {
            Signal::Buy
        }
    } else if histogram < 0.0 {
        if histogram < previous_histogram {
            Signal::StrongSell
        } else {
            Signal::Sell
        }
    } else {
        Signal::Neutral
    }
}

/// Price above the upper band is `sell`, below the lower band is `buy`.
pub fn classify_bands(price: f64, upper: f64, lower: f64) -> Signal {
    if price > upper {
        Signal::Sell
    } else if price < lower {
        Signal::Buy
    } else {
        Signal::Neutral
    }
}

/// Price above the moving average is `buy`, below it is `sell`.
pub fn classify_trend(price: f64, average: f64) -> Signal {
    if price > average {
        Signal::Buy
    } else if price < average {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_thresholds_are_exclusive() {
        assert_eq!(classify_rsi(70.0, 30.0, 70.0), Signal::Neutral);
        assert_eq!(classify_rsi(70.1, 30.0, 70.0), Signal::Sell);
        assert_eq!(classify_rsi(30.0, 30.0, 70.0), Signal::Neutral);
        assert_eq!(classify_rsi(29.9, 30.0, 70.0), Signal::Buy);
    }

    #[test]
    fn rsi_custom_thresholds() {
        assert_eq!(classify_rsi(65.0, 35.0, 60.0), Signal::Sell);
        assert_eq!(classify_rsi(33.0, 35.0, 60.0), Signal::Buy);
    }

    #[test]
    fn macd_two_tier() {
        assert_eq!(classify_macd(2.0, 1.0), Signal::StrongBuy);
        assert_eq!(classify_macd(1.0, 2.0), Signal::Buy);
        assert_eq!(classify_macd(1.0, 1.0), Signal::Buy);
        assert_eq!(classify_macd(-2.0, -1.0), Signal::StrongSell);
        assert_eq!(classify_macd(-1.0, -2.0), Signal::Sell);
        assert_eq!(classify_macd(0.0, 5.0), Signal::Neutral);
    }

    #[test]
    fn bands_boundaries_are_neutral() {
        assert_eq!(classify_bands(110.0, 110.0, 90.0), Signal::Neutral);
        assert_eq!(classify_bands(90.0, 110.0, 90.0), Signal::Neutral);
        assert_eq!(classify_bands(111.0, 110.0, 90.0), Signal::Sell);
        assert_eq!(classify_bands(89.0, 110.0, 90.0), Signal::Buy);
    }

    #[test]
    fn trend_against_average() {
        assert_eq!(classify_trend(101.0, 100.0), Signal::Buy);
        assert_eq!(classify_trend(99.0, 100.0), Signal::Sell);
        assert_eq!(classify_trend(100.0, 100.0), Signal::Neutral);
    }
}
