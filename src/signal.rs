pub mod aggregator;
pub mod classifier;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Categorical trading signal emitted by each indicator and by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl Signal {
    /// `true` for [`Signal::Buy`] and [`Signal::StrongBuy`].
    pub fn is_buy(self) -> bool {
        matches!(self, Self::Buy | Self::StrongBuy)
    }

    /// `true` for [`Signal::Sell`] and [`Signal::StrongSell`].
    pub fn is_sell(self) -> bool {
        matches!(self, Self::Sell | Self::StrongSell)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongBuy => "strong_buy",
            Self::Buy => "buy",
            Self::Neutral => "neutral",
            Self::Sell => "sell",
            Self::StrongSell => "strong_sell",
        }
    }

    /// Human-readable label for presentation layers.
    pub fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Neutral => "Neutral",
            Self::Sell => "Sell",
            Self::StrongSell => "Strong Sell",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_and_sell_membership() {
        assert!(Signal::Buy.is_buy());
        assert!(Signal::StrongBuy.is_buy());
        assert!(!Signal::Neutral.is_buy());
        assert!(!Signal::Sell.is_buy());
        assert!(Signal::Sell.is_sell());
        assert!(Signal::StrongSell.is_sell());
        assert!(!Signal::Neutral.is_sell());
        assert!(!Signal::StrongBuy.is_sell());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&Signal::StrongSell).unwrap();
        assert_eq!(json, "\"strong_sell\"");
        let parsed: Signal = serde_json::from_str("\"strong_buy\"").unwrap();
        assert_eq!(parsed, Signal::StrongBuy);
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(Signal::Neutral.to_string(), "neutral");
        assert_eq!(Signal::StrongBuy.label(), "Strong Buy");
    }
}
