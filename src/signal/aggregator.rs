use crate::signal::Signal;

/// Votes needed before a side can win at all.
const MIN_VOTES: u8 = 2;
/// Votes needed for the strong tier.
const STRONG_VOTES: u8 = 3;

/// Buy/sell vote counts collected from the per-indicator signals.
///
/// Every indicator casts at most one vote, whatever its tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Votes {
    pub buy: u8,
    pub sell: u8,
}

impl Votes {
    pub fn tally(signals: impl IntoIterator<Item = Signal>) -> Self {
        signals.into_iter().fold(Self::default(), |mut votes, signal| {
            if signal.is_buy() {
                votes.buy += 1;
            } else if signal.is_sell() {
                votes.sell += 1;
            }
            votes
        })
    }

    /// Majority vote with a minimum of two votes; three or more is the strong tier.
    pub fn overall(self) -> Signal {
        if self.buy > self.sell && self.buy >= MIN_VOTES {
            if self.buy >= STRONG_VOTES {
                Signal::StrongBuy
            } else {
                Signal::Buy
            }
        } else if self.sell > self.buy && self.sell >= MIN_VOTES {
            if self.sell >= STRONG_VOTES {
                Signal::StrongSell
            } else {
                Signal::Sell
            }
        } else {
            Signal::Neutral
        }
    }
}

/// Combine the RSI, MACD, Bollinger and MA signals into the overall signal.
pub fn aggregate(rsi: Signal, macd: Signal, bollinger: Signal, ma: Signal) -> Signal {
    Votes::tally([rsi, macd, bollinger, ma]).overall()
}
