use crate::analysis::AnalysisSnapshot;
use crate::model::SeriesKey;
use crate::notifier::Notifier;

/// Logs each snapshot as a structured tracing event.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, key: &SeriesKey, snapshot: &AnalysisSnapshot) {
        let signal = snapshot.overall_signal;
        if signal.is_buy() || signal.is_sell() {
            tracing::warn!(
                series = %key,
                price = snapshot.price,
                rsi = snapshot.rsi.value,
                macd_histogram = snapshot.macd.histogram,
                ma = snapshot.ma.value,
                "SIGNAL: {}",
                signal.label(),
            );
        } else {
            tracing::info!(
                series = %key,
                price = snapshot.price,
                rsi = snapshot.rsi.value,
                macd_histogram = snapshot.macd.histogram,
                ma = snapshot.ma.value,
                "signal: {}",
                signal.label(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisParams, Analyzer};
    use crate::model::TimeFrame;

    #[test]
    fn terminal_notifier_does_not_panic() {
        let analyzer = Analyzer::new(&AnalysisParams::default()).unwrap();
        let snapshot = analyzer.analyze_prices(&[100.0, 101.0, 102.0]).unwrap();
        // Should not panic
        TerminalNotifier.notify(&SeriesKey::new("BTCUSDT", TimeFrame::Hour1), &snapshot);
    }
}
