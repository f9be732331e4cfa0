use chrono::DateTime;
use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::SourceError;
use crate::model::Candle;

fn parse_error() -> SourceError {
    SourceError::Parse {
        format: "binance-klines".into(),
    }
}

/// One row of a Binance `/api/v3/klines` response.
#[derive(Debug, Deserialize)]
pub struct KlineRow(
    i64,                        // 0: open_time (ms)
    String,                     // 1: open
    String,                     // 2: high
    String,                     // 3: low
    String,                     // 4: close
    String,                     // 5: volume
    #[allow(dead_code)] i64,    // 6: close_time
    #[allow(dead_code)] String, // 7: quote asset volume
    #[allow(dead_code)] i64,    // 8: number of trades
    #[allow(dead_code)] String, // 9: taker buy base volume
    #[allow(dead_code)] String, // 10: taker buy quote volume
    #[allow(dead_code)] String, // 11: ignore
);

impl KlineRow {
    pub fn into_candle(self) -> Result<Candle, Report<SourceError>> {
        let parse_f64 = |field: &'static str, s: &str| -> Result<f64, Report<SourceError>> {
            s.parse::<f64>()
                .change_context_lazy(parse_error)
                .attach_with(|| format!("{field}: {s:?}"))
        };

        let Some(open_time) = DateTime::from_timestamp_millis(self.0) else {
            return Err(Report::new(parse_error()).attach(format!("open_time out of range: {}", self.0)));
        };

        Ok(Candle {
            open_time,
            open: parse_f64("open", &self.1)?,
            high: parse_f64("high", &self.2)?,
            low: parse_f64("low", &self.3)?,
            close: parse_f64("close", &self.4)?,
            volume: parse_f64("volume", &self.5)?,
        })
    }
}
