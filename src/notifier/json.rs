use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;

use crate::analysis::AnalysisSnapshot;
use crate::model::{SeriesKey, TimeFrame};
use crate::notifier::Notifier;

#[derive(Serialize)]
struct Line<'a> {
    symbol: &'a str,
    timeframe: TimeFrame,
    #[serde(flatten)]
    snapshot: &'a AnalysisSnapshot,
}

/// Writes one JSON object per snapshot, newline-delimited.
pub struct JsonLinesNotifier<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl<W: Write + Send> Notifier for JsonLinesNotifier<W> {
    fn notify(&self, key: &SeriesKey, snapshot: &AnalysisSnapshot) {
        let line = Line {
            symbol: &key.symbol,
            timeframe: key.timeframe,
            snapshot,
        };
        let Ok(mut out) = self.out.lock() else {
            tracing::error!(series = %key, "json notifier output poisoned");
            return;
        };
        if let Err(e) = write_line(&mut *out, &line) {
            tracing::error!(series = %key, error = %e, "failed to write snapshot");
        }
    }
}

fn write_line<W: Write>(out: &mut W, line: &Line<'_>) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    out.write_all(b"\n")?;
    out.flush()
}
