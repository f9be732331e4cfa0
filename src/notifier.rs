pub mod json;
pub mod terminal;

use crate::analysis::AnalysisSnapshot;
use crate::model::SeriesKey;

/// Sink for fresh analysis snapshots.
pub trait Notifier: Send + Sync {
    fn notify(&self, key: &SeriesKey, snapshot: &AnalysisSnapshot);
}
