use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use error_stack::Report;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analysis::stream::StreamingAnalyzer;
use crate::analysis::{AnalysisSnapshot, Analyzer};
use crate::config::StreamConfig;
use crate::error::HubError;
use crate::model::{Candle, SeriesKey};
use crate::notifier::Notifier;
use crate::signal::Signal;
use crate::source::StreamEvent;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum HubCommand {
    Seed { key: SeriesKey, candles: Vec<Candle> },
    Update { key: SeriesKey, candle: Candle },
    Reset { key: SeriesKey },
}

impl HubCommand {
    pub fn key(&self) -> &SeriesKey {
        match self {
            Self::Seed { key, .. } | Self::Update { key, .. } | Self::Reset { key } => key,
        }
    }
}

impl From<StreamEvent> for HubCommand {
    fn from(event: StreamEvent) -> Self {
        let key = event.key();
        match event {
            StreamEvent::Seed { candles, .. } => Self::Seed { key, candles },
            StreamEvent::Candle { candle, .. } => Self::Update { key, candle },
            StreamEvent::Reset { .. } => Self::Reset { key },
        }
    }
}

/// Routes per-series commands to a fixed set of shard workers.
///
/// Every key hashes to exactly one shard, and that shard owns the key's
/// [`StreamingAnalyzer`]. Commands for one key are therefore applied in send
/// order, while different keys are analyzed in parallel.
pub struct AnalysisHub {
    shards: Vec<mpsc::Sender<HubCommand>>,
    handles: Vec<JoinHandle<()>>,
}

impl AnalysisHub {
    pub fn spawn(
        analyzer: Analyzer,
        config: &StreamConfig,
        notifier: Arc<dyn Notifier>,
        cancel: CancellationToken,
    ) -> Self {
        let workers = config.workers.max(1);
        let mut shards = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for id in 0..workers {
            let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
            let shard = Shard {
                id,
                analyzer,
                only_changes: config.only_changes,
                notifier: Arc::clone(&notifier),
                series: HashMap::new(),
            };
            handles.push(tokio::spawn(shard.run(rx, cancel.clone())));
            shards.push(tx);
        }

        info!(workers, only_changes = config.only_changes, "analysis hub started");
        Self { shards, handles }
    }

    pub fn shard_for(&self, key: &SeriesKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// Queue a command on the shard that owns its key.
    ///
    /// Waits for channel capacity; fails once the hub has been cancelled.
    pub async fn send(&self, command: HubCommand) -> Result<(), Report<HubError>> {
        let shard = self.shard_for(command.key());
        self.shards[shard].send(command).await.map_err(|e| {
            Report::new(HubError::Closed).attach(format!("series: {}", e.0.key()))
        })
    }

    /// Close the command channels and wait for every queued command to be applied.
    pub async fn shutdown(self) {
        drop(self.shards);
        for handle in self.handles {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                warn!("analysis shard did not stop in time");
            }
        }
        info!("analysis hub stopped");
    }
}

struct Series {
    analyzer: StreamingAnalyzer,
    last_signal: Option<Signal>,
}

struct Shard {
    id: usize,
    analyzer: Analyzer,
    only_changes: bool,
    notifier: Arc<dyn Notifier>,
    series: HashMap<SeriesKey, Series>,
}

impl Shard {
    async fn run(mut self, mut rx: mpsc::Receiver<HubCommand>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(shard = self.id, "analysis shard cancelled");
                    break;
                }
                command = rx.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
            }
        }
        debug!(shard = self.id, series = self.series.len(), "analysis shard stopped");
    }

    fn apply(&mut self, command: HubCommand) {
        match command {
            HubCommand::Seed { key, candles } => {
                let series = self.entry(&key);
                match series.analyzer.seed(&candles) {
                    Ok(seeded) => {
                        series.last_signal = None;
                        match seeded {
                            Some(snapshot) => {
                                debug!(series = %key, candles = candles.len(), "series seeded");
                                self.publish(&key, &snapshot);
                            }
                            None => debug!(series = %key, "series seeded with empty history"),
                        }
                    }
                    Err(e) => warn!(series = %key, error = ?e, "seed rejected"),
                }
            }
            HubCommand::Update { key, candle } => {
                match self.entry(&key).analyzer.update(&candle) {
                    Ok(snapshot) => self.publish(&key, &snapshot),
                    Err(e) => warn!(
                        series = %key,
                        open_time = %candle.open_time,
                        error = ?e,
                        "candle rejected"
                    ),
                }
            }
            HubCommand::Reset { key } => {
                if self.series.remove(&key).is_some() {
                    debug!(series = %key, "series reset");
                }
            }
        }
    }

    fn entry(&mut self, key: &SeriesKey) -> &mut Series {
        let analyzer = self.analyzer;
        self.series.entry(key.clone()).or_insert_with(|| Series {
            analyzer: StreamingAnalyzer::new(analyzer),
            last_signal: None,
        })
    }

    fn publish(&mut self, key: &SeriesKey, snapshot: &AnalysisSnapshot) {
        let Some(series) = self.series.get_mut(key) else {
            return;
        };
        let signal = snapshot.overall_signal;
        let unchanged = series.last_signal.replace(signal) == Some(signal);
        if self.only_changes && unchanged {
            debug!(series = %key, signal = %signal, "unchanged signal suppressed");
            return;
        }
        self.notifier.notify(key, snapshot);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::analysis::AnalysisParams;
    use crate::config::OutputKind;
    use crate::model::{TimeFrame, candles_from_closes};

    #[derive(Default)]
    struct Collecting {
        received: Mutex<Vec<(SeriesKey, AnalysisSnapshot)>>,
    }

    impl Notifier for Collecting {
        fn notify(&self, key: &SeriesKey, snapshot: &AnalysisSnapshot) {
            self.received.lock().unwrap().push((key.clone(), *snapshot));
        }
    }

    impl Collecting {
        fn for_key(&self, key: &SeriesKey) -> Vec<AnalysisSnapshot> {
            self.received
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, s)| *s)
                .collect()
        }
    }

    fn stream_config(workers: usize, only_changes: bool) -> StreamConfig {
        StreamConfig {
            workers,
            channel_capacity: 8,
            only_changes,
            output: OutputKind::Terminal,
        }
    }

    fn start(workers: usize, only_changes: bool) -> (AnalysisHub, Arc<Collecting>, Analyzer, CancellationToken) {
        let analyzer = Analyzer::new(&AnalysisParams::default()).unwrap();
        let collecting = Arc::new(Collecting::default());
        let cancel = CancellationToken::new();
        let hub = AnalysisHub::spawn(
            analyzer,
            &stream_config(workers, only_changes),
            collecting.clone(),
            cancel.clone(),
        );
        (hub, collecting, analyzer, cancel)
    }

    fn wave(len: usize, phase: f64) -> Vec<f64> {
        (0..len)
            .map(|i| 100.0 + (i as f64 * 0.3 + phase).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[tokio::test]
    async fn updates_for_one_key_are_applied_in_order() {
        let (hub, collecting, analyzer, _cancel) = start(4, false);
        let key = SeriesKey::new("BTCUSDT", TimeFrame::Min1);
        let candles = candles_from_closes(&wave(60, 0.0));
        for candle in &candles {
            hub.send(HubCommand::Update {
                key: key.clone(),
                candle: *candle,
            })
            .await
            .unwrap();
        }
        hub.shutdown().await;

        let received = collecting.for_key(&key);
        assert_eq!(received.len(), candles.len());
        for (end, snapshot) in received.iter().enumerate() {
            assert_eq!(*snapshot, analyzer.analyze(&candles[..=end]).unwrap());
        }
    }

    #[tokio::test]
    async fn keys_are_analyzed_independently() {
        let (hub, collecting, analyzer, _cancel) = start(3, false);
        let keys: Vec<SeriesKey> = ["BTCUSDT", "ETHUSDT", "SOLUSDT", "XRPUSDT"]
            .into_iter()
            .map(|symbol| SeriesKey::new(symbol, TimeFrame::Hour1))
            .collect();
        let series: Vec<Vec<Candle>> = (0..keys.len())
            .map(|i| candles_from_closes(&wave(40, i as f64)))
            .collect();

        // interleave keys candle by candle
        for step in 0..40 {
            for (key, candles) in keys.iter().zip(&series) {
                hub.send(HubCommand::Update {
                    key: key.clone(),
                    candle: candles[step],
                })
                .await
                .unwrap();
            }
        }
        hub.shutdown().await;

        for (key, candles) in keys.iter().zip(&series) {
            let received = collecting.for_key(key);
            assert_eq!(received.len(), 40, "{key}");
            assert_eq!(received[39], analyzer.analyze(candles).unwrap(), "{key}");
        }
    }

    #[tokio::test]
    async fn same_symbol_different_timeframes_are_separate_series() {
        let (hub, collecting, analyzer, _cancel) = start(2, false);
        let minute = SeriesKey::new("BTCUSDT", TimeFrame::Min1);
        let hour = SeriesKey::new("BTCUSDT", TimeFrame::Hour1);
        let fast = candles_from_closes(&wave(30, 0.0));
        let slow = candles_from_closes(&[50.0, 51.0, 52.0]);

        hub.send(HubCommand::Seed {
            key: minute.clone(),
            candles: fast.clone(),
        })
        .await
        .unwrap();
        hub.send(HubCommand::Seed {
            key: hour.clone(),
            candles: slow.clone(),
        })
        .await
        .unwrap();
        hub.shutdown().await;

        assert_eq!(collecting.for_key(&minute), vec![analyzer.analyze(&fast).unwrap()]);
        assert_eq!(collecting.for_key(&hour), vec![analyzer.analyze(&slow).unwrap()]);
    }

    #[tokio::test]
    async fn only_changes_suppresses_repeated_signal() {
        let (hub, collecting, _analyzer, _cancel) = start(1, true);
        let key = SeriesKey::new("ADAUSDT", TimeFrame::Min5);
        for candle in candles_from_closes(&[100.0; 10]) {
            hub.send(HubCommand::Update {
                key: key.clone(),
                candle,
            })
            .await
            .unwrap();
        }
        hub.shutdown().await;

        let received = collecting.for_key(&key);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].overall_signal, Signal::Neutral);
    }

    #[tokio::test]
    async fn rejected_seed_keeps_last_signal() {
        let (hub, collecting, _analyzer, _cancel) = start(1, true);
        let key = SeriesKey::new("BTCUSDT", TimeFrame::Min1);
        let candles = candles_from_closes(&[100.0; 6]);
        let mut descending = candles[..3].to_vec();
        descending.reverse();
        for command in [
            HubCommand::Seed {
                key: key.clone(),
                candles: candles[..5].to_vec(),
            },
            HubCommand::Seed {
                key: key.clone(),
                candles: descending,
            },
            HubCommand::Update {
                key: key.clone(),
                candle: candles[5],
            },
        ] {
            hub.send(command).await.unwrap();
        }
        hub.shutdown().await;

        // the follow-up neutral snapshot is still suppressed
        assert_eq!(collecting.for_key(&key).len(), 1);
    }

    #[test]
    fn stream_events_map_to_commands() {
        let key = SeriesKey::new("ETHUSDT", TimeFrame::Hour1);
        let candle = candles_from_closes(&[1.0])[0];
        let command = HubCommand::from(StreamEvent::Candle {
            symbol: "ETHUSDT".into(),
            timeframe: TimeFrame::Hour1,
            candle,
        });
        assert!(matches!(&command, HubCommand::Update { candle: c, .. } if *c == candle));
        assert_eq!(command.key(), &key);

        let command = HubCommand::from(StreamEvent::Seed {
            symbol: "ETHUSDT".into(),
            timeframe: TimeFrame::Hour1,
            candles: vec![candle],
        });
        assert!(matches!(&command, HubCommand::Seed { candles, .. } if candles.len() == 1));
        assert_eq!(command.key(), &key);

        let command = HubCommand::from(StreamEvent::Reset {
            symbol: "ETHUSDT".into(),
            timeframe: TimeFrame::Hour1,
        });
        assert!(matches!(command, HubCommand::Reset { key: k } if k == key));
    }

    #[tokio::test]
    async fn rejected_candle_keeps_worker_alive() {
        let (hub, collecting, _analyzer, _cancel) = start(1, false);
        let key = SeriesKey::new("BTCUSDT", TimeFrame::Day1);
        let candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        for index in [1, 0, 1, 2] {
            hub.send(HubCommand::Update {
                key: key.clone(),
                candle: candles[index],
            })
            .await
            .unwrap();
        }
        hub.shutdown().await;

        let received = collecting.for_key(&key);
        assert_eq!(received.len(), 2);
        assert_eq!(received[1].price, 3.0);
    }

    #[tokio::test]
    async fn reset_drops_series_state() {
        let (hub, collecting, _analyzer, _cancel) = start(2, false);
        let key = SeriesKey::new("ETHUSDT", TimeFrame::Min15);
        let candles = candles_from_closes(&[10.0, 20.0]);
        for command in [
            HubCommand::Update {
                key: key.clone(),
                candle: candles[1],
            },
            HubCommand::Reset { key: key.clone() },
            HubCommand::Update {
                key: key.clone(),
                candle: candles[0],
            },
        ] {
            hub.send(command).await.unwrap();
        }
        hub.shutdown().await;

        let received = collecting.for_key(&key);
        assert_eq!(received.len(), 2);
        // second snapshot sees only the post-reset candle
        assert_eq!(received[1].price, 10.0);
        assert_eq!(received[1].ma.value, 10.0);
    }

    #[tokio::test]
    async fn send_fails_after_cancel() {
        let (hub, _collecting, _analyzer, cancel) = start(1, false);
        cancel.cancel();
        hub.shards[0].closed().await;
        let err = hub
            .send(HubCommand::Reset {
                key: SeriesKey::new("BTCUSDT", TimeFrame::Min1),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.current_context(), HubError::Closed));
        hub.shutdown().await;
    }

    #[tokio::test]
    async fn routing_is_stable() {
        let (hub, _collecting, _analyzer, _cancel) = start(4, false);
        let key = SeriesKey::new("BTCUSDT", TimeFrame::Hour4);
        let shard = hub.shard_for(&key);
        assert!(shard < 4);
        assert_eq!(hub.shard_for(&SeriesKey::new("BTCUSDT", TimeFrame::Hour4)), shard);
        hub.shutdown().await;
    }
}
