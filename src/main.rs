use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use coin_analyzer::analysis::Analyzer;
use coin_analyzer::config::{self, AppConfig, OutputKind};
use coin_analyzer::hub::{AnalysisHub, HubCommand};
use coin_analyzer::model::TimeFrame;
use coin_analyzer::notifier::Notifier;
use coin_analyzer::notifier::json::JsonLinesNotifier;
use coin_analyzer::notifier::terminal::TerminalNotifier;
use coin_analyzer::source::{self, CandleFormat, StreamEvent};
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("candle source error")]
    Source,
    #[display("analysis error")]
    Analysis,
    #[display("runtime error")]
    Runtime,
}

#[derive(Parser)]
#[command(name = "coin-analyzer", about = "Technical indicator signals for candle series")]
struct Cli {
    /// Path to the TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a candle file once and print the snapshot as JSON
    Analyze {
        /// Candle file, oldest candle first
        #[arg(long)]
        candles: PathBuf,
        #[arg(long, value_enum, default_value = "json")]
        format: CandleFormat,
        /// Symbol to label the output with
        #[arg(long)]
        symbol: Option<String>,
        /// Timeframe to label the output with (1m, 5m, 1h, ...)
        #[arg(long)]
        timeframe: Option<TimeFrame>,
    },
    /// Read newline-delimited candle events from stdin and publish snapshots
    Stream,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load(path).change_context(AppError::Config)?,
        None => AppConfig::default(),
    };

    init_tracing(&config);

    let analyzer = Analyzer::new(&config.indicators).change_context(AppError::Config)?;

    match cli.command {
        Command::Analyze {
            candles,
            format,
            symbol,
            timeframe,
        } => analyze_file(&analyzer, &candles, format, symbol, timeframe),
        Command::Stream => stream(analyzer, &config).await,
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn analyze_file(
    analyzer: &Analyzer,
    path: &Path,
    format: CandleFormat,
    symbol: Option<String>,
    timeframe: Option<TimeFrame>,
) -> Result<(), Report<AppError>> {
    let candles = source::load_candles(path, format).change_context(AppError::Source)?;
    info!(
        path = %path.display(),
        candles = candles.len(),
        required = analyzer.required_candles(),
        "analyzing candle file"
    );
    if candles.len() < analyzer.required_candles() {
        warn!(
            available = candles.len(),
            required = analyzer.required_candles(),
            "short history, some indicators use degraded values"
        );
    }

    let snapshot = analyzer.analyze(&candles).change_context(AppError::Analysis)?;

    let mut output = serde_json::to_value(snapshot).change_context(AppError::Runtime)?;
    if let Some(fields) = output.as_object_mut() {
        if let Some(symbol) = symbol {
            fields.insert("symbol".into(), symbol.into());
        }
        if let Some(timeframe) = timeframe {
            fields.insert("timeframe".into(), timeframe.as_str().into());
        }
    }
    let text = serde_json::to_string_pretty(&output).change_context(AppError::Runtime)?;
    println!("{text}");
    Ok(())
}

async fn stream(analyzer: Analyzer, config: &AppConfig) -> Result<(), Report<AppError>> {
    let notifier: Arc<dyn Notifier> = match config.stream.output {
        OutputKind::Terminal => Arc::new(TerminalNotifier),
        OutputKind::Json => Arc::new(JsonLinesNotifier::new(std::io::stdout())),
    };

    let cancel = CancellationToken::new();
    let hub = AnalysisHub::spawn(analyzer, &config.stream, notifier, cancel.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;
    let result = loop {
        let line = tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    break Err(Report::new(e).change_context(AppError::Runtime));
                }
                info!("ctrl+c received, shutting down");
                cancel.cancel();
                break Ok(());
            }
            line = lines.next_line() => line,
        };

        let line = match line.change_context(AppError::Runtime) {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!(events = line_no, "input closed, draining");
                break Ok(());
            }
            Err(report) => break Err(report),
        };
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event = match StreamEvent::parse(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_no, error = ?e, "skipping malformed event");
                continue;
            }
        };

        if let Err(e) = hub.send(HubCommand::from(event)).await {
            break Err(e.change_context(AppError::Runtime));
        }
    };

    hub.shutdown().await;
    info!("shutdown complete");
    result
}
