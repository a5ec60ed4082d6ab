//! # Scan one ticker
//! options-signals scan --snapshot data/PETR4.json --chain data/PETR4_chain.json --min-score 60
//!
//! # Backtest all strategies on stored history
//! options-signals backtest PETR4 --data-dir data
//!
//! # Compare strategies side by side
//! options-signals compare PETR4 --data-dir data

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use options_signals::backtest::{compare_strategies_with_progress, rank_by_return};
use options_signals::data::{
    load_chain, load_history_file, load_snapshot, DataLoader, HistoryProvider,
};
use options_signals::scanner::{filter_by_min_score, rank};
use options_signals::{
    classify, load_config, AppConfig, BacktestEngine, BacktestOutcome, BlackScholes, DailyBar,
    OptionKind, Scanner, StrategyId,
};

#[derive(Parser)]
#[command(name = "options-signals")]
#[command(about = "Options signal screener and strategy backtester")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one snapshot and option chain for signals
    Scan {
        /// Market snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Option chain JSON file
        #[arg(long)]
        chain: PathBuf,

        /// Only run these strategies (repeatable)
        #[arg(long = "strategy", value_parser = parse_strategy)]
        strategies: Vec<StrategyId>,

        /// Minimum confidence score (overrides config)
        #[arg(long)]
        min_score: Option<u8>,

        /// Keep only the best N signals
        #[arg(long)]
        top: Option<usize>,

        /// Fill missing IV and delta before scanning
        #[arg(long)]
        enrich: bool,
    },

    /// Backtest one or all strategies on daily history
    Backtest {
        ticker: String,

        /// Directory holding history/<TICKER>.json
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// History JSON file, instead of the data directory
        #[arg(long)]
        history: Option<PathBuf>,

        /// Strategy to trade; all when omitted
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<StrategyId>,

        /// Print a text summary instead of JSON
        #[arg(long)]
        summary: bool,
    },

    /// Backtest every strategy separately and rank by return
    Compare {
        ticker: String,

        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Price one option and print its Greeks
    Price {
        #[arg(long, value_enum)]
        kind: KindArg,

        #[arg(long)]
        spot: f64,

        #[arg(long)]
        strike: f64,

        /// Calendar days to expiry
        #[arg(long)]
        days: f64,

        #[arg(long, default_value_t = 0.30)]
        vol: f64,

        /// Risk-free rate (defaults to the scanner rate)
        #[arg(long)]
        rate: Option<f64>,
    },

    /// List the strategy catalog with risk levels
    Strategies,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Call,
    Put,
}

impl From<KindArg> for OptionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Call => OptionKind::Call,
            KindArg::Put => OptionKind::Put,
        }
    }
}

fn parse_strategy(s: &str) -> Result<StrategyId, String> {
    StrategyId::from_name(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("options_signals=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Scan {
            snapshot,
            chain,
            strategies,
            min_score,
            top,
            enrich,
        } => run_scan(&config, &snapshot, &chain, strategies, min_score, top, enrich),
        Commands::Backtest {
            ticker,
            data_dir,
            history,
            strategy,
            summary,
        } => run_backtest(&config, &ticker, &data_dir, history.as_deref(), strategy, summary),
        Commands::Compare {
            ticker,
            data_dir,
            history,
        } => run_compare(&config, &ticker, &data_dir, history.as_deref()),
        Commands::Price {
            kind,
            spot,
            strike,
            days,
            vol,
            rate,
        } => run_price(&config, kind.into(), spot, strike, days, vol, rate),
        Commands::Strategies => {
            for id in StrategyId::ALL {
                let profile = classify(id.name());
                println!("{:<24} {:<10} {}", id.name(), profile.level.as_str(), profile.max_loss);
            }
            Ok(())
        }
    }
}

fn run_scan(
    config: &AppConfig,
    snapshot_path: &Path,
    chain_path: &Path,
    strategies: Vec<StrategyId>,
    min_score: Option<u8>,
    top: Option<usize>,
    enrich: bool,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)
        .with_context(|| format!("Failed to read snapshot {}", snapshot_path.display()))?;
    let chain = load_chain(chain_path)
        .with_context(|| format!("Failed to read chain {}", chain_path.display()))?;

    let mut scanner_config = config.scanner.clone();
    if !strategies.is_empty() {
        scanner_config.strategies = strategies;
    }
    scanner_config.enrich_missing_greeks |= enrich;
    let threshold = min_score.unwrap_or(scanner_config.min_score);

    let scanner = Scanner::new(scanner_config);
    let signals = rank(filter_by_min_score(scanner.scan(&snapshot, &chain), threshold));
    let signals = match top {
        Some(n) => signals.into_iter().take(n).collect(),
        None => signals,
    };

    info!(
        ticker = %snapshot.ticker,
        signals = signals.len(),
        min_score = threshold,
        "Scan complete"
    );
    println!("{}", serde_json::to_string_pretty(&signals)?);
    Ok(())
}

fn load_bars(ticker: &str, data_dir: &Path, history: Option<&Path>) -> Result<Vec<DailyBar>> {
    match history {
        Some(path) => load_history_file(path)
            .with_context(|| format!("Failed to read history {}", path.display())),
        None => DataLoader::new(data_dir)
            .daily_bars(ticker)
            .with_context(|| format!("No history for {} in {}", ticker, data_dir.display())),
    }
}

fn run_backtest(
    config: &AppConfig,
    ticker: &str,
    data_dir: &Path,
    history: Option<&Path>,
    strategy: Option<StrategyId>,
    summary: bool,
) -> Result<()> {
    let selection: Vec<StrategyId> = strategy.into_iter().collect();
    let mut engine = BacktestEngine::new(config.backtest.clone());

    let outcome = match history {
        Some(path) => {
            let bars = load_bars(ticker, data_dir, Some(path))?;
            engine.run_with_bars(ticker, &bars, &selection)
        }
        None => engine.run(ticker, &DataLoader::new(data_dir), &selection),
    };

    match (&outcome, summary) {
        (BacktestOutcome::Completed(result), true) => println!("{}", result.summary()),
        (BacktestOutcome::InsufficientData { reason, .. }, true) => {
            bail!("Insufficient data for {}: {}", ticker, reason)
        }
        _ => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }
    Ok(())
}

fn run_compare(
    config: &AppConfig,
    ticker: &str,
    data_dir: &Path,
    history: Option<&Path>,
) -> Result<()> {
    let bars = load_bars(ticker, data_dir, history)?;
    let ids = StrategyId::ALL;

    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    pb.set_message(ticker.to_string());

    let results = compare_strategies_with_progress(&config.backtest, ticker, &bars, &ids, |_| {
        pb.inc(1)
    });
    pb.finish_and_clear();

    println!(
        "{:<24} {:>7} {:>9} {:>10} {:>9}",
        "Strategy", "Trades", "Win %", "Return %", "PF"
    );
    for comparison in rank_by_return(&results) {
        if let Some(result) = comparison.outcome.result() {
            println!(
                "{:<24} {:>7} {:>9.1} {:>10.2} {:>9.2}",
                comparison.strategy.name(),
                result.total_trades(),
                result.win_rate(),
                result.total_return_pct(),
                result.profit_factor(),
            );
        }
    }
    for comparison in results.iter().filter(|c| !c.outcome.is_completed()) {
        if let BacktestOutcome::InsufficientData { reason, .. } = &comparison.outcome {
            println!("{:<24} skipped: {}", comparison.strategy.name(), reason);
        }
    }
    Ok(())
}

fn run_price(
    config: &AppConfig,
    kind: OptionKind,
    spot: f64,
    strike: f64,
    days: f64,
    vol: f64,
    rate: Option<f64>,
) -> Result<()> {
    let model = BlackScholes::new(rate.unwrap_or(config.scanner.risk_free_rate));
    let time = days / 365.0;
    let price = model.price(kind, spot, strike, time, vol)?;
    let greeks = model.greeks(kind, spot, strike, time, vol)?;

    let output = serde_json::json!({
        "kind": kind.as_str(),
        "spot": spot,
        "strike": strike,
        "days": days,
        "volatility": vol,
        "rate": model.rate,
        "price": price,
        "greeks": greeks,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
