//! Core backtesting engine.
//!
//! Runs the daily simulation loop over one ticker's closing prices:
//! 1. Mark open trades at the reference model and close the ones that hit
//!    expiry, the stop loss or the profit target
//! 2. Build that day's synthetic chain and scan it with the selected strategies
//! 3. Open the best-scoring signal, sized from free capital
//! 4. Record the capital ledger
//!
//! Capital is tracked as a ledger, not marked to market: equity is free
//! capital plus the capital invested in open trades, so
//! `free + invested - realized == initial` on every recorded day.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::{ChainLayout, DailyBar, HistoryProvider, MarketSnapshot, SyntheticChainBuilder};
use crate::indicators::rsi_series;
use crate::metrics::{MetricsCalculator, PerformanceMetrics};
use crate::pricing::BlackScholes;
use crate::risk::{PositionSizer, PositionSizerConfig};
use crate::scanner::{Scanner, ScannerConfig, Signal};
use crate::strategies::StrategyId;

use super::trade::Trade;

/// Configuration for backtest execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting capital.
    pub initial_capital: Decimal,

    /// Share of free capital committed per trade (0.10 = 10%).
    pub position_fraction: f64,

    /// Stop loss as a percentage of the entry price (30.0 = -30%).
    pub stop_loss_pct: f64,

    /// Profit target as a percentage of the entry price (50.0 = +50%).
    pub take_profit_pct: f64,

    /// Volatility used for the synthetic chain and every mark.
    pub reference_vol: f64,

    pub risk_free_rate: f64,

    /// Bars skipped before the first trading day.
    pub warmup_days: usize,

    pub rsi_period: usize,

    /// Maximum concurrent open trades.
    pub max_open_trades: usize,

    /// Signals scoring below this are never traded.
    pub min_entry_score: u8,

    /// Closed trades kept in the result sample.
    pub trade_sample: usize,

    /// Equity points kept in the result sample.
    pub equity_sample: usize,

    /// Decimal places for entry and exit prices.
    pub price_decimals: u32,

    /// Daily synthetic chain layout.
    pub chain: ChainLayout,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::from(10_000),
            position_fraction: 0.10,
            stop_loss_pct: 30.0,
            take_profit_pct: 50.0,
            reference_vol: 0.30,
            risk_free_rate: 0.1175,
            warmup_days: 14,
            rsi_period: 14,
            max_open_trades: 5,
            min_entry_score: 0,
            trade_sample: 5,
            equity_sample: 60,
            price_decimals: 4,
            chain: ChainLayout::default(),
        }
    }
}

/// Daily capital ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    /// Free capital plus capital invested in open trades.
    pub equity: Decimal,
    pub free_capital: Decimal,
    pub invested: Decimal,
    /// Cumulative realized P&L of closed trades.
    pub realized_pnl: Decimal,
    pub open_trades: usize,
}

impl EquityPoint {
    /// `free + invested - realized - initial`; zero when the ledger balances.
    pub fn ledger_residual(&self, initial_capital: Decimal) -> Decimal {
        self.free_capital + self.invested - self.realized_pnl - initial_capital
    }
}

/// Result of a completed backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub ticker: String,
    /// Strategies that were allowed to trade.
    pub strategies: Vec<StrategyId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: Decimal,
    pub final_equity: Decimal,

    #[serde(flatten)]
    pub metrics: PerformanceMetrics,

    /// Trades still open when the data ran out.
    pub open_trades: Vec<Trade>,
    /// Most recently closed trades.
    pub recent_trades: Vec<Trade>,
    /// Most recent equity points.
    pub recent_equity: Vec<EquityPoint>,

    /// Every closed trade, in close order.
    #[serde(skip)]
    pub trades: Vec<Trade>,
    /// Full daily ledger.
    #[serde(skip)]
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestResult {
    pub fn total_trades(&self) -> usize {
        self.metrics.total_trades
    }

    /// Percentage of closed trades with positive P&L.
    pub fn win_rate(&self) -> f64 {
        self.metrics.win_rate
    }

    pub fn profit_factor(&self) -> f64 {
        self.metrics.profit_factor
    }

    pub fn total_return_pct(&self) -> f64 {
        self.metrics.total_return_pct
    }

    pub fn summary(&self) -> String {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        format!(
            "Backtest {} ({} to {})\n\
             Strategies: {}\n\
             ----------------------------------------\n\
             Initial Capital: {:.2}\n\
             Final Equity: {:.2}\n\
             Open Trades: {}\n\
             {}",
            self.ticker,
            self.start_date,
            self.end_date,
            names.join(", "),
            self.initial_capital,
            self.final_equity,
            self.open_trades.len(),
            self.metrics.summary(),
        )
    }
}

/// Backtest output: either a full result or the reason no run happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BacktestOutcome {
    Completed(BacktestResult),
    InsufficientData { ticker: String, reason: String },
}

impl BacktestOutcome {
    pub fn result(&self) -> Option<&BacktestResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::InsufficientData { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    fn insufficient(ticker: &str, reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }
}

/// The main backtesting engine.
pub struct BacktestEngine {
    config: BacktestConfig,
    model: BlackScholes,
    chain_builder: SyntheticChainBuilder,
    sizer: PositionSizer,
    free_capital: Decimal,
    realized_pnl: Decimal,
    open_trades: Vec<Trade>,
    closed_trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
    next_trade_id: u64,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        let model = BlackScholes::new(config.risk_free_rate);
        let chain_builder = SyntheticChainBuilder::new(
            config.chain.clone(),
            config.risk_free_rate,
            config.reference_vol,
        );
        let sizer = PositionSizer::new(PositionSizerConfig {
            fraction: config.position_fraction,
            ..PositionSizerConfig::default()
        });
        let free_capital = config.initial_capital;

        Self {
            config,
            model,
            chain_builder,
            sizer,
            free_capital,
            realized_pnl: Decimal::ZERO,
            open_trades: Vec::new(),
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
            next_trade_id: 1,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a backtest on history fetched from `provider`.
    ///
    /// An empty `strategies` slice selects the full catalog.
    pub fn run(
        &mut self,
        ticker: &str,
        provider: &dyn HistoryProvider,
        strategies: &[StrategyId],
    ) -> BacktestOutcome {
        match provider.daily_bars(ticker) {
            Ok(bars) => self.run_with_bars(ticker, &bars, strategies),
            Err(e) => {
                warn!(ticker, error = %e, "History unavailable");
                BacktestOutcome::insufficient(ticker, e.to_string())
            }
        }
    }

    /// Run a backtest on pre-loaded daily bars, oldest first.
    pub fn run_with_bars(
        &mut self,
        ticker: &str,
        bars: &[DailyBar],
        strategies: &[StrategyId],
    ) -> BacktestOutcome {
        let required = self.config.warmup_days + 1;
        if bars.len() < required {
            return BacktestOutcome::insufficient(
                ticker,
                format!("{} bars, need at least {}", bars.len(), required),
            );
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let rsi = match rsi_series(&closes, self.config.rsi_period) {
            Ok(rsi) => rsi,
            Err(e) => return BacktestOutcome::insufficient(ticker, e.to_string()),
        };

        let ids: Vec<StrategyId> = if strategies.is_empty() {
            StrategyId::ALL.to_vec()
        } else {
            strategies.to_vec()
        };
        let scanner = Scanner::with_strategies(
            ScannerConfig {
                risk_free_rate: self.config.risk_free_rate,
                reference_vol: self.config.reference_vol,
                ..ScannerConfig::default()
            },
            &ids,
        );

        self.reset();
        info!(
            ticker,
            bars = bars.len(),
            strategies = scanner.registry().len(),
            "Starting backtest"
        );

        for (bar, &rsi) in bars.iter().zip(&rsi).skip(self.config.warmup_days) {
            self.process_day(ticker, bar, rsi, &scanner);
        }

        let start_date = bars[self.config.warmup_days].date;
        let end_date = bars[bars.len() - 1].date;
        let result = self.build_result(ticker, scanner.registry().ids(), start_date, end_date);
        info!(
            ticker,
            trades = result.total_trades(),
            open = result.open_trades.len(),
            return_pct = result.total_return_pct(),
            "Backtest finished"
        );
        BacktestOutcome::Completed(result)
    }

    fn reset(&mut self) {
        self.free_capital = self.config.initial_capital;
        self.realized_pnl = Decimal::ZERO;
        self.open_trades.clear();
        self.closed_trades.clear();
        self.equity_curve.clear();
        self.next_trade_id = 1;
    }

    /// Process a single trading day.
    fn process_day(&mut self, ticker: &str, bar: &DailyBar, rsi: f64, scanner: &Scanner) {
        self.check_exits(bar);

        if self.open_trades.len() < self.config.max_open_trades {
            let snapshot = MarketSnapshot::new(ticker, bar.close, rsi);
            self.screen_and_enter(&snapshot, bar.date, scanner);
        }

        self.record_equity(bar.date);
    }

    /// Mark every open trade and close the ones that hit an exit.
    fn check_exits(&mut self, bar: &DailyBar) {
        let mut still_open = Vec::with_capacity(self.open_trades.len());

        for mut trade in std::mem::take(&mut self.open_trades) {
            let Some(mark) = self.mark(&trade, bar) else {
                still_open.push(trade);
                continue;
            };

            let Some(reason) = trade.exit_signal(
                bar.date,
                mark,
                self.config.stop_loss_pct,
                self.config.take_profit_pct,
            ) else {
                still_open.push(trade);
                continue;
            };

            match trade.close(bar.date, mark, reason) {
                Ok(pnl) => {
                    self.free_capital += trade.released_capital();
                    self.realized_pnl += pnl;
                    debug!(
                        id = trade.id,
                        symbol = %trade.option_symbol,
                        ?reason,
                        %pnl,
                        "Closed trade"
                    );
                    self.closed_trades.push(trade);
                }
                Err(e) => {
                    warn!(error = %e, "Close rejected");
                    still_open.push(trade);
                }
            }
        }

        self.open_trades = still_open;
    }

    /// Price of one unit on `bar`: intrinsic at or past expiry, model otherwise.
    fn mark(&self, trade: &Trade, bar: &DailyBar) -> Option<Decimal> {
        let value = if trade.days_to_expiry(bar.date) <= 0 {
            trade.kind.intrinsic(bar.close, trade.strike)
        } else {
            match self.model.price(
                trade.kind,
                bar.close,
                trade.strike,
                trade.time_to_expiry(bar.date),
                self.config.reference_vol,
            ) {
                Ok(price) => price,
                Err(e) => {
                    warn!(id = trade.id, error = %e, "Mark failed, holding");
                    return None;
                }
            }
        };
        self.to_price(value)
    }

    fn to_price(&self, value: f64) -> Option<Decimal> {
        Decimal::from_f64(value).map(|d| d.round_dp(self.config.price_decimals))
    }

    /// Scan the synthetic chain and open the best signal, if any.
    fn screen_and_enter(&mut self, snapshot: &MarketSnapshot, date: NaiveDate, scanner: &Scanner) {
        let chain = match self.chain_builder.build(&snapshot.ticker, snapshot.price) {
            Ok(chain) => chain,
            Err(e) => {
                warn!(ticker = %snapshot.ticker, %date, error = %e, "Synthetic chain failed");
                return;
            }
        };

        let signals = scanner.scan(snapshot, &chain);
        let Some(signal) = best_signal(&signals) else {
            return;
        };
        if signal.confidence_score < self.config.min_entry_score {
            return;
        }

        // Structures trade their representative leg
        let entry_price = match self
            .model
            .price(
                signal.kind,
                snapshot.price,
                signal.strike,
                signal.time_to_expiry,
                self.config.reference_vol,
            )
            .ok()
            .and_then(|p| self.to_price(p))
        {
            Some(price) if price > Decimal::ZERO => price,
            _ => {
                debug!(symbol = %signal.option_symbol, %date, "No tradable entry price");
                return;
            }
        };

        let sizing = self.sizer.calculate(self.free_capital, entry_price);
        if !sizing.is_allowed() {
            debug!(
                symbol = %signal.option_symbol,
                reason = sizing.constraint_reason.as_deref().unwrap_or(""),
                "Entry skipped"
            );
            return;
        }

        let trade = Trade::open(self.next_trade_id, signal, date, entry_price, sizing.quantity);
        self.next_trade_id += 1;
        self.free_capital -= trade.invested;

        debug!(
            id = trade.id,
            strategy = trade.strategy.name(),
            symbol = %trade.option_symbol,
            qty = trade.quantity,
            %entry_price,
            score = trade.entry_score,
            "Opened trade"
        );
        self.open_trades.push(trade);
    }

    fn record_equity(&mut self, date: NaiveDate) {
        let invested: Decimal = self.open_trades.iter().map(|t| t.invested).sum();
        self.equity_curve.push(EquityPoint {
            date,
            equity: self.free_capital + invested,
            free_capital: self.free_capital,
            invested,
            realized_pnl: self.realized_pnl,
            open_trades: self.open_trades.len(),
        });
    }

    /// Build the final backtest result.
    fn build_result(
        &self,
        ticker: &str,
        strategies: Vec<StrategyId>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> BacktestResult {
        let metrics = MetricsCalculator::calculate(
            &self.closed_trades,
            &self.equity_curve,
            self.config.initial_capital,
        );
        let final_equity = self
            .equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.config.initial_capital);

        BacktestResult {
            ticker: ticker.to_string(),
            strategies,
            start_date,
            end_date,
            initial_capital: self.config.initial_capital,
            final_equity,
            metrics,
            open_trades: self.open_trades.clone(),
            recent_trades: tail(&self.closed_trades, self.config.trade_sample),
            recent_equity: tail(&self.equity_curve, self.config.equity_sample),
            trades: self.closed_trades.clone(),
            equity_curve: self.equity_curve.clone(),
        }
    }

    /// Currently open trades.
    pub fn open_trades(&self) -> &[Trade] {
        &self.open_trades
    }

    pub fn free_capital(&self) -> Decimal {
        self.free_capital
    }
}

/// Highest score wins; ties go to the earliest signal in scan order.
fn best_signal(signals: &[Signal]) -> Option<&Signal> {
    let mut best: Option<&Signal> = None;
    for signal in signals {
        if best.map_or(true, |b| signal.confidence_score > b.confidence_score) {
            best = Some(signal);
        }
    }
    best
}

fn tail<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items[items.len().saturating_sub(n)..].to_vec()
}
