//! Backtesting for single-leg option signals.
//!
//! - Trade lifecycle (entry, mark, exit on expiry, stop or target)
//! - Daily simulation over synthetic chains
//! - Capital ledger and equity curve
//! - Parallel per-strategy comparison

pub mod compare;
pub mod engine;
pub mod trade;

pub use compare::{
    compare_strategies, compare_strategies_with_progress, rank_by_return, StrategyComparison,
};
pub use engine::{BacktestConfig, BacktestEngine, BacktestOutcome, BacktestResult, EquityPoint};
pub use trade::{ExitReason, Trade, TradeDirection, TradeError, TradeStatus};
