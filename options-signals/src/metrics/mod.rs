//! Performance metrics module.
//!
//! - Win rate, profit factor
//! - Sharpe and Sortino ratios
//! - Maximum drawdown

pub mod calculator;

pub use calculator::{
    DrawdownAnalysis, ExitBreakdown, MetricsCalculator, PerformanceMetrics, PROFIT_FACTOR_CAP,
};
