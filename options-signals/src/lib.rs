pub mod backtest;
pub mod config;
pub mod data;
pub mod indicators;
pub mod metrics;
pub mod pricing;
pub mod risk;
pub mod scanner;
pub mod scoring;
pub mod strategies;

// Re-export commonly used types
pub use backtest::{BacktestConfig, BacktestEngine, BacktestOutcome, BacktestResult, Trade};
pub use config::{load_config, AppConfig};
pub use data::{DailyBar, Greeks, MarketSnapshot, OptionContract, OptionKind};
pub use metrics::{MetricsCalculator, PerformanceMetrics};
pub use pricing::{BlackScholes, PricingError};
pub use risk::{classify, RiskLevel, RiskProfile};
pub use scanner::{Scanner, ScannerConfig, Signal};
pub use scoring::RiskFlag;
pub use strategies::{SignalType, Strategy, StrategyId, StrategyRegistry};
