//! Signal scanner.

pub mod engine;
pub mod signal;

pub use engine::{filter_by_min_score, rank, Scanner, ScannerConfig};
pub use signal::{Signal, Technicals};

#[cfg(test)]
pub(crate) fn test_signal(
    strategy: crate::strategies::StrategyId,
    signal_type: crate::strategies::SignalType,
    rsi: f64,
    row: &crate::data::OptionContract,
) -> Signal {
    let candidate = crate::strategies::SignalCandidate {
        strategy,
        signal_type,
        option_symbol: row.symbol.clone(),
        reason: String::new(),
        recommended_action: String::new(),
        contract: row.clone(),
        greeks: None,
    };
    let snapshot = crate::data::MarketSnapshot::new("TEST3", 37.52, rsi);
    Signal::from_candidate(&snapshot, &candidate)
}
