//! Side-by-side strategy comparison.
//!
//! Each strategy gets its own engine and an independent run over the same
//! bars, so runs parallelize without shared state.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::DailyBar;
use crate::strategies::StrategyId;

use super::engine::{BacktestConfig, BacktestEngine, BacktestOutcome};

/// One strategy's run in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub strategy: StrategyId,
    pub outcome: BacktestOutcome,
}

/// Backtest every strategy in `ids` on the same bars.
///
/// Output follows the order of `ids`.
pub fn compare_strategies(
    config: &BacktestConfig,
    ticker: &str,
    bars: &[DailyBar],
    ids: &[StrategyId],
) -> Vec<StrategyComparison> {
    compare_strategies_with_progress(config, ticker, bars, ids, |_| {})
}

/// Like [`compare_strategies`], calling `on_done` as each run finishes.
pub fn compare_strategies_with_progress<F>(
    config: &BacktestConfig,
    ticker: &str,
    bars: &[DailyBar],
    ids: &[StrategyId],
    on_done: F,
) -> Vec<StrategyComparison>
where
    F: Fn(StrategyId) + Sync,
{
    let results: Vec<StrategyComparison> = ids
        .par_iter()
        .map(|&strategy| {
            let mut engine = BacktestEngine::new(config.clone());
            let outcome = engine.run_with_bars(ticker, bars, &[strategy]);
            on_done(strategy);
            StrategyComparison { strategy, outcome }
        })
        .collect();

    info!(
        ticker,
        strategies = ids.len(),
        completed = results.iter().filter(|r| r.outcome.is_completed()).count(),
        "Comparison finished"
    );
    results
}

/// Completed runs sorted by total return, best first.
pub fn rank_by_return(comparisons: &[StrategyComparison]) -> Vec<&StrategyComparison> {
    let mut ranked: Vec<&StrategyComparison> = comparisons
        .iter()
        .filter(|c| c.outcome.is_completed())
        .collect();
    ranked.sort_by(|a, b| {
        let ra = a.outcome.result().map_or(0.0, |r| r.total_return_pct());
        let rb = b.outcome.result().map_or(0.0, |r| r.total_return_pct());
        rb.total_cmp(&ra)
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bars(n: usize) -> Vec<DailyBar> {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        (0..n)
            .map(|i| {
                let close = 40.0 + 3.0 * (i as f64 / 7.0).sin();
                DailyBar::new(start + chrono::Duration::days(i as i64), close)
            })
            .collect()
    }

    #[test]
    fn test_order_follows_input() {
        let ids = [StrategyId::LongPut, StrategyId::LongCall, StrategyId::RsiReversal];
        let counter = AtomicUsize::new(0);
        let results = compare_strategies_with_progress(
            &BacktestConfig::default(),
            "ITUB4",
            &bars(60),
            &ids,
            |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        let order: Vec<StrategyId> = results.iter().map(|r| r.strategy).collect();
        assert_eq!(order, ids);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        for r in &results {
            let result = r.outcome.result().unwrap();
            assert_eq!(result.strategies, vec![r.strategy]);
        }
    }

    #[test]
    fn test_short_history_reports_every_strategy() {
        let results = compare_strategies(
            &BacktestConfig::default(),
            "ITUB4",
            &bars(5),
            &[StrategyId::LongCall, StrategyId::BullCallSpread],
        );
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.outcome.is_completed()));
        assert!(rank_by_return(&results).is_empty());
    }

    #[test]
    fn test_rank_by_return() {
        let ids = StrategyId::ALL;
        let results = compare_strategies(&BacktestConfig::default(), "ITUB4", &bars(60), &ids);
        let ranked = rank_by_return(&results);
        assert_eq!(ranked.len(), ids.len());
        assert!(ranked.windows(2).all(|w| {
            w[0].outcome.result().unwrap().total_return_pct()
                >= w[1].outcome.result().unwrap().total_return_pct()
        }));
    }
}
