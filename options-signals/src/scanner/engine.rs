//! Per-ticker scanning.
//!
//! Runs every registered strategy in order over one snapshot and chain,
//! turns candidates into signals, and scores and flags each against its own
//! chain row. The scanner never filters; callers use [`filter_by_min_score`]
//! and [`rank`] when they want a shortlist.

use std::borrow::Cow;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::signal::Signal;
use crate::data::{MarketSnapshot, OptionContract};
use crate::pricing::{enrich_chain, BlackScholes};
use crate::scoring::{risk_flags, score};
use crate::strategies::{StrategyId, StrategyRegistry};

/// Scanner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Strategies to run; empty means the full catalog.
    pub strategies: Vec<StrategyId>,
    /// Risk-free rate for Greeks-based rules.
    pub risk_free_rate: f64,
    /// Reference volatility for Greeks-based rules.
    pub reference_vol: f64,
    /// Fill missing IV and delta on chain rows before scanning.
    pub enrich_missing_greeks: bool,
    /// Shortlist threshold applied by callers through `filter_by_min_score`.
    pub min_score: u8,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
            risk_free_rate: 0.1175,
            reference_vol: 0.30,
            enrich_missing_greeks: false,
            min_score: 0,
        }
    }
}

/// Strategy scanner for one ticker at a time.
#[derive(Debug)]
pub struct Scanner {
    config: ScannerConfig,
    model: BlackScholes,
    registry: StrategyRegistry,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        let model = BlackScholes::new(config.risk_free_rate);
        let ids: &[StrategyId] = if config.strategies.is_empty() {
            &StrategyId::ALL
        } else {
            &config.strategies
        };
        let registry = StrategyRegistry::with_model(ids, &model, config.reference_vol);

        Self {
            config,
            model,
            registry,
        }
    }

    /// Scanner over an explicit set of strategies.
    pub fn with_strategies(config: ScannerConfig, ids: &[StrategyId]) -> Self {
        Self::new(ScannerConfig {
            strategies: ids.to_vec(),
            ..config
        })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Run every registered strategy and return all signals, unfiltered.
    pub fn scan(&self, snapshot: &MarketSnapshot, chain: &[OptionContract]) -> Vec<Signal> {
        let chain: Cow<'_, [OptionContract]> = if self.config.enrich_missing_greeks {
            let mut owned = chain.to_vec();
            let touched =
                enrich_chain(&mut owned, snapshot.price, &self.model, self.config.reference_vol);
            debug!(ticker = %snapshot.ticker, touched, "Enriched chain");
            Cow::Owned(owned)
        } else {
            Cow::Borrowed(chain)
        };

        let mut signals = Vec::new();
        for strategy in self.registry.iter() {
            let candidates = match strategy.analyze(snapshot, &chain) {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(
                        ticker = %snapshot.ticker,
                        strategy = strategy.name(),
                        error = %e,
                        "Strategy failed, skipping"
                    );
                    continue;
                }
            };

            for candidate in &candidates {
                let mut signal = Signal::from_candidate(snapshot, candidate);
                signal.confidence_score = score(&signal, &candidate.contract);
                signal.risk_flags = risk_flags(&signal, &candidate.contract);
                signals.push(signal);
            }
        }

        debug!(
            ticker = %snapshot.ticker,
            contracts = chain.len(),
            signals = signals.len(),
            "Scan finished"
        );
        signals
    }

    /// Scan several tickers in parallel. Output order follows input order.
    pub fn scan_many(&self, inputs: &[(MarketSnapshot, Vec<OptionContract>)]) -> Vec<Vec<Signal>> {
        let results: Vec<Vec<Signal>> = inputs
            .par_iter()
            .map(|(snapshot, chain)| self.scan(snapshot, chain))
            .collect();

        info!(
            tickers = inputs.len(),
            signals = results.iter().map(Vec::len).sum::<usize>(),
            "Batch scan finished"
        );
        results
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

/// Signals scoring at least `min_score`, order preserved.
pub fn filter_by_min_score(signals: Vec<Signal>, min_score: u8) -> Vec<Signal> {
    signals
        .into_iter()
        .filter(|s| s.confidence_score >= min_score)
        .collect()
}

/// Sort by score descending; equal scores keep scan order.
pub fn rank(mut signals: Vec<Signal>) -> Vec<Signal> {
    signals.sort_by(|a, b| b.confidence_score.cmp(&a.confidence_score));
    signals
}
