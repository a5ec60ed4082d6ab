//! # Strategy catalog
//!
//! Every strategy implements [`Strategy`]: it reads one market snapshot and
//! one option chain and returns zero or more [`SignalCandidate`]s. Strategies
//! are pure and deterministic, hold no mutable state, and can be shared
//! freely across threads.
//!
//! Adding a strategy means adding a [`StrategyId`] variant, teaching
//! [`create_strategy`] how to build it, and giving it a risk profile in
//! [`crate::risk::classify`].

pub mod catalog;
pub mod delta_target;
pub mod moneyness;
pub mod rsi_reversal;
pub mod signal_type;
pub mod structure;

pub use catalog::{create_strategy, create_strategy_with, StrategyId, StrategyRegistry};
pub use delta_target::DeltaTargetStrategy;
pub use moneyness::{Band, MoneynessStrategy};
pub use rsi_reversal::RsiReversalStrategy;
pub use signal_type::SignalType;
pub use structure::{StructureRule, StructureStrategy};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{Greeks, MarketSnapshot, OptionContract};
use crate::pricing::PricingError;
use crate::risk::{classify, RiskLevel};

/// Symbol used for multi-leg ideas that have no single tradable contract.
pub const STRUCTURE_SYMBOL: &str = "STRUCTURE";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Malformed contract {symbol}: {reason}")]
    MalformedContract { symbol: String, reason: String },

    #[error("Invalid market snapshot for {ticker}: {reason}")]
    InvalidSnapshot { ticker: String, reason: String },

    #[error("Pricing failed: {0}")]
    Pricing(#[from] PricingError),

    #[error("Strategy '{0}' not found")]
    StrategyNotFound(String),
}

/// Raw output of a strategy before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalCandidate {
    pub strategy: StrategyId,
    pub signal_type: SignalType,
    /// Contract symbol, or [`STRUCTURE_SYMBOL`] for multi-leg ideas.
    pub option_symbol: String,
    pub reason: String,
    pub recommended_action: String,
    /// Chain row the candidate was built from (the representative leg for structures).
    pub contract: OptionContract,
    pub greeks: Option<Greeks>,
}

impl SignalCandidate {
    pub fn is_structure(&self) -> bool {
        self.option_symbol == STRUCTURE_SYMBOL
    }
}

/// A screening rule over one option chain.
pub trait Strategy: Send + Sync {
    fn id(&self) -> StrategyId;

    fn name(&self) -> &'static str {
        self.id().name()
    }

    fn risk_level(&self) -> RiskLevel {
        classify(self.name()).level
    }

    /// Scan the chain and return candidates in chain order.
    fn analyze(
        &self,
        snapshot: &MarketSnapshot,
        chain: &[OptionContract],
    ) -> Result<Vec<SignalCandidate>, StrategyError>;
}

/// Reject contracts whose strike or expiry cannot be reasoned about.
pub(crate) fn ensure_well_formed(contract: &OptionContract) -> Result<(), StrategyError> {
    if !contract.strike.is_finite() || contract.strike <= 0.0 {
        return Err(StrategyError::MalformedContract {
            symbol: contract.symbol.clone(),
            reason: format!("strike must be positive, got {}", contract.strike),
        });
    }
    if !contract.time_to_expiry.is_finite() || contract.time_to_expiry < 0.0 {
        return Err(StrategyError::MalformedContract {
            symbol: contract.symbol.clone(),
            reason: format!(
                "time to expiry must be non-negative, got {}",
                contract.time_to_expiry
            ),
        });
    }
    Ok(())
}

pub(crate) fn ensure_valid_snapshot(snapshot: &MarketSnapshot) -> Result<(), StrategyError> {
    if snapshot.has_valid_price() {
        Ok(())
    } else {
        Err(StrategyError::InvalidSnapshot {
            ticker: snapshot.ticker.clone(),
            reason: format!("spot price must be positive, got {}", snapshot.price),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::data::{MarketSnapshot, OptionContract, OptionKind};

    /// Chain around a 100.00 spot with calls and puts from 85 to 115.
    pub fn chain_around_100() -> Vec<OptionContract> {
        let mut chain = Vec::new();
        let strikes = [
            85.0, 89.0, 92.0, 94.0, 96.0, 97.0, 99.0, 100.0, 101.0, 103.0, 104.0, 106.0, 107.0,
            111.0, 115.0,
        ];
        for strike in strikes {
            chain.push(
                OptionContract::new(format!("C{}", strike), OptionKind::Call, strike, 30.0 / 365.0)
                    .with_quotes(1.0, 1.05, 1.02)
                    .with_volume(500),
            );
            chain.push(
                OptionContract::new(format!("P{}", strike), OptionKind::Put, strike, 30.0 / 365.0)
                    .with_quotes(1.0, 1.05, 1.02)
                    .with_volume(500),
            );
        }
        chain
    }

    pub fn snapshot(rsi: f64) -> MarketSnapshot {
        MarketSnapshot::new("TEST3", 100.0, rsi)
    }
}
