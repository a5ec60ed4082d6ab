//! Mean-reversion on RSI extremes.
//!
//! Oversold (RSI < 30) buys the call nearest 105% of spot; overbought
//! (RSI > 70) buys the put nearest 95% of spot.

use super::{
    ensure_valid_snapshot, ensure_well_formed, SignalCandidate, SignalType, Strategy,
    StrategyError, StrategyId,
};
use crate::data::{MarketSnapshot, OptionContract, OptionKind};

#[derive(Debug, Clone)]
pub struct RsiReversalStrategy {
    pub oversold: f64,
    pub overbought: f64,
    pub call_target: f64,
    pub put_target: f64,
}

impl Default for RsiReversalStrategy {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
            call_target: 1.05,
            put_target: 0.95,
        }
    }
}

impl RsiReversalStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

/// First contract of `kind` with the smallest distance to `target`.
fn nearest_strike<'a>(
    chain: &'a [OptionContract],
    kind: OptionKind,
    target: f64,
) -> Result<Option<&'a OptionContract>, StrategyError> {
    let mut best: Option<(&OptionContract, f64)> = None;
    for contract in chain.iter().filter(|c| c.kind == kind) {
        ensure_well_formed(contract)?;
        let distance = (contract.strike - target).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((contract, distance)),
        }
    }
    Ok(best.map(|(c, _)| c))
}

impl Strategy for RsiReversalStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::RsiReversal
    }

    fn analyze(
        &self,
        snapshot: &MarketSnapshot,
        chain: &[OptionContract],
    ) -> Result<Vec<SignalCandidate>, StrategyError> {
        ensure_valid_snapshot(snapshot)?;
        let rsi = snapshot.rsi;
        let spot = snapshot.price;

        let (kind, target, signal_type, reason, action) = if rsi < self.oversold {
            (
                OptionKind::Call,
                spot * self.call_target,
                SignalType::BuyCall,
                format!("RSI oversold ({:.1})", rsi),
                "Buy slightly OTM call",
            )
        } else if rsi > self.overbought {
            (
                OptionKind::Put,
                spot * self.put_target,
                SignalType::BuyPut,
                format!("RSI overbought ({:.1})", rsi),
                "Buy slightly OTM put",
            )
        } else {
            return Ok(vec![]);
        };

        let Some(contract) = nearest_strike(chain, kind, target)? else {
            return Ok(vec![]);
        };

        Ok(vec![SignalCandidate {
            strategy: self.id(),
            signal_type,
            option_symbol: contract.symbol.clone(),
            reason,
            recommended_action: action.to_string(),
            contract: contract.clone(),
            greeks: None,
        }])
    }
}
