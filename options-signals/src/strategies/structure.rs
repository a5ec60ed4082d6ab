//! Multi-leg ideas detected from the shape of the chain.
//!
//! A structure strategy emits a single `STRUCTURE` candidate when the chain
//! offers the OTM legs it needs. The representative row is the first call
//! leg that qualifies, in chain order.

use serde::{Deserialize, Serialize};

use super::{
    ensure_valid_snapshot, ensure_well_formed, SignalCandidate, SignalType, Strategy,
    StrategyError, StrategyId, STRUCTURE_SYMBOL,
};
use crate::data::{MarketSnapshot, OptionContract, OptionKind};

/// Leg requirements of a structure, as fractions of spot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureRule {
    /// Calls must strike above `call_above * spot`.
    pub call_above: f64,
    /// Puts must strike below `put_below * spot`.
    pub put_below: f64,
    /// Distinct qualifying call strikes required.
    pub min_call_strikes: usize,
    /// Distinct qualifying put strikes required.
    pub min_put_strikes: usize,
}

impl StructureRule {
    pub const fn new(
        call_above: f64,
        put_below: f64,
        min_call_strikes: usize,
        min_put_strikes: usize,
    ) -> Self {
        Self {
            call_above,
            put_below,
            min_call_strikes,
            min_put_strikes,
        }
    }
}

fn count_distinct(strikes: &mut Vec<f64>) -> usize {
    strikes.sort_by(|a, b| a.total_cmp(b));
    strikes.dedup();
    strikes.len()
}

#[derive(Debug, Clone)]
pub struct StructureStrategy {
    id: StrategyId,
    rule: StructureRule,
    signal_type: SignalType,
    reason: &'static str,
    action: &'static str,
}

impl StructureStrategy {
    pub fn new(
        id: StrategyId,
        rule: StructureRule,
        signal_type: SignalType,
        reason: &'static str,
        action: &'static str,
    ) -> Self {
        Self {
            id,
            rule,
            signal_type,
            reason,
            action,
        }
    }
}

impl Strategy for StructureStrategy {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn analyze(
        &self,
        snapshot: &MarketSnapshot,
        chain: &[OptionContract],
    ) -> Result<Vec<SignalCandidate>, StrategyError> {
        ensure_valid_snapshot(snapshot)?;
        let spot = snapshot.price;

        // Scoring and pricing use one leg: the first qualifying OTM call in
        // chain order, not the chain's first row.
        let mut representative: Option<&OptionContract> = None;
        let mut call_strikes = Vec::new();
        let mut put_strikes = Vec::new();

        for contract in chain {
            ensure_well_formed(contract)?;
            match contract.kind {
                OptionKind::Call if contract.strike > spot * self.rule.call_above => {
                    representative.get_or_insert(contract);
                    call_strikes.push(contract.strike);
                }
                OptionKind::Put if contract.strike < spot * self.rule.put_below => {
                    put_strikes.push(contract.strike);
                }
                _ => {}
            }
        }

        let calls_ok = count_distinct(&mut call_strikes) >= self.rule.min_call_strikes;
        let puts_ok = count_distinct(&mut put_strikes) >= self.rule.min_put_strikes;

        match representative {
            Some(leg) if calls_ok && puts_ok => Ok(vec![SignalCandidate {
                strategy: self.id,
                signal_type: self.signal_type,
                option_symbol: STRUCTURE_SYMBOL.to_string(),
                reason: self.reason.to_string(),
                recommended_action: self.action.to_string(),
                contract: leg.clone(),
                greeks: None,
            }]),
            _ => Ok(vec![]),
        }
    }
}
