//! Single-leg strategies that filter the chain by strike relative to spot.

use serde::{Deserialize, Serialize};

use super::{
    ensure_valid_snapshot, ensure_well_formed, SignalCandidate, SignalType, Strategy,
    StrategyError, StrategyId,
};
use crate::data::{MarketSnapshot, OptionContract, OptionKind};

/// Absolute tolerance added to relative "near spot" comparisons.
const NEAR_ATOL: f64 = 1e-8;

/// Strike filter relative to the spot price. Bounds are inclusive unless
/// the variant says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Band {
    /// low <= strike / spot <= high
    Moneyness { low: f64, high: f64 },
    /// strike / spot >= floor
    MoneynessAtLeast(f64),
    /// strike > factor * spot
    StrikeAbove(f64),
    /// strike < factor * spot
    StrikeBelow(f64),
    /// |strike - spot| <= atol + rtol * spot
    NearSpot(f64),
    /// above * spot < strike <= at_most * spot
    Between { above: f64, at_most: f64 },
}

impl Band {
    pub fn contains(&self, strike: f64, spot: f64) -> bool {
        match *self {
            Band::Moneyness { low, high } => {
                let m = strike / spot;
                m >= low && m <= high
            }
            Band::MoneynessAtLeast(floor) => strike / spot >= floor,
            Band::StrikeAbove(factor) => strike > spot * factor,
            Band::StrikeBelow(factor) => strike < spot * factor,
            Band::NearSpot(rtol) => (strike - spot).abs() <= NEAR_ATOL + rtol * spot.abs(),
            Band::Between { above, at_most } => strike > spot * above && strike <= spot * at_most,
        }
    }
}

/// Emits one candidate per contract of `kind` whose strike falls in `band`.
#[derive(Debug, Clone)]
pub struct MoneynessStrategy {
    id: StrategyId,
    kind: OptionKind,
    band: Band,
    signal_type: SignalType,
    reason: &'static str,
    action: &'static str,
}

impl MoneynessStrategy {
    pub fn new(
        id: StrategyId,
        kind: OptionKind,
        band: Band,
        signal_type: SignalType,
        reason: &'static str,
        action: &'static str,
    ) -> Self {
        Self {
            id,
            kind,
            band,
            signal_type,
            reason,
            action,
        }
    }
}

impl Strategy for MoneynessStrategy {
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

        let mut candidates = Vec::new();
        for contract in chain.iter().filter(|c| c.kind == self.kind) {
            ensure_well_formed(contract)?;
            if !self.band.contains(contract.strike, spot) {
                continue;
            }
            candidates.push(SignalCandidate {
                strategy: self.id,
                signal_type: self.signal_type,
                option_symbol: contract.symbol.clone(),
                reason: self.reason.to_string(),
                recommended_action: self.action.to_string(),
                contract: contract.clone(),
                greeks: None,
            });
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::create_strategy;
    use crate::strategies::fixtures::{chain_around_100, snapshot};

    fn symbols(id: StrategyId) -> Vec<String> {
        create_strategy(id)
            .analyze(&snapshot(50.0), &chain_around_100())
            .unwrap()
            .into_iter()
            .map(|c| c.option_symbol)
            .collect()
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let band = Band::Moneyness { low: 1.02, high: 1.05 };
        assert!(band.contains(102.0, 100.0));
        assert!(band.contains(105.0, 100.0));
        assert!(!band.contains(105.5, 100.0));

        let near = Band::NearSpot(0.01);
        assert!(near.contains(101.0, 100.0));
        assert!(!near.contains(101.5, 100.0));

        let protective = Band::Between { above: 0.90, at_most: 1.0 };
        assert!(protective.contains(100.0, 100.0));
        assert!(!protective.contains(90.0, 100.0));
    }

    #[test]
    fn test_catalog_filters() {
        assert_eq!(symbols(StrategyId::HighIvReversal), vec!["C111", "C115"]);
        assert_eq!(symbols(StrategyId::CoveredCall), vec!["C104", "C106", "C107"]);
        assert_eq!(symbols(StrategyId::LongCall), vec!["C103", "C104"]);
        assert_eq!(symbols(StrategyId::LongPut), vec!["P96", "P97"]);
        assert_eq!(symbols(StrategyId::CashSecuredPut), vec!["P94", "P96", "P97"]);
        assert_eq!(symbols(StrategyId::BullCallSpread), vec!["C99", "C100", "C101"]);
        assert_eq!(symbols(StrategyId::BearPutSpread), vec!["P99", "P100", "P101"]);
        assert_eq!(symbols(StrategyId::LongStraddle), vec!["C99", "C100", "C101"]);
        assert_eq!(symbols(StrategyId::Butterfly), vec!["C99", "C100", "C101"]);
        assert_eq!(symbols(StrategyId::DiagonalSpread), vec!["C106", "C107", "C111", "C115"]);
        assert_eq!(symbols(StrategyId::Collar), vec!["P85", "P89", "P92", "P94"]);
        assert_eq!(
            symbols(StrategyId::ProtectivePut),
            vec!["P92", "P94", "P96", "P97", "P99", "P100"]
        );
    }

    #[test]
    fn test_candidate_carries_row() {
        let candidates = create_strategy(StrategyId::CoveredCall)
            .analyze(&snapshot(50.0), &chain_around_100())
            .unwrap();
        let first = &candidates[0];
        assert_eq!(first.signal_type, SignalType::SellCoveredCall);
        assert_eq!(first.contract.strike, 104.0);
        assert!(!first.is_structure());
    }

    #[test]
    fn test_malformed_contract_errors() {
        let mut chain = chain_around_100();
        chain[0].strike = f64::NAN;
        let result = create_strategy(StrategyId::LongCall).analyze(&snapshot(50.0), &chain);
        assert!(matches!(result, Err(StrategyError::MalformedContract { .. })));
    }

    #[test]
    fn test_empty_chain() {
        let result = create_strategy(StrategyId::Collar)
            .analyze(&snapshot(50.0), &[])
            .unwrap();
        assert!(result.is_empty());
    }
}
