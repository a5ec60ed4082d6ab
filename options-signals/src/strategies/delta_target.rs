//! ATM directional entries selected by theoretical delta.
//!
//! Every contract is priced at a fixed reference volatility and kept when
//! its absolute delta lies inside the target band.

use super::{
    ensure_valid_snapshot, ensure_well_formed, SignalCandidate, SignalType, Strategy,
    StrategyError, StrategyId,
};
use crate::data::{MarketSnapshot, OptionContract};
use crate::pricing::BlackScholes;

#[derive(Debug, Clone)]
pub struct DeltaTargetStrategy {
    model: BlackScholes,
    volatility: f64,
    min_abs_delta: f64,
    max_abs_delta: f64,
}

impl Default for DeltaTargetStrategy {
    fn default() -> Self {
        Self::new(BlackScholes::default(), 0.30)
    }
}

impl DeltaTargetStrategy {
    pub fn new(model: BlackScholes, volatility: f64) -> Self {
        Self {
            model,
            volatility,
            min_abs_delta: 0.45,
            max_abs_delta: 0.55,
        }
    }
}

impl Strategy for DeltaTargetStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::AtmDeltaDirectional
    }

    fn analyze(
        &self,
        snapshot: &MarketSnapshot,
        chain: &[OptionContract],
    ) -> Result<Vec<SignalCandidate>, StrategyError> {
        ensure_valid_snapshot(snapshot)?;

        let mut candidates = Vec::new();
        for contract in chain {
            ensure_well_formed(contract)?;
            let greeks = self.model.greeks(
                contract.kind,
                snapshot.price,
                contract.strike,
                contract.time_to_expiry,
                self.volatility,
            )?;

            let abs_delta = greeks.delta.abs();
            if abs_delta < self.min_abs_delta || abs_delta > self.max_abs_delta {
                continue;
            }

            candidates.push(SignalCandidate {
                strategy: self.id(),
                signal_type: SignalType::BuyAtm,
                option_symbol: contract.symbol.clone(),
                reason: format!("ATM delta ({:.2})", greeks.delta),
                recommended_action: "Outright purchase (swing trade) or bull spread".to_string(),
                contract: contract.clone(),
                greeks: Some(greeks),
            });
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OptionKind;
    use crate::strategies::fixtures::{chain_around_100, snapshot};

    #[test]
    fn test_selects_near_the_money() {
        let result = DeltaTargetStrategy::default()
            .analyze(&snapshot(50.0), &chain_around_100())
            .unwrap();
        assert!(!result.is_empty());
        for candidate in &result {
            let delta = candidate.greeks.unwrap().delta.abs();
            assert!((0.45..=0.55).contains(&delta));
            assert!((candidate.contract.strike - 100.0).abs() <= 4.0);
        }
    }

    #[test]
    fn test_reference_contract_is_selected() {
        let chain = vec![OptionContract::new("PETRA380", OptionKind::Call, 38.0, 30.0 / 365.0)];
        let snapshot = MarketSnapshot::new("PETR4", 37.52, 50.0);
        let result = DeltaTargetStrategy::default().analyze(&snapshot, &chain).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].signal_type, SignalType::BuyAtm);
        assert_eq!(result[0].reason, "ATM delta (0.50)");
    }

    #[test]
    fn test_expired_contracts_never_match() {
        let chain = vec![OptionContract::new("X", OptionKind::Call, 100.0, 0.0)];
        let result = DeltaTargetStrategy::default().analyze(&snapshot(50.0), &chain).unwrap();
        assert!(result.is_empty());
    }
}
