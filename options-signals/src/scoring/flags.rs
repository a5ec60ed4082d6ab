use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::OptionContract;
use crate::risk::RiskLevel;
use crate::scanner::Signal;

const MIN_VOLUME: i64 = 50;
const MAX_SPREAD_PCT: f64 = 0.20;
const GAMMA_RISK_DAYS: f64 = 3.0;

/// Qualitative warning attached to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskFlag {
    #[serde(rename = "Unlimited Risk")]
    UnlimitedRisk,
    #[serde(rename = "Low Liquidity")]
    LowLiquidity,
    #[serde(rename = "Wide Spread")]
    WideSpread,
    #[serde(rename = "Expiring Soon (Gamma Risk)")]
    GammaRisk,
}

impl RiskFlag {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UnlimitedRisk => "Unlimited Risk",
            Self::LowLiquidity => "Low Liquidity",
            Self::WideSpread => "Wide Spread",
            Self::GammaRisk => "Expiring Soon (Gamma Risk)",
        }
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Flags in fixed order: unlimited risk, liquidity, spread, expiry.
pub fn risk_flags(signal: &Signal, row: &OptionContract) -> Vec<RiskFlag> {
    let mut flags = Vec::new();

    if signal.risk_level == RiskLevel::Unlimited {
        flags.push(RiskFlag::UnlimitedRisk);
    }
    if row.volume.unwrap_or(0) < MIN_VOLUME {
        flags.push(RiskFlag::LowLiquidity);
    }
    if row.spread_pct().is_some_and(|s| s > MAX_SPREAD_PCT) {
        flags.push(RiskFlag::WideSpread);
    }
    if row.days_to_expiry() < GAMMA_RISK_DAYS {
        flags.push(RiskFlag::GammaRisk);
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OptionKind;
    use crate::scanner::test_signal;
    use crate::strategies::{SignalType, StrategyId};

    #[test]
    fn test_clean_row_has_no_flags() {
        let row = OptionContract::new("PETRA390", OptionKind::Call, 39.0, 30.0 / 365.0)
            .with_quotes(0.98, 1.00, 0.99)
            .with_volume(50);
        let signal = test_signal(StrategyId::LongCall, SignalType::BuyCall, 50.0, &row);
        assert!(risk_flags(&signal, &row).is_empty());
    }

    #[test]
    fn test_all_flags_in_order() {
        let row = OptionContract::new("PETRA420", OptionKind::Call, 42.0, 2.0 / 365.0)
            .with_quotes(0.50, 1.00, 0.70)
            .with_volume(10);
        let signal = test_signal(StrategyId::HighIvReversal, SignalType::SellCall, 50.0, &row);
        assert_eq!(
            risk_flags(&signal, &row),
            vec![
                RiskFlag::UnlimitedRisk,
                RiskFlag::LowLiquidity,
                RiskFlag::WideSpread,
                RiskFlag::GammaRisk,
            ]
        );
    }

    #[test]
    fn test_gamma_risk_boundary() {
        let at_four = OptionContract::new("A", OptionKind::Put, 30.0, 4.0 / 365.0).with_volume(500);
        let under = OptionContract::new("B", OptionKind::Put, 30.0, 2.9 / 365.0).with_volume(500);
        let signal = test_signal(StrategyId::LongPut, SignalType::BuyPut, 50.0, &at_four);

        assert!(!risk_flags(&signal, &at_four).contains(&RiskFlag::GammaRisk));
        assert!(risk_flags(&signal, &under).contains(&RiskFlag::GammaRisk));
    }

    #[test]
    fn test_missing_volume_is_illiquid() {
        let row = OptionContract::new("A", OptionKind::Put, 30.0, 0.1);
        let signal = test_signal(StrategyId::LongPut, SignalType::BuyPut, 50.0, &row);
        assert_eq!(risk_flags(&signal, &row), vec![RiskFlag::LowLiquidity]);
    }

    #[test]
    fn test_flag_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&RiskFlag::GammaRisk).unwrap(),
            "\"Expiring Soon (Gamma Risk)\""
        );
    }
}
