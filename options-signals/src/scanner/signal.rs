use serde::{Deserialize, Serialize};

use crate::data::{Greeks, MarketSnapshot, OptionKind};
use crate::risk::{classify, RiskLevel, RiskProfile};
use crate::scoring::RiskFlag;
use crate::strategies::{SignalCandidate, SignalType, StrategyId};

/// Market context recorded with a signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Technicals {
    /// Underlying RSI at scan time.
    pub rsi: Option<f64>,
    /// Implied volatility of the originating row.
    pub iv: Option<f64>,
}

/// A scored, flagged trade idea for one underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub strategy: StrategyId,
    pub strategy_name: String,
    /// Underlying ticker.
    pub ticker: String,
    /// Contract symbol or `STRUCTURE`.
    pub option_symbol: String,
    pub signal_type: SignalType,
    pub reason: String,
    pub recommended_action: String,
    pub risk_level: RiskLevel,
    pub risk_profile: RiskProfile,
    pub greeks: Option<Greeks>,
    pub technicals: Technicals,
    pub spot_price: f64,
    pub strike: f64,
    pub kind: OptionKind,
    pub time_to_expiry: f64,
    pub confidence_score: u8,
    pub risk_flags: Vec<RiskFlag>,
}

impl Signal {
    /// Unscored signal for a strategy candidate.
    pub fn from_candidate(snapshot: &MarketSnapshot, candidate: &SignalCandidate) -> Self {
        let profile = classify(candidate.strategy.name());
        let row = &candidate.contract;

        Self {
            strategy: candidate.strategy,
            strategy_name: candidate.strategy.name().to_string(),
            ticker: snapshot.ticker.clone(),
            option_symbol: candidate.option_symbol.clone(),
            signal_type: candidate.signal_type,
            reason: candidate.reason.clone(),
            recommended_action: candidate.recommended_action.clone(),
            risk_level: profile.level,
            risk_profile: profile,
            greeks: candidate.greeks,
            technicals: Technicals {
                rsi: Some(snapshot.rsi),
                iv: row.iv,
            },
            spot_price: snapshot.price,
            strike: row.strike,
            kind: row.kind,
            time_to_expiry: row.time_to_expiry,
            confidence_score: 0,
            risk_flags: Vec::new(),
        }
    }

    pub fn is_structure(&self) -> bool {
        self.option_symbol == crate::strategies::STRUCTURE_SYMBOL
    }

    pub fn has_flag(&self, flag: RiskFlag) -> bool {
        self.risk_flags.contains(&flag)
    }
}
