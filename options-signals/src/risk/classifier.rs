//! Static risk classification of strategies.
//!
//! Every catalog strategy maps to a tier and a maximum-loss description.
//! Unknown names fall back to a MEDIUM "Unclassified" profile.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Risk tier of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unlimited,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Unlimited => "UNLIMITED",
        }
    }

    /// Display color tag used by front ends.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Low => "green",
            Self::Medium => "yellow",
            Self::High => "red",
            Self::Unlimited => "purple",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk tier plus human-readable loss description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub level: RiskLevel,
    pub tag: String,
    pub max_loss: String,
    pub description: String,
}

impl RiskProfile {
    fn new(level: RiskLevel, max_loss: &str, description: &str) -> Self {
        Self {
            level,
            tag: level.color().to_string(),
            max_loss: max_loss.to_string(),
            description: description.to_string(),
        }
    }

    /// Profile for names outside the catalog.
    pub fn unclassified() -> Self {
        Self::new(
            RiskLevel::Medium,
            "See strategy documentation",
            "Unclassified",
        )
    }

    pub fn is_unlimited(&self) -> bool {
        self.level == RiskLevel::Unlimited
    }
}

/// Look up the risk profile for a strategy display name.
pub fn classify(strategy_name: &str) -> RiskProfile {
    use RiskLevel::*;

    let (level, max_loss, description) = match strategy_name {
        "Covered Call" => (Low, "Opportunity cost", "Upside above the strike is forfeited"),
        "Cash Secured Put" => (
            Low,
            "Reserved capital (strike x 100)",
            "Loss limited to the cash reserved to buy the shares",
        ),
        "Collar" => (Low, "Distance between strikes", "Put protection financed by a short call"),
        "Protective Put" => (
            Low,
            "Put premium plus distance to strike",
            "Insurance against a drop with capped loss",
        ),

        "Bull Call Spread" | "Bear Put Spread" => (
            Medium,
            "Strike width minus credit received",
            "Defined spread with capped risk and reward",
        ),
        "Iron Condor" => (
            Medium,
            "Spread width minus credit received",
            "Short volatility with defined risk",
        ),
        "Butterfly" => (Medium, "Debit paid", "Neutral structure with loss capped at the premium"),
        "Iron Butterfly" => (
            Medium,
            "Spread width minus credit received",
            "Short ATM volatility with wings",
        ),
        "Calendar Spread" => (Medium, "Debit paid", "Harvests faster decay of the near leg"),
        "Diagonal Spread" => (
            Medium,
            "Debit paid on the long call",
            "Long-dated call financed by short-dated calls",
        ),
        "Jade Lizard" => (
            Medium,
            "Distance between strikes on the put side",
            "No upside risk, defined downside",
        ),

        "Long Call" | "Long Put" => (
            High,
            "Premium paid (100%)",
            "Premium is lost if it expires OTM",
        ),
        "Long Straddle" => (
            High,
            "Sum of premiums (call + put)",
            "Full loss if the underlying does not move",
        ),
        "Long Strangle" => (
            High,
            "Sum of premiums (call + put)",
            "Full loss if price stays between the strikes",
        ),
        "RSI Reversal" => (High, "Premium paid", "Directional bet that can lose the premium"),

        "High IV Reversal" => (
            Unlimited,
            "UNLIMITED (naked short)",
            "Uncovered short options",
        ),
        "ATM Delta Directional" => (
            Unlimited,
            "UNLIMITED (uncovered position)",
            "Needs continuous active hedging",
        ),
        "Short Strangle" => (
            Unlimited,
            "UNLIMITED (both sides)",
            "Unlimited risk in both directions",
        ),

        _ => return RiskProfile::unclassified(),
    };

    RiskProfile::new(level, max_loss, description)
}
