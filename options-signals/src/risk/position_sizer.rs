//! Position sizing module.
//!
//! Fixed-fraction sizing: each new trade may commit at most a configured
//! share of the capital that is currently free, rounded down to whole units.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Position sizing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSizerConfig {
    /// Share of free capital committed per trade (0.10 = 10%).
    pub fraction: f64,
    /// Maximum units per trade.
    pub max_quantity: i64,
}

impl Default for PositionSizerConfig {
    fn default() -> Self {
        Self {
            fraction: 0.10,
            max_quantity: 1_000_000,
        }
    }
}

/// Result of position sizing calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingResult {
    /// Recommended number of units.
    pub quantity: i64,
    /// Capital that would be committed.
    pub cost: Decimal,
    /// Budget available for this trade.
    pub budget: Decimal,
    /// Constraint reason (if any).
    pub constraint_reason: Option<String>,
}

impl SizingResult {
    /// At least one unit can be bought.
    pub fn is_allowed(&self) -> bool {
        self.quantity >= 1
    }

    fn rejected(budget: Decimal, reason: &str) -> Self {
        Self {
            quantity: 0,
            cost: Decimal::ZERO,
            budget,
            constraint_reason: Some(reason.to_string()),
        }
    }
}

/// Position sizer for determining unit counts.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    config: PositionSizerConfig,
}

impl PositionSizer {
    pub fn new(config: PositionSizerConfig) -> Self {
        Self { config }
    }

    /// Units to buy at `unit_price` given the currently free capital.
    pub fn calculate(&self, free_capital: Decimal, unit_price: Decimal) -> SizingResult {
        let fraction = Decimal::from_f64(self.config.fraction).unwrap_or_default();
        let budget = (free_capital * fraction).max(Decimal::ZERO);

        if unit_price <= Decimal::ZERO {
            return SizingResult::rejected(budget, "Invalid unit price");
        }

        let raw = (budget / unit_price).floor().to_i64().unwrap_or(0);
        let quantity = raw.min(self.config.max_quantity);

        if quantity < 1 {
            return SizingResult::rejected(budget, "Budget below one unit");
        }

        SizingResult {
            quantity,
            cost: unit_price * Decimal::from(quantity),
            budget,
            constraint_reason: (quantity < raw).then(|| "Max quantity".to_string()),
        }
    }
}
