use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    Band, DeltaTargetStrategy, MoneynessStrategy, RsiReversalStrategy, SignalType, Strategy,
    StrategyError, StructureRule, StructureStrategy,
};
use crate::data::OptionKind;
use crate::pricing::BlackScholes;

/// Identity of every strategy in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    HighIvReversal,
    AtmDeltaDirectional,
    RsiReversal,
    CoveredCall,
    LongCall,
    LongPut,
    CashSecuredPut,
    BullCallSpread,
    BearPutSpread,
    LongStraddle,
    IronCondor,
    LongStrangle,
    Butterfly,
    IronButterfly,
    CalendarSpread,
    DiagonalSpread,
    Collar,
    ProtectivePut,
    JadeLizard,
    ShortStrangle,
}

impl StrategyId {
    /// Registration order. Scans and tie-breaks follow this order.
    pub const ALL: [StrategyId; 20] = [
        StrategyId::HighIvReversal,
        StrategyId::AtmDeltaDirectional,
        StrategyId::RsiReversal,
        StrategyId::CoveredCall,
        StrategyId::LongCall,
        StrategyId::LongPut,
        StrategyId::CashSecuredPut,
        StrategyId::BullCallSpread,
        StrategyId::BearPutSpread,
        StrategyId::LongStraddle,
        StrategyId::IronCondor,
        StrategyId::LongStrangle,
        StrategyId::Butterfly,
        StrategyId::IronButterfly,
        StrategyId::CalendarSpread,
        StrategyId::DiagonalSpread,
        StrategyId::Collar,
        StrategyId::ProtectivePut,
        StrategyId::JadeLizard,
        StrategyId::ShortStrangle,
    ];

    /// Display name, also the key for risk classification.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HighIvReversal => "High IV Reversal",
            Self::AtmDeltaDirectional => "ATM Delta Directional",
            Self::RsiReversal => "RSI Reversal",
            Self::CoveredCall => "Covered Call",
            Self::LongCall => "Long Call",
            Self::LongPut => "Long Put",
            Self::CashSecuredPut => "Cash Secured Put",
            Self::BullCallSpread => "Bull Call Spread",
            Self::BearPutSpread => "Bear Put Spread",
            Self::LongStraddle => "Long Straddle",
            Self::IronCondor => "Iron Condor",
            Self::LongStrangle => "Long Strangle",
            Self::Butterfly => "Butterfly",
            Self::IronButterfly => "Iron Butterfly",
            Self::CalendarSpread => "Calendar Spread",
            Self::DiagonalSpread => "Diagonal Spread",
            Self::Collar => "Collar",
            Self::ProtectivePut => "Protective Put",
            Self::JadeLizard => "Jade Lizard",
            Self::ShortStrangle => "Short Strangle",
        }
    }

    /// Parse a display name or snake_case key, ignoring case and separators.
    pub fn from_name(name: &str) -> Result<Self, StrategyError> {
        let wanted = normalize(name);
        Self::ALL
            .iter()
            .copied()
            .find(|id| normalize(id.name()) == wanted)
            .ok_or_else(|| StrategyError::StrategyNotFound(name.to_string()))
    }

    /// Scored on RSI extremes instead of trend alignment.
    pub fn is_rsi_driven(&self) -> bool {
        self.name().contains("RSI")
    }

    /// Position in registration order.
    pub fn order(&self) -> usize {
        Self::ALL.iter().position(|id| id == self).unwrap_or(usize::MAX)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn band(
    id: StrategyId,
    kind: OptionKind,
    band: Band,
    signal: SignalType,
    reason: &'static str,
    action: &'static str,
) -> Box<dyn Strategy> {
    Box::new(MoneynessStrategy::new(id, kind, band, signal, reason, action))
}

fn structure(
    id: StrategyId,
    rule: StructureRule,
    signal: SignalType,
    reason: &'static str,
    action: &'static str,
) -> Box<dyn Strategy> {
    Box::new(StructureStrategy::new(id, rule, signal, reason, action))
}

/// Creates a strategy instance with the default reference model.
pub fn create_strategy(id: StrategyId) -> Box<dyn Strategy> {
    create_strategy_with(id, &BlackScholes::default(), 0.30)
}

/// Creates a strategy instance; Greeks-based rules price with `model` at `volatility`.
pub fn create_strategy_with(
    id: StrategyId,
    model: &BlackScholes,
    volatility: f64,
) -> Box<dyn Strategy> {
    use OptionKind::{Call, Put};
    use StrategyId::*;

    // The compiler errors here if a new StrategyId is added but not handled.
    match id {
        HighIvReversal => band(
            id,
            Call,
            Band::StrikeAbove(1.10),
            SignalType::SellCall,
            "High implied volatility (OTM)",
            "Covered sale or bear call spread",
        ),
        AtmDeltaDirectional => Box::new(DeltaTargetStrategy::new(*model, volatility)),
        RsiReversal => Box::new(RsiReversalStrategy::new()),
        CoveredCall => band(
            id,
            Call,
            Band::Moneyness { low: 1.04, high: 1.08 },
            SignalType::SellCoveredCall,
            "OTM strike suited for premium (4-8%)",
            "Sell call against owned shares",
        ),
        LongCall => band(
            id,
            Call,
            Band::Moneyness { low: 1.02, high: 1.05 },
            SignalType::BuyCall,
            "Bullish momentum",
            "Outright call purchase",
        ),
        LongPut => band(
            id,
            Put,
            Band::Moneyness { low: 0.95, high: 0.98 },
            SignalType::BuyPut,
            "Bearish momentum",
            "Outright put purchase",
        ),
        CashSecuredPut => band(
            id,
            Put,
            Band::Moneyness { low: 0.93, high: 0.97 },
            SignalType::SellPut,
            "Strike suited for entry or income",
            "Sell put with cash reserved",
        ),
        BullCallSpread => band(
            id,
            Call,
            Band::Moneyness { low: 0.98, high: 1.02 },
            SignalType::BullCallSpread,
            "Moderate rally",
            "Buy ATM call / sell OTM call (higher strike)",
        ),
        BearPutSpread => band(
            id,
            Put,
            Band::Moneyness { low: 0.98, high: 1.02 },
            SignalType::BearPutSpread,
            "Moderate decline",
            "Buy ATM put / sell OTM put (lower strike)",
        ),
        LongStraddle => band(
            id,
            Call,
            Band::NearSpot(0.01),
            SignalType::BuyStraddle,
            "Volatility breakout",
            "Buy ATM call + buy ATM put",
        ),
        IronCondor => structure(
            id,
            StructureRule::new(1.05, 0.95, 2, 2),
            SignalType::SellIronCondor,
            "Range-bound market",
            "Sell OTM put spread + sell OTM call spread",
        ),
        LongStrangle => structure(
            id,
            StructureRule::new(1.05, 0.95, 1, 1),
            SignalType::BuyStrangle,
            "Volatility breakout (cheaper than straddle)",
            "Buy OTM call + buy OTM put",
        ),
        Butterfly => band(
            id,
            Call,
            Band::NearSpot(0.02),
            SignalType::BuyButterfly,
            "Target at the ATM strike",
            "Build a 1-2-1 call structure",
        ),
        IronButterfly => band(
            id,
            Call,
            Band::NearSpot(0.02),
            SignalType::SellIronButterfly,
            "High probability in a sideways market",
            "Sell ATM straddle + buy OTM strangle",
        ),
        CalendarSpread => band(
            id,
            Call,
            Band::NearSpot(0.02),
            SignalType::CalendarSpread,
            "Harvest faster decay of the near leg",
            "Sell near call / buy far call (same strike)",
        ),
        DiagonalSpread => band(
            id,
            Call,
            Band::MoneynessAtLeast(1.05),
            SignalType::DiagonalSpread,
            "Income financed by the long leg",
            "Buy long-dated ITM call / sell short-dated OTM call",
        ),
        Collar => band(
            id,
            Put,
            Band::StrikeBelow(0.95),
            SignalType::Collar,
            "Low or zero cost portfolio protection",
            "Buy OTM put / sell OTM call",
        ),
        ProtectivePut => band(
            id,
            Put,
            Band::Between { above: 0.90, at_most: 1.0 },
            SignalType::BuyProtectivePut,
            "Crash hedge",
            "Buy put to protect the portfolio",
        ),
        JadeLizard => structure(
            id,
            StructureRule::new(1.05, 0.95, 2, 1),
            SignalType::SellJadeLizard,
            "Premium collection without upside risk",
            "Sell OTM put + sell OTM call spread",
        ),
        ShortStrangle => structure(
            id,
            StructureRule::new(1.10, 0.90, 1, 1),
            SignalType::SellStrangle,
            "High probability if the underlying stays put",
            "Sell OTM call + sell OTM put (unlimited risk)",
        ),
    }
}

/// Ordered set of strategies owned by a scanner or backtest.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Every catalog strategy, in registration order.
    pub fn all() -> Self {
        Self::with_ids(&StrategyId::ALL)
    }

    /// Selected strategies; output follows registration order regardless of input order.
    pub fn with_ids(ids: &[StrategyId]) -> Self {
        Self::with_model(ids, &BlackScholes::default(), 0.30)
    }

    pub fn with_model(ids: &[StrategyId], model: &BlackScholes, volatility: f64) -> Self {
        let mut ids = ids.to_vec();
        ids.sort_by_key(|id| id.order());
        ids.dedup();
        Self {
            strategies: ids
                .into_iter()
                .map(|id| create_strategy_with(id, model, volatility))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Strategy> {
        self.strategies.iter().map(|s| s.as_ref())
    }

    pub fn ids(&self) -> Vec<StrategyId> {
        self.strategies.iter().map(|s| s.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
