use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of trade a signal recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    #[serde(rename = "SELL CALL")]
    SellCall,
    #[serde(rename = "BUY ATM")]
    BuyAtm,
    #[serde(rename = "BUY CALL")]
    BuyCall,
    #[serde(rename = "BUY PUT")]
    BuyPut,
    #[serde(rename = "SELL COVERED CALL")]
    SellCoveredCall,
    #[serde(rename = "SELL PUT")]
    SellPut,
    #[serde(rename = "BULL CALL SPREAD")]
    BullCallSpread,
    #[serde(rename = "BEAR PUT SPREAD")]
    BearPutSpread,
    #[serde(rename = "BUY STRADDLE")]
    BuyStraddle,
    #[serde(rename = "SELL IRON CONDOR")]
    SellIronCondor,
    #[serde(rename = "BUY STRANGLE")]
    BuyStrangle,
    #[serde(rename = "BUY BUTTERFLY")]
    BuyButterfly,
    #[serde(rename = "SELL IRON BUTTERFLY")]
    SellIronButterfly,
    #[serde(rename = "CALENDAR SPREAD")]
    CalendarSpread,
    #[serde(rename = "DIAGONAL SPREAD")]
    DiagonalSpread,
    #[serde(rename = "COLLAR")]
    Collar,
    #[serde(rename = "BUY PROTECTIVE PUT")]
    BuyProtectivePut,
    #[serde(rename = "SELL JADE LIZARD")]
    SellJadeLizard,
    #[serde(rename = "SELL STRANGLE")]
    SellStrangle,
}

impl SignalType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SellCall => "SELL CALL",
            Self::BuyAtm => "BUY ATM",
            Self::BuyCall => "BUY CALL",
            Self::BuyPut => "BUY PUT",
            Self::SellCoveredCall => "SELL COVERED CALL",
            Self::SellPut => "SELL PUT",
            Self::BullCallSpread => "BULL CALL SPREAD",
            Self::BearPutSpread => "BEAR PUT SPREAD",
            Self::BuyStraddle => "BUY STRADDLE",
            Self::SellIronCondor => "SELL IRON CONDOR",
            Self::BuyStrangle => "BUY STRANGLE",
            Self::BuyButterfly => "BUY BUTTERFLY",
            Self::SellIronButterfly => "SELL IRON BUTTERFLY",
            Self::CalendarSpread => "CALENDAR SPREAD",
            Self::DiagonalSpread => "DIAGONAL SPREAD",
            Self::Collar => "COLLAR",
            Self::BuyProtectivePut => "BUY PROTECTIVE PUT",
            Self::SellJadeLizard => "SELL JADE LIZARD",
            Self::SellStrangle => "SELL STRANGLE",
        }
    }

    /// Premium-selling signal (label mentions SELL or SHORT).
    pub fn is_sell(&self) -> bool {
        let label = self.label();
        label.contains("SELL") || label.contains("SHORT")
    }

    pub fn is_buy(&self) -> bool {
        self.label().contains("BUY")
    }

    pub fn is_buy_call(&self) -> bool {
        self.label().contains("BUY CALL")
    }

    pub fn is_buy_put(&self) -> bool {
        self.label().contains("BUY PUT")
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_helpers() {
        assert!(SignalType::SellCoveredCall.is_sell());
        assert!(SignalType::SellStrangle.is_sell());
        assert!(!SignalType::Collar.is_sell());
        assert!(!SignalType::Collar.is_buy());

        assert!(SignalType::BuyCall.is_buy_call());
        assert!(SignalType::BuyPut.is_buy_put());
        // "BUY PROTECTIVE PUT" does not contain "BUY PUT"
        assert!(!SignalType::BuyProtectivePut.is_buy_put());
        assert!(SignalType::BuyProtectivePut.is_buy());
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&SignalType::BullCallSpread).unwrap();
        assert_eq!(json, "\"BULL CALL SPREAD\"");
        let parsed: SignalType = serde_json::from_str("\"SELL IRON CONDOR\"").unwrap();
        assert_eq!(parsed, SignalType::SellIronCondor);
    }
}
