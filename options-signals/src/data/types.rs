//! Core data types for option screening and backtesting.
//!
//! These types form the boundary contract with the collaborators that
//! fetch quotes and chains: they arrive already normalized and are treated
//! as read-only for the duration of one evaluation pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Option kind (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    #[serde(alias = "CALL", alias = "c", alias = "C")]
    Call,
    #[serde(alias = "PUT", alias = "p", alias = "P")]
    Put,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "CALL",
            Self::Put => "PUT",
        }
    }

    /// Intrinsic value at the given spot.
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }
}

/// Greeks for an option contract.
///
/// Theta is per calendar day, vega per 1 vol point and rho per 1 rate point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

/// Market state of the underlying at scan time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Underlying ticker (e.g. "PETR4").
    pub ticker: String,

    /// Spot price of the underlying.
    pub price: f64,

    /// Relative strength index, 0-100.
    pub rsi: f64,

    /// Traded volume of the underlying.
    #[serde(default)]
    pub volume: Option<i64>,

    /// Daily variation in percent.
    #[serde(default)]
    pub variation: Option<f64>,
}

impl MarketSnapshot {
    pub fn new(ticker: impl Into<String>, price: f64, rsi: f64) -> Self {
        Self {
            ticker: ticker.into(),
            price,
            rsi,
            volume: None,
            variation: None,
        }
    }

    /// Spot price is usable for moneyness math.
    pub fn has_valid_price(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

/// One row of an option chain snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Exchange symbol of the option.
    pub symbol: String,

    /// Call or put.
    #[serde(rename = "type", alias = "kind")]
    pub kind: OptionKind,

    /// Strike price.
    pub strike: f64,

    /// Time to expiry in years.
    #[serde(alias = "time_to_expiry_years")]
    pub time_to_expiry: f64,

    #[serde(default)]
    pub bid: f64,

    #[serde(default)]
    pub ask: f64,

    #[serde(default)]
    pub last: f64,

    /// Implied volatility (decimal, 0.30 = 30%).
    #[serde(default)]
    pub iv: Option<f64>,

    #[serde(default)]
    pub delta: Option<f64>,

    #[serde(default)]
    pub volume: Option<i64>,
}

impl OptionContract {
    pub fn new(
        symbol: impl Into<String>,
        kind: OptionKind,
        strike: f64,
        time_to_expiry: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
            strike,
            time_to_expiry,
            bid: 0.0,
            ask: 0.0,
            last: 0.0,
            iv: None,
            delta: None,
            volume: None,
        }
    }

    pub fn with_quotes(mut self, bid: f64, ask: f64, last: f64) -> Self {
        self.bid = bid;
        self.ask = ask;
        self.last = last;
        self
    }

    pub fn with_volume(mut self, volume: i64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_iv(mut self, iv: f64) -> Self {
        self.iv = Some(iv);
        self
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    pub fn is_call(&self) -> bool {
        self.kind == OptionKind::Call
    }

    pub fn is_put(&self) -> bool {
        self.kind == OptionKind::Put
    }

    /// Bid-ask spread as a fraction of the ask. `None` when there is no ask.
    pub fn spread_pct(&self) -> Option<f64> {
        if self.ask > 0.0 {
            Some((self.ask - self.bid) / self.ask)
        } else {
            None
        }
    }

    /// Mid price, falling back to last when the book is empty.
    pub fn mid(&self) -> f64 {
        if self.bid > 0.0 && self.ask > 0.0 {
            (self.bid + self.ask) / 2.0
        } else {
            self.last
        }
    }

    pub fn days_to_expiry(&self) -> f64 {
        self.time_to_expiry * 365.0
    }

    /// Row has the minimum fields a strategy needs to reason about it.
    pub fn is_well_formed(&self) -> bool {
        self.strike.is_finite()
            && self.strike > 0.0
            && self.time_to_expiry.is_finite()
            && self.time_to_expiry >= 0.0
    }
}

/// Daily bar of the underlying, as supplied by the history collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<i64>,
}

impl DailyBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            volume: None,
        }
    }
}
