//! Synthetic option chains for days without historical option quotes.
//!
//! Strikes run from round(0.8 * spot) up to (but excluding) round(1.2 * spot)
//! in fixed steps, with one call and one put per strike at a single expiry.
//! Quotes are centered on the Black-Scholes value at a reference volatility.

use serde::{Deserialize, Serialize};

use super::types::{OptionContract, OptionKind};
use crate::pricing::{BlackScholes, PricingError};

/// Shape of the generated chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainLayout {
    /// Lower strike bound as a fraction of spot.
    pub lower_pct: f64,
    /// Upper strike bound (exclusive) as a fraction of spot.
    pub upper_pct: f64,
    /// Distance between strikes.
    pub strike_step: f64,
    /// Calendar days to expiry of every contract.
    pub days_to_expiry: u32,
    /// Half of the bid-ask spread as a fraction of the theoretical price.
    pub half_spread_pct: f64,
    /// Minimum tick for quotes.
    pub min_tick: f64,
    /// Volume assigned to every contract.
    pub volume: i64,
}

impl Default for ChainLayout {
    fn default() -> Self {
        Self {
            lower_pct: 0.80,
            upper_pct: 1.20,
            strike_step: 0.5,
            days_to_expiry: 30,
            half_spread_pct: 0.02,
            min_tick: 0.01,
            volume: 500,
        }
    }
}

impl ChainLayout {
    pub fn time_to_expiry(&self) -> f64 {
        f64::from(self.days_to_expiry) / 365.0
    }
}

/// Builds option chains priced off a reference model.
#[derive(Debug, Clone)]
pub struct SyntheticChainBuilder {
    layout: ChainLayout,
    model: BlackScholes,
    volatility: f64,
}

impl SyntheticChainBuilder {
    pub fn new(layout: ChainLayout, rate: f64, volatility: f64) -> Self {
        Self {
            layout,
            model: BlackScholes::new(rate),
            volatility,
        }
    }

    pub fn layout(&self) -> &ChainLayout {
        &self.layout
    }

    /// Strike ladder for a spot price.
    pub fn strikes(&self, spot: f64) -> Vec<f64> {
        let start = (spot * self.layout.lower_pct).round();
        let end = (spot * self.layout.upper_pct).round();
        if self.layout.strike_step <= 0.0 || end <= start {
            return Vec::new();
        }

        let count = ((end - start) / self.layout.strike_step).ceil() as usize;
        (0..count)
            .map(|i| start + i as f64 * self.layout.strike_step)
            .filter(|k| *k < end && *k > 0.0)
            .collect()
    }

    /// Chain for one ticker at one spot price: call then put for every strike.
    pub fn build(&self, ticker: &str, spot: f64) -> Result<Vec<OptionContract>, PricingError> {
        let time = self.layout.time_to_expiry();
        let mut chain = Vec::new();

        for strike in self.strikes(spot) {
            for (kind, series) in [(OptionKind::Call, 'A'), (OptionKind::Put, 'M')] {
                let theo = self.model.price(kind, spot, strike, time, self.volatility)?;
                let half = (theo * self.layout.half_spread_pct).max(self.layout.min_tick / 2.0);
                let bid = round_to_tick(theo - half, self.layout.min_tick).max(0.0);
                let ask =
                    round_to_tick(theo + half, self.layout.min_tick).max(self.layout.min_tick);
                let symbol = format!("{}{}{}", ticker, series, (strike * 100.0).round() as i64);

                chain.push(
                    OptionContract::new(symbol, kind, strike, time)
                        .with_quotes(bid, ask, round_to_tick(theo, self.layout.min_tick))
                        .with_volume(self.layout.volume),
                );
            }
        }

        Ok(chain)
    }
}

fn round_to_tick(value: f64, tick: f64) -> f64 {
    if tick <= 0.0 {
        return value;
    }
    (value / tick).round() * tick
}
