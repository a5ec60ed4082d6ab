//! Option pricing.
//!
//! Closed-form Black-Scholes valuation plus a helper that fills missing
//! IV and delta on chain rows.

pub mod black_scholes;
pub mod enrich;

pub use black_scholes::{greeks, price, BlackScholes, PricingError};
pub use enrich::enrich_chain;
