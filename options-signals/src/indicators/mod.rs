//! Technical indicators over daily closes.

pub mod rsi;

pub use rsi::{rsi_series, IndicatorError, NEUTRAL_RSI};
