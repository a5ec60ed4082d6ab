//! Confidence scoring and qualitative risk flags for signals.

pub mod flags;
pub mod score;

pub use flags::{risk_flags, RiskFlag};
pub use score::score;
