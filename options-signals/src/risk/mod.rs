//! Risk module.
//!
//! Provides:
//! - Static risk classification of strategies (tier, max loss)
//! - Fixed-fraction position sizing for simulated entries

pub mod classifier;
pub mod position_sizer;

pub use classifier::{classify, RiskLevel, RiskProfile};
pub use position_sizer::{PositionSizer, PositionSizerConfig, SizingResult};
