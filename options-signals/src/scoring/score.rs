//! Confidence score for a signal.
//!
//! Starts at 50 and adds or removes points for:
//! - Technical alignment (RSI)
//! - Liquidity (volume) and bid-ask spread
//! - Probability of expiring OTM for premium sellers (delta)
//! - Implied volatility regime
//! - Strategy risk tier
//!
//! The result is clamped to 0-100.

use crate::data::OptionContract;
use crate::risk::RiskLevel;
use crate::scanner::Signal;

const BASE_SCORE: i32 = 50;
const DEFAULT_RSI: f64 = 50.0;
const DEFAULT_DELTA: f64 = 0.5;

/// Score `signal` against the chain row it was built from.
pub fn score(signal: &Signal, row: &OptionContract) -> u8 {
    let mut score = BASE_SCORE;
    score += technical_points(signal);
    score += liquidity_points(row);
    score += delta_points(signal, row);
    score += volatility_points(signal);
    score += risk_points(signal.risk_level);
    score.clamp(0, 100) as u8
}

fn technical_points(signal: &Signal) -> i32 {
    let rsi = signal.technicals.rsi.unwrap_or(DEFAULT_RSI);
    let kind = signal.signal_type;

    if signal.strategy.is_rsi_driven() {
        if kind.is_buy_call() && rsi < 30.0 {
            20
        } else if kind.is_buy_put() && rsi > 70.0 {
            20
        } else if kind.is_buy_call() && rsi < 40.0 {
            10
        } else if kind.is_buy_put() && rsi > 60.0 {
            10
        } else {
            0
        }
    } else if kind.is_buy_call() {
        if rsi > 50.0 && rsi < 70.0 {
            10
        } else {
            0
        }
    } else if kind.is_buy_put() {
        if rsi < 50.0 && rsi > 30.0 {
            10
        } else {
            0
        }
    } else {
        0
    }
}

fn liquidity_points(row: &OptionContract) -> i32 {
    let mut points = 0;

    let volume = row.volume.unwrap_or(0);
    if volume > 1000 {
        points += 10;
    } else if volume > 100 {
        points += 5;
    }

    if let Some(spread) = row.spread_pct() {
        if spread < 0.05 {
            points += 10;
        } else if spread < 0.10 {
            points += 5;
        } else if spread > 0.30 {
            points -= 10;
        }
    }

    points
}

fn delta_points(signal: &Signal, row: &OptionContract) -> i32 {
    if !signal.signal_type.is_sell() {
        return 0;
    }

    let delta = row.delta.unwrap_or(DEFAULT_DELTA).abs();
    let mut points = 0;
    if delta < 0.30 {
        points += 10;
    }
    if delta < 0.15 {
        points += 10;
    }
    points
}

fn volatility_points(signal: &Signal) -> i32 {
    let iv = signal.technicals.iv.unwrap_or(0.0);
    let mut points = 0;
    if signal.signal_type.is_sell() && iv > 0.50 {
        points += 10;
    }
    if signal.signal_type.is_buy() && iv < 0.30 {
        points += 10;
    }
    points
}

fn risk_points(level: RiskLevel) -> i32 {
    match level {
        RiskLevel::Unlimited => -15,
        RiskLevel::High => -5,
        RiskLevel::Medium => 0,
        RiskLevel::Low => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OptionKind;
    use crate::scanner::test_signal;
    use crate::strategies::{SignalType, StrategyId};

    fn liquid_row() -> OptionContract {
        // Spread of 2% of ask
        OptionContract::new("PETRA390", OptionKind::Call, 39.0, 30.0 / 365.0)
            .with_quotes(0.98, 1.00, 0.99)
            .with_volume(2000)
    }

    #[test]
    fn test_long_call_reference_score() {
        let row = liquid_row();
        let signal = test_signal(StrategyId::LongCall, SignalType::BuyCall, 25.0, &row);
        // 50 + 10 volume + 10 spread + 10 low-IV buy - 5 HIGH risk
        assert_eq!(score(&signal, &row), 75);
    }

    #[test]
    fn test_trend_alignment_for_long_call() {
        let row = liquid_row();
        let signal = test_signal(StrategyId::LongCall, SignalType::BuyCall, 60.0, &row);
        assert_eq!(score(&signal, &row), 85);
    }

    #[test]
    fn test_rsi_reversal_extremes() {
        let row = liquid_row();
        let oversold = test_signal(StrategyId::RsiReversal, SignalType::BuyCall, 25.0, &row);
        let mild = test_signal(StrategyId::RsiReversal, SignalType::BuyCall, 35.0, &row);
        // 50 + 20 + 20 + 10 - 5
        assert_eq!(score(&oversold, &row), 95);
        assert_eq!(score(&mild, &row), 85);
    }

    #[test]
    fn test_premium_seller_delta_bonus() {
        let row = liquid_row().with_delta(0.10).with_iv(0.60);
        let signal = test_signal(StrategyId::CoveredCall, SignalType::SellCoveredCall, 50.0, &row);
        // 50 + 20 liquidity + 20 delta + 10 high IV + 5 LOW risk, clamped
        assert_eq!(score(&signal, &row), 100);

        let missing_delta = liquid_row();
        let signal = test_signal(
            StrategyId::CoveredCall,
            SignalType::SellCoveredCall,
            50.0,
            &missing_delta,
        );
        // delta defaults to 0.5: no bonus
        assert_eq!(score(&signal, &missing_delta), 75);
    }

    #[test]
    fn test_wide_spread_and_unlimited_penalties() {
        let row = OptionContract::new("X", OptionKind::Call, 120.0, 0.01)
            .with_quotes(0.10, 1.00, 0.50)
            .with_iv(0.40);
        let signal = test_signal(StrategyId::HighIvReversal, SignalType::SellCall, 50.0, &row);
        // 50 - 10 spread - 15 unlimited
        assert_eq!(score(&signal, &row), 25);
    }

    #[test]
    fn test_score_bounds_over_grid() {
        let row = liquid_row();
        for id in StrategyId::ALL {
            for rsi in [0.0, 25.0, 45.0, 65.0, 100.0] {
                for kind in [SignalType::BuyCall, SignalType::SellPut, SignalType::Collar] {
                    let signal = test_signal(id, kind, rsi, &row);
                    assert!(score(&signal, &row) <= 100);
                }
            }
        }
    }
}
