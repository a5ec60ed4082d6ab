//! Trade management for backtesting.
//!
//! Handles the single-leg trade lifecycle:
//! - Entry at the reference model price
//! - Mark-to-market against the same model
//! - Exit on expiry, stop loss or profit target
//! - Realized P&L

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::OptionKind;
use crate::scanner::Signal;
use crate::strategies::StrategyId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("Trade {0} is already closed")]
    AlreadyClosed(u64),
}

/// Direction of the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    /// Sold premium: profits when the option loses value.
    Short,
    /// Bought premium: profits when the option gains value.
    Long,
}

impl TradeDirection {
    fn sign(&self) -> Decimal {
        match self {
            Self::Long => Decimal::ONE,
            Self::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Lifecycle state of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Open,
    Expired,
    StoppedOut,
    TookProfit,
}

/// Reason for exiting a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Reached expiry, settled at intrinsic value.
    Expiration,
    /// Loss reached the stop threshold.
    StopLoss,
    /// Gain reached the profit target.
    ProfitTarget,
}

impl ExitReason {
    pub fn status(&self) -> TradeStatus {
        match self {
            Self::Expiration => TradeStatus::Expired,
            Self::StopLoss => TradeStatus::StoppedOut,
            Self::ProfitTarget => TradeStatus::TookProfit,
        }
    }
}

/// One simulated single-leg option trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: u64,
    pub ticker: String,
    pub strategy: StrategyId,
    pub option_symbol: String,
    pub kind: OptionKind,
    pub direction: TradeDirection,
    pub strike: f64,
    pub entry_date: NaiveDate,
    /// Spot price at entry.
    pub entry_spot: f64,
    /// Option price per unit at entry.
    pub entry_price: Decimal,
    pub quantity: i64,
    /// Calendar days to expiry at entry.
    pub entry_dte: i64,
    /// Capital set aside at entry.
    pub invested: Decimal,
    /// Confidence score of the signal that opened the trade.
    pub entry_score: u8,
    pub status: TradeStatus,
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<Decimal>,
    pub exit_reason: Option<ExitReason>,
    pub realized_pnl: Option<Decimal>,
}

impl Trade {
    /// Open a trade from a scanned signal.
    ///
    /// Premium sellers go short; everything else is a long position.
    pub fn open(
        id: u64,
        signal: &Signal,
        entry_date: NaiveDate,
        entry_price: Decimal,
        quantity: i64,
    ) -> Self {
        let direction = if signal.signal_type.is_sell() {
            TradeDirection::Short
        } else {
            TradeDirection::Long
        };

        Self {
            id,
            ticker: signal.ticker.clone(),
            strategy: signal.strategy,
            option_symbol: signal.option_symbol.clone(),
            kind: signal.kind,
            direction,
            strike: signal.strike,
            entry_date,
            entry_spot: signal.spot_price,
            entry_price,
            quantity,
            entry_dte: (signal.time_to_expiry * 365.0).round() as i64,
            invested: entry_price * Decimal::from(quantity),
            entry_score: signal.confidence_score,
            status: TradeStatus::Open,
            exit_date: None,
            exit_price: None,
            exit_reason: None,
            realized_pnl: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Remaining calendar days to expiry on `date`.
    pub fn days_to_expiry(&self, date: NaiveDate) -> i64 {
        self.entry_dte - (date - self.entry_date).num_days()
    }

    /// Remaining time to expiry in years on `date`, floored at zero.
    pub fn time_to_expiry(&self, date: NaiveDate) -> f64 {
        self.days_to_expiry(date).max(0) as f64 / 365.0
    }

    /// P&L if the trade were closed at `mark`.
    pub fn unrealized_pnl(&self, mark: Decimal) -> Decimal {
        (mark - self.entry_price) * Decimal::from(self.quantity) * self.direction.sign()
    }

    /// Unrealized P&L as a percentage of the entry price.
    pub fn unrealized_pnl_pct(&self, mark: Decimal) -> f64 {
        if self.entry_price.is_zero() {
            return 0.0;
        }
        let change = (mark - self.entry_price) / self.entry_price * self.direction.sign();
        (change * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
    }

    /// Exit decision on `date` at `mark`. Thresholds are positive percentages.
    pub fn exit_signal(
        &self,
        date: NaiveDate,
        mark: Decimal,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Option<ExitReason> {
        if !self.is_open() {
            return None;
        }
        if self.days_to_expiry(date) <= 0 {
            return Some(ExitReason::Expiration);
        }

        let pnl_pct = self.unrealized_pnl_pct(mark);
        if pnl_pct <= -stop_loss_pct {
            Some(ExitReason::StopLoss)
        } else if pnl_pct >= take_profit_pct {
            Some(ExitReason::ProfitTarget)
        } else {
            None
        }
    }

    /// Close the trade and return its realized P&L.
    pub fn close(
        &mut self,
        exit_date: NaiveDate,
        exit_price: Decimal,
        reason: ExitReason,
    ) -> Result<Decimal, TradeError> {
        if !self.is_open() {
            return Err(TradeError::AlreadyClosed(self.id));
        }

        let pnl = self.unrealized_pnl(exit_price);
        self.status = reason.status();
        self.exit_date = Some(exit_date);
        self.exit_price = Some(exit_price);
        self.exit_reason = Some(reason);
        self.realized_pnl = Some(pnl);
        Ok(pnl)
    }

    /// Capital released on close: the stake plus realized P&L.
    pub fn released_capital(&self) -> Decimal {
        self.invested + self.pnl()
    }

    pub fn days_held(&self) -> Option<i64> {
        self.exit_date.map(|d| (d - self.entry_date).num_days())
    }

    /// Closed with a positive P&L.
    pub fn is_winner(&self) -> bool {
        self.realized_pnl
            .map(|p| p > Decimal::ZERO)
            .unwrap_or(false)
    }

    /// Realized P&L, zero while open.
    pub fn pnl(&self) -> Decimal {
        self.realized_pnl.unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MarketSnapshot, OptionContract};
    use crate::scanner::test_signal;
    use crate::strategies::SignalType;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn long_call() -> Trade {
        let row = OptionContract::new("PETRA380", OptionKind::Call, 38.0, 30.0 / 365.0);
        let signal = test_signal(StrategyId::LongCall, SignalType::BuyCall, 50.0, &row);
        Trade::open(1, &signal, day(1), dec!(2.00), 100)
    }

    #[test]
    fn test_open_long_call() {
        let trade = long_call();
        assert_eq!(trade.direction, TradeDirection::Long);
        assert_eq!(trade.invested, dec!(200.00));
        assert_eq!(trade.entry_dte, 30);
        assert!(trade.is_open());
        assert_eq!(trade.days_to_expiry(day(11)), 20);
    }

    #[test]
    fn test_stop_out_reference() {
        let mut trade = long_call();
        let mark = dec!(1.30);

        assert_eq!(trade.unrealized_pnl_pct(mark), -35.0);
        let reason = trade.exit_signal(day(5), mark, 30.0, 50.0).unwrap();
        assert_eq!(reason, ExitReason::StopLoss);

        let pnl = trade.close(day(5), mark, reason).unwrap();
        assert_eq!(pnl, dec!(-70.00));
        assert_eq!(trade.status, TradeStatus::StoppedOut);
        assert_eq!(trade.released_capital(), dec!(130.00));
        assert_eq!(trade.days_held(), Some(4));
        assert!(!trade.is_winner());
    }

    #[test]
    fn test_take_profit_and_hold() {
        let trade = long_call();
        assert_eq!(
            trade.exit_signal(day(5), dec!(3.00), 30.0, 50.0),
            Some(ExitReason::ProfitTarget)
        );
        assert_eq!(trade.exit_signal(day(5), dec!(2.50), 30.0, 50.0), None);
        assert_eq!(trade.exit_signal(day(5), dec!(1.41), 30.0, 50.0), None);
    }

    #[test]
    fn test_expiry_takes_precedence() {
        let trade = long_call();
        // Entry on the 1st with 30 DTE expires on the 31st
        assert_eq!(
            trade.exit_signal(day(31), dec!(5.00), 30.0, 50.0),
            Some(ExitReason::Expiration)
        );
    }

    #[test]
    fn test_short_direction_flips_pnl() {
        let row = OptionContract::new("PETRA420", OptionKind::Call, 42.0, 30.0 / 365.0);
        let signal = test_signal(StrategyId::HighIvReversal, SignalType::SellCall, 50.0, &row);
        let mut trade = Trade::open(7, &signal, day(1), dec!(1.00), 50);

        assert_eq!(trade.direction, TradeDirection::Short);
        assert_eq!(trade.unrealized_pnl_pct(dec!(0.40)), 60.0);
        assert_eq!(
            trade.exit_signal(day(2), dec!(1.40), 30.0, 50.0),
            Some(ExitReason::StopLoss)
        );

        let pnl = trade.close(day(2), dec!(0.40), ExitReason::ProfitTarget).unwrap();
        assert_eq!(pnl, dec!(30.00));
        assert!(trade.is_winner());
    }

    #[test]
    fn test_double_close_is_rejected() {
        let mut trade = long_call();
        trade.close(day(3), dec!(2.10), ExitReason::ProfitTarget).unwrap();
        assert_eq!(
            trade.close(day(4), dec!(2.20), ExitReason::StopLoss),
            Err(TradeError::AlreadyClosed(1))
        );
        assert_eq!(trade.exit_price, Some(dec!(2.10)));
    }

    #[test]
    fn test_signal_snapshot_fields() {
        let trade = long_call();
        let snapshot = MarketSnapshot::new("TEST3", 37.52, 50.0);
        assert_eq!(trade.ticker, snapshot.ticker);
        assert_eq!(trade.entry_spot, 37.52);
    }
}
