//! Performance metrics calculator.
//!
//! Works from the closed trades and the equity curve of one backtest run.
//! Win rate is reported as a percentage.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::{EquityPoint, ExitReason, Trade};

/// Reported when there are winners and no losers.
pub const PROFIT_FACTOR_CAP: f64 = 999.0;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Performance statistics for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // Trade counts
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percentage of closed trades with positive P&L, 1 dp.
    pub win_rate: f64,

    // P&L
    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub profit_factor: f64,
    pub avg_trade_pnl: Decimal,
    pub avg_winner: Decimal,
    pub avg_loser: Decimal,
    pub largest_winner: Decimal,
    pub largest_loser: Decimal,

    // Returns and risk
    pub total_return_pct: f64,
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: f64,
    pub drawdown_duration_days: i64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,

    // Time
    pub trading_days: usize,
    pub avg_days_in_trade: f64,
    pub exits: ExitBreakdown,
}

/// Closed trades by exit reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitBreakdown {
    pub expired: usize,
    pub stopped_out: usize,
    pub took_profit: usize,
}

impl PerformanceMetrics {
    pub fn summary(&self) -> String {
        format!(
            "Trades: {} (W: {}, L: {})\n\
             Win Rate: {:.1}%\n\
             Profit Factor: {:.2}\n\
             Total P&L: {:.2}\n\
             Avg Winner: {:.2}\n\
             Avg Loser: {:.2}\n\
             Total Return: {:.2}%\n\
             Max Drawdown: {:.2} ({:.2}%)\n\
             Sharpe Ratio: {:.2}\n\
             Exits: {} expired, {} stopped out, {} took profit",
            self.total_trades,
            self.winning_trades,
            self.losing_trades,
            self.win_rate,
            self.profit_factor,
            self.total_pnl,
            self.avg_winner,
            self.avg_loser,
            self.total_return_pct,
            self.max_drawdown,
            self.max_drawdown_pct,
            self.sharpe_ratio,
            self.exits.expired,
            self.exits.stopped_out,
            self.exits.took_profit,
        )
    }
}

/// Drawdown analysis details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownAnalysis {
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: f64,
    pub peak_date: Option<NaiveDate>,
    pub trough_date: Option<NaiveDate>,
    /// Calendar days from the drawdown start to the deepest point.
    pub duration_days: i64,
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Metrics from the closed trades and equity curve of a run.
    ///
    /// Trades still open are ignored.
    pub fn calculate(
        trades: &[Trade],
        equity_curve: &[EquityPoint],
        initial_capital: Decimal,
    ) -> PerformanceMetrics {
        let closed: Vec<&Trade> = trades.iter().filter(|t| !t.is_open()).collect();

        let total_trades = closed.len();
        let winning_trades = closed.iter().filter(|t| t.is_winner()).count();
        let losing_trades = total_trades - winning_trades;

        let total_pnl: Decimal = closed.iter().map(|t| t.pnl()).sum();
        let gross_profit: Decimal = closed
            .iter()
            .filter(|t| t.is_winner())
            .map(|t| t.pnl())
            .sum();
        let gross_loss: Decimal = closed
            .iter()
            .filter(|t| !t.is_winner())
            .map(|t| t.pnl())
            .sum();

        let largest_winner = closed
            .iter()
            .filter(|t| t.is_winner())
            .map(|t| t.pnl())
            .max()
            .unwrap_or(Decimal::ZERO);
        let largest_loser = closed
            .iter()
            .filter(|t| !t.is_winner())
            .map(|t| t.pnl())
            .min()
            .unwrap_or(Decimal::ZERO);

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);
        let drawdown = Self::analyze_drawdown(equity_curve);

        let avg_days_in_trade = if total_trades > 0 {
            closed
                .iter()
                .filter_map(|t| t.days_held())
                .map(|d| d as f64)
                .sum::<f64>()
                / total_trades as f64
        } else {
            0.0
        };

        PerformanceMetrics {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate: Self::win_rate(winning_trades, total_trades),
            total_pnl,
            gross_profit,
            gross_loss,
            profit_factor: Self::profit_factor(gross_profit, gross_loss),
            avg_trade_pnl: Self::average(total_pnl, total_trades),
            avg_winner: Self::average(gross_profit, winning_trades),
            avg_loser: Self::average(gross_loss, losing_trades),
            largest_winner,
            largest_loser,
            total_return_pct: Self::total_return_pct(initial_capital, final_equity),
            max_drawdown: drawdown.max_drawdown,
            max_drawdown_pct: drawdown.max_drawdown_pct,
            drawdown_duration_days: drawdown.duration_days,
            sharpe_ratio: Self::sharpe_ratio(equity_curve),
            sortino_ratio: Self::sortino_ratio(equity_curve),
            trading_days: equity_curve.len(),
            avg_days_in_trade,
            exits: Self::exit_breakdown(&closed),
        }
    }

    /// Winners as a percentage of closed trades, rounded to 1 dp.
    pub fn win_rate(winning_trades: usize, total_trades: usize) -> f64 {
        if total_trades == 0 {
            return 0.0;
        }
        let pct = winning_trades as f64 / total_trades as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    }

    /// Gross profit over absolute gross loss.
    ///
    /// [`PROFIT_FACTOR_CAP`] with winners and no losers, 0.0 with neither.
    pub fn profit_factor(gross_profit: Decimal, gross_loss: Decimal) -> f64 {
        let loss = gross_loss.abs().to_f64().unwrap_or(0.0);
        let profit = gross_profit.to_f64().unwrap_or(0.0);
        if loss == 0.0 {
            return if profit > 0.0 { PROFIT_FACTOR_CAP } else { 0.0 };
        }
        profit / loss
    }

    pub fn total_return_pct(initial: Decimal, final_equity: Decimal) -> f64 {
        if initial <= Decimal::ZERO {
            return 0.0;
        }
        ((final_equity - initial) / initial * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    }

    fn average(total: Decimal, count: usize) -> Decimal {
        if count == 0 {
            Decimal::ZERO
        } else {
            total / Decimal::from(count as u64)
        }
    }

    fn exit_breakdown(closed: &[&Trade]) -> ExitBreakdown {
        let mut exits = ExitBreakdown::default();
        for trade in closed {
            match trade.exit_reason {
                Some(ExitReason::Expiration) => exits.expired += 1,
                Some(ExitReason::StopLoss) => exits.stopped_out += 1,
                Some(ExitReason::ProfitTarget) => exits.took_profit += 1,
                None => {}
            }
        }
        exits
    }

    /// Peak-to-trough analysis of the equity curve.
    pub fn analyze_drawdown(equity_curve: &[EquityPoint]) -> DrawdownAnalysis {
        let Some(first) = equity_curve.first() else {
            return DrawdownAnalysis::default();
        };

        let mut peak = first.equity;
        let mut peak_date = first.date;
        let mut analysis = DrawdownAnalysis::default();

        for point in equity_curve {
            if point.equity > peak {
                peak = point.equity;
                peak_date = point.date;
                continue;
            }

            let drawdown = peak - point.equity;
            if drawdown > analysis.max_drawdown {
                analysis.max_drawdown = drawdown;
                analysis.max_drawdown_pct = if peak > Decimal::ZERO {
                    (drawdown / peak * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
                } else {
                    0.0
                };
                analysis.peak_date = Some(peak_date);
                analysis.trough_date = Some(point.date);
                analysis.duration_days = (point.date - peak_date).num_days();
            }
        }

        analysis
    }

    fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
        equity_curve
            .windows(2)
            .filter_map(|w| {
                let prev = w[0].equity.to_f64()?;
                let curr = w[1].equity.to_f64()?;
                (prev > 0.0).then(|| (curr - prev) / prev)
            })
            .collect()
    }

    /// Annualized Sharpe ratio of daily equity returns, zero risk-free rate.
    pub fn sharpe_ratio(equity_curve: &[EquityPoint]) -> f64 {
        let returns = Self::daily_returns(equity_curve);
        if returns.is_empty() {
            return 0.0;
        }

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        if std_dev == 0.0 {
            return 0.0;
        }
        mean * TRADING_DAYS_PER_YEAR.sqrt() / std_dev
    }

    /// Annualized Sortino ratio (downside deviation only).
    pub fn sortino_ratio(equity_curve: &[EquityPoint]) -> f64 {
        let returns = Self::daily_returns(equity_curve);
        if returns.is_empty() {
            return 0.0;
        }

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let downside = returns
            .iter()
            .filter(|&&r| r < 0.0)
            .map(|r| r.powi(2))
            .sum::<f64>()
            / n;
        let downside_dev = downside.sqrt();

        if downside_dev == 0.0 {
            return 0.0;
        }
        mean * TRADING_DAYS_PER_YEAR.sqrt() / downside_dev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn point(day: u32, equity: Decimal) -> EquityPoint {
        EquityPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            equity,
            free_capital: equity,
            invested: Decimal::ZERO,
            realized_pnl: equity - dec!(10000),
            open_trades: 0,
        }
    }

    #[test]
    fn test_profit_factor() {
        assert_eq!(MetricsCalculator::profit_factor(dec!(1500), dec!(-500)), 3.0);
    }

    #[test]
    fn test_profit_factor_sentinels() {
        assert_eq!(
            MetricsCalculator::profit_factor(dec!(120), Decimal::ZERO),
            PROFIT_FACTOR_CAP
        );
        assert_eq!(MetricsCalculator::profit_factor(Decimal::ZERO, Decimal::ZERO), 0.0);
        assert_eq!(MetricsCalculator::profit_factor(Decimal::ZERO, dec!(-70)), 0.0);
    }

    #[test]
    fn test_win_rate_is_percent() {
        assert_eq!(MetricsCalculator::win_rate(2, 3), 66.7);
        assert_eq!(MetricsCalculator::win_rate(0, 0), 0.0);
        assert_eq!(MetricsCalculator::win_rate(5, 5), 100.0);
    }

    #[test]
    fn test_drawdown() {
        let curve = vec![
            point(1, dec!(10000)),
            point(2, dec!(11000)),
            point(3, dec!(9900)),
            point(5, dec!(10500)),
            point(8, dec!(11500)),
        ];
        let dd = MetricsCalculator::analyze_drawdown(&curve);
        assert_eq!(dd.max_drawdown, dec!(1100));
        assert_relative_eq!(dd.max_drawdown_pct, 10.0, epsilon = 1e-9);
        assert_eq!(dd.duration_days, 1);
        assert_eq!(dd.trough_date, NaiveDate::from_ymd_opt(2024, 1, 3));
    }

    #[test]
    fn test_drawdown_empty() {
        let dd = MetricsCalculator::analyze_drawdown(&[]);
        assert_eq!(dd, DrawdownAnalysis::default());
    }

    #[test]
    fn test_flat_curve_has_no_sharpe() {
        let curve = vec![point(1, dec!(10000)), point(2, dec!(10000)), point(3, dec!(10000))];
        assert_eq!(MetricsCalculator::sharpe_ratio(&curve), 0.0);
        assert_eq!(MetricsCalculator::sortino_ratio(&curve), 0.0);
    }

    #[test]
    fn test_calculate_without_trades() {
        let curve = vec![point(1, dec!(10000)), point(2, dec!(10000))];
        let metrics = MetricsCalculator::calculate(&[], &curve, dec!(10000));
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.total_return_pct, 0.0);
        assert_eq!(metrics.trading_days, 2);
    }
}
