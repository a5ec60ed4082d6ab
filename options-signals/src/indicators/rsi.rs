use thiserror::Error;

/// Value used while the indicator has not seen enough closes.
pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Invalid indicator period: {0}")]
    InvalidPeriod(usize),
}

/// Wilder's moving average: seeded with the simple mean of the first
/// `period` inputs, then smoothed with alpha = 1/period.
#[derive(Debug, Clone)]
struct WilderAverage {
    period: usize,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl WilderAverage {
    fn new(period: usize) -> Self {
        Self {
            period,
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    fn next(&mut self, input: f64) -> Option<f64> {
        let n = self.period as f64;
        self.value = match self.value {
            Some(prev) => Some((prev * (n - 1.0) + input) / n),
            None => {
                self.seed_sum += input;
                self.seen += 1;
                (self.seen == self.period).then(|| self.seed_sum / n)
            }
        };
        self.value
    }
}

/// Streaming RSI with Wilder smoothing.
#[derive(Debug, Clone)]
pub struct WilderRsi {
    gains: WilderAverage,
    losses: WilderAverage,
    prev_close: Option<f64>,
}

impl WilderRsi {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidPeriod(period));
        }
        Ok(Self {
            gains: WilderAverage::new(period),
            losses: WilderAverage::new(period),
            prev_close: None,
        })
    }

    /// Feed one close; `None` until `period` price changes have been seen.
    pub fn next(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        let change = close - prev;

        let avg_gain = self.gains.next(change.max(0.0));
        let avg_loss = self.losses.next((-change).max(0.0));
        let (up, down) = (avg_gain?, avg_loss?);

        let rsi = if down == 0.0 && up == 0.0 {
            NEUTRAL_RSI
        } else if down == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + up / down)
        };
        Some(rsi)
    }
}

/// RSI for every close, aligned with the input.
///
/// The first `period` entries are filled with [`NEUTRAL_RSI`].
pub fn rsi_series(closes: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    let mut rsi = WilderRsi::new(period)?;

    let series = closes
        .iter()
        .map(|&close| match rsi.next(close) {
            Some(value) if value.is_finite() => value.clamp(0.0, 100.0),
            _ => NEUTRAL_RSI,
        })
        .collect();

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_warmup_is_neutral() {
        let closes: Vec<f64> = (0..20).map(|i| 30.0 + i as f64).collect();
        let rsi = rsi_series(&closes, 14).unwrap();
        assert_eq!(rsi.len(), 20);
        assert!(rsi[..14].iter().all(|v| *v == NEUTRAL_RSI));
        assert_eq!(rsi[14], 100.0);
    }

    #[test]
    fn test_wilder_reference_series() {
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let expected = [70.4641, 66.2496, 66.4809, 69.3469, 66.2947, 57.9150];

        let rsi = rsi_series(&closes, 14).unwrap();
        for (value, want) in rsi[14..].iter().zip(expected) {
            assert_relative_eq!(*value, want, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_flat_closes_stay_neutral() {
        let rsi = rsi_series(&[25.0; 30], 14).unwrap();
        assert!(rsi.iter().all(|v| *v == NEUTRAL_RSI));
    }

    #[test]
    fn test_trend_direction() {
        let rising: Vec<f64> = (0..40).map(|i| 20.0 + i as f64 * 0.5).collect();
        let falling: Vec<f64> = rising.iter().rev().copied().collect();

        let up = rsi_series(&rising, 14).unwrap();
        let down = rsi_series(&falling, 14).unwrap();
        assert!(*up.last().unwrap() > 70.0);
        assert!(*down.last().unwrap() < 30.0);
    }

    #[test]
    fn test_invalid_period() {
        assert_eq!(
            rsi_series(&[1.0, 2.0], 0),
            Err(IndicatorError::InvalidPeriod(0))
        );
    }
}
