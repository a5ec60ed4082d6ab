//! Black-Scholes pricing for European options.
//!
//! Closed-form price and analytical Greeks without dividends:
//!
//! - d1 = (ln(S/K) + (r + vol^2/2) t) / (vol sqrt(t))
//! - d2 = d1 - vol sqrt(t)
//! - call = S N(d1) - K e^(-rt) N(d2)
//! - put = K e^(-rt) N(-d2) - S N(-d1)
//!
//! Theta is returned per calendar day, vega and rho per 1% move.

use std::f64::consts::PI;

use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::data::{Greeks, OptionKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("Invalid pricing input: {0}")]
    Domain(String),
}

/// Black-Scholes calculator for option prices and Greeks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholes {
    /// Risk-free interest rate
    pub rate: f64,
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self {
            rate: 0.1175, // Selic reference rate
        }
    }
}

impl BlackScholes {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    fn validate(&self, spot: f64, strike: f64, time: f64, vol: f64) -> Result<(), PricingError> {
        if !vol.is_finite() || vol <= 0.0 {
            return Err(PricingError::Domain(format!(
                "volatility must be positive, got {}",
                vol
            )));
        }
        if !time.is_finite() || time < 0.0 {
            return Err(PricingError::Domain(format!(
                "time to expiry must be non-negative, got {}",
                time
            )));
        }
        if !spot.is_finite() || spot <= 0.0 {
            return Err(PricingError::Domain(format!("spot must be positive, got {}", spot)));
        }
        if !strike.is_finite() || strike <= 0.0 {
            return Err(PricingError::Domain(format!(
                "strike must be positive, got {}",
                strike
            )));
        }
        if !self.rate.is_finite() {
            return Err(PricingError::Domain("rate must be finite".to_string()));
        }
        Ok(())
    }

    /// Calculate d1 parameter.
    fn d1(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        let numerator = (spot / strike).ln() + (self.rate + 0.5 * vol * vol) * time;
        numerator / (vol * time.sqrt())
    }

    /// Calculate d2 parameter.
    fn d2(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        self.d1(spot, strike, time, vol) - vol * time.sqrt()
    }

    /// Standard normal CDF.
    fn norm_cdf(x: f64) -> f64 {
        // Parameters are constant and valid.
        match Normal::new(0.0, 1.0) {
            Ok(normal) => normal.cdf(x),
            Err(_) => f64::NAN,
        }
    }

    /// Standard normal PDF.
    fn norm_pdf(x: f64) -> f64 {
        (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
    }

    /// Option price. Zero time to expiry settles at intrinsic value.
    pub fn price(
        &self,
        kind: OptionKind,
        spot: f64,
        strike: f64,
        time: f64,
        vol: f64,
    ) -> Result<f64, PricingError> {
        self.validate(spot, strike, time, vol)?;

        if time == 0.0 {
            return Ok(kind.intrinsic(spot, strike));
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);
        let discount = (-self.rate * time).exp();

        let price = match kind {
            OptionKind::Call => spot * Self::norm_cdf(d1) - strike * discount * Self::norm_cdf(d2),
            OptionKind::Put => strike * discount * Self::norm_cdf(-d2) - spot * Self::norm_cdf(-d1),
        };
        Ok(price)
    }

    /// All Greeks at once. At expiry delta collapses to 1/0 (call) or
    /// -1/0 (put) and the rest to zero.
    pub fn greeks(
        &self,
        kind: OptionKind,
        spot: f64,
        strike: f64,
        time: f64,
        vol: f64,
    ) -> Result<Greeks, PricingError> {
        self.validate(spot, strike, time, vol)?;

        if time == 0.0 {
            let delta = match kind {
                OptionKind::Call if spot > strike => 1.0,
                OptionKind::Put if spot < strike => -1.0,
                _ => 0.0,
            };
            return Ok(Greeks {
                delta,
                ..Greeks::default()
            });
        }

        let sqrt_t = time.sqrt();
        let d1 = self.d1(spot, strike, time, vol);
        let d2 = d1 - vol * sqrt_t;
        let discount = (-self.rate * time).exp();
        let pdf_d1 = Self::norm_pdf(d1);

        let gamma = pdf_d1 / (spot * vol * sqrt_t);
        let vega = spot * pdf_d1 * sqrt_t / 100.0;
        let decay = -spot * pdf_d1 * vol / (2.0 * sqrt_t);

        let greeks = match kind {
            OptionKind::Call => Greeks {
                delta: Self::norm_cdf(d1),
                gamma,
                theta: (decay - self.rate * strike * discount * Self::norm_cdf(d2)) / 365.0,
                vega,
                rho: strike * time * discount * Self::norm_cdf(d2) / 100.0,
            },
            OptionKind::Put => Greeks {
                delta: Self::norm_cdf(d1) - 1.0,
                gamma,
                theta: (decay + self.rate * strike * discount * Self::norm_cdf(-d2)) / 365.0,
                vega,
                rho: -strike * time * discount * Self::norm_cdf(-d2) / 100.0,
            },
        };
        Ok(greeks)
    }

    /// Implied volatility from a market price using Newton-Raphson.
    pub fn implied_vol(
        &self,
        kind: OptionKind,
        spot: f64,
        strike: f64,
        time: f64,
        price: f64,
    ) -> Option<f64> {
        if time <= 0.0 || price <= 0.0 || spot <= 0.0 || strike <= 0.0 {
            return None;
        }

        // Brenner-Subrahmanyam initial guess
        let mut vol = ((price / spot) * (2.0 * PI / time).sqrt()).clamp(0.01, 5.0);

        let max_iter = 100;
        let tolerance = 1e-6;

        for _ in 0..max_iter {
            let calc_price = self.price(kind, spot, strike, time, vol).ok()?;
            let diff = calc_price - price;

            if diff.abs() < tolerance {
                return Some(vol);
            }

            // Unscaled vega
            let vega = spot * Self::norm_pdf(self.d1(spot, strike, time, vol)) * time.sqrt();
            if vega.abs() < 1e-10 {
                break;
            }

            vol = (vol - diff / vega).clamp(0.001, 10.0);
        }

        None
    }
}

/// Black-Scholes price with an explicit risk-free rate.
pub fn price(
    kind: OptionKind,
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    volatility: f64,
) -> Result<f64, PricingError> {
    BlackScholes::new(risk_free_rate).price(kind, spot, strike, time_to_expiry, volatility)
}

/// Black-Scholes Greeks with an explicit risk-free rate.
pub fn greeks(
    kind: OptionKind,
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    volatility: f64,
) -> Result<Greeks, PricingError> {
    BlackScholes::new(risk_free_rate).greeks(kind, spot, strike, time_to_expiry, volatility)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_black_scholes_call_price() {
        let bs = BlackScholes::new(0.05);
        // S=100, K=100, T=1, vol=0.20
        let price = bs.price(OptionKind::Call, 100.0, 100.0, 1.0, 0.20).unwrap();
        assert_relative_eq!(price, 10.4506, epsilon = 1e-4);
    }

    #[test]
    fn test_reference_scenario() {
        let spot = 37.52;
        let strike = 38.00;
        let time = 30.0 / 365.0;

        let call = price(OptionKind::Call, spot, strike, time, 0.1175, 0.30).unwrap();
        let g = greeks(OptionKind::Call, spot, strike, time, 0.1175, 0.30).unwrap();

        assert_relative_eq!(call, 1.232379, epsilon = 1e-4);
        assert_relative_eq!(g.delta, 0.502988, epsilon = 1e-4);
        assert_relative_eq!(g.gamma, 0.123623, epsilon = 1e-4);
        assert_relative_eq!(g.theta, -0.027134, epsilon = 1e-4);
    }

    #[test]
    fn test_put_call_parity() {
        let bs = BlackScholes::new(0.1175);
        for &(spot, strike, time, vol) in &[
            (100.0, 100.0, 1.0, 0.20),
            (37.52, 40.0, 0.05, 0.45),
            (12.0, 9.5, 0.5, 0.9),
            (250.0, 300.0, 2.0, 0.15),
        ] {
            let call = bs.price(OptionKind::Call, spot, strike, time, vol).unwrap();
            let put = bs.price(OptionKind::Put, spot, strike, time, vol).unwrap();
            let parity_rhs = spot - strike * (-bs.rate * time).exp();
            assert_relative_eq!(call - put, parity_rhs, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_greek_bounds() {
        let bs = BlackScholes::default();
        for &strike in &[80.0, 95.0, 100.0, 105.0, 130.0] {
            let call = bs.greeks(OptionKind::Call, 100.0, strike, 0.5, 0.25).unwrap();
            let put = bs.greeks(OptionKind::Put, 100.0, strike, 0.5, 0.25).unwrap();

            assert!((0.0..=1.0).contains(&call.delta));
            assert!((-1.0..=0.0).contains(&put.delta));
            assert!(call.gamma >= 0.0 && put.gamma >= 0.0);
            assert!(call.vega >= 0.0 && put.vega >= 0.0);
            assert_relative_eq!(call.delta - put.delta, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_intrinsic_convergence() {
        let bs = BlackScholes::default();
        let near = 1e-8;
        let call_itm = bs.price(OptionKind::Call, 105.0, 100.0, near, 0.3).unwrap();
        let put_itm = bs.price(OptionKind::Put, 95.0, 100.0, near, 0.3).unwrap();
        let call_otm = bs.price(OptionKind::Call, 95.0, 100.0, near, 0.3).unwrap();

        assert_relative_eq!(call_itm, 5.0, epsilon = 1e-4);
        assert_relative_eq!(put_itm, 5.0, epsilon = 1e-4);
        assert_relative_eq!(call_otm, 0.0, epsilon = 1e-4);

        assert_eq!(bs.price(OptionKind::Call, 105.0, 100.0, 0.0, 0.3).unwrap(), 5.0);
        assert_eq!(bs.price(OptionKind::Put, 105.0, 100.0, 0.0, 0.3).unwrap(), 0.0);
    }

    #[test]
    fn test_expiry_greeks_sentinel() {
        let bs = BlackScholes::default();
        let call = bs.greeks(OptionKind::Call, 105.0, 100.0, 0.0, 0.3).unwrap();
        let put = bs.greeks(OptionKind::Put, 95.0, 100.0, 0.0, 0.3).unwrap();
        let otm_put = bs.greeks(OptionKind::Put, 105.0, 100.0, 0.0, 0.3).unwrap();

        assert_eq!(call.delta, 1.0);
        assert_eq!(put.delta, -1.0);
        assert_eq!(otm_put.delta, 0.0);
        assert_eq!(call.gamma, 0.0);
        assert_eq!(call.vega, 0.0);
        assert_eq!(call.theta, 0.0);
    }

    #[test]
    fn test_domain_errors() {
        let bs = BlackScholes::default();
        assert!(matches!(
            bs.price(OptionKind::Call, 100.0, 100.0, 0.5, 0.0),
            Err(PricingError::Domain(_))
        ));
        assert!(bs.price(OptionKind::Call, 100.0, 100.0, 0.5, -0.2).is_err());
        assert!(bs.price(OptionKind::Call, 100.0, 100.0, -0.1, 0.2).is_err());
        assert!(bs.greeks(OptionKind::Put, 0.0, 100.0, 0.5, 0.2).is_err());
        assert!(bs.greeks(OptionKind::Put, 100.0, f64::NAN, 0.5, 0.2).is_err());
    }

    #[test]
    fn test_implied_vol() {
        let bs = BlackScholes::new(0.05);
        let vol = 0.25;
        let price = bs.price(OptionKind::Call, 100.0, 100.0, 0.5, vol).unwrap();

        let iv = bs
            .implied_vol(OptionKind::Call, 100.0, 100.0, 0.5, price)
            .unwrap();
        assert_relative_eq!(iv, vol, epsilon = 0.001);
    }
}
