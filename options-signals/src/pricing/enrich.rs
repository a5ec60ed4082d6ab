use tracing::debug;

use super::black_scholes::BlackScholes;
use crate::data::OptionContract;

/// Fill missing `iv` and `delta` on chain rows.
///
/// IV is implied from the mid (or last) price when possible, otherwise the
/// fallback volatility is used. Rows that cannot be priced are left as is.
/// Returns the number of rows that were changed.
pub fn enrich_chain(
    chain: &mut [OptionContract],
    spot: f64,
    model: &BlackScholes,
    fallback_vol: f64,
) -> usize {
    let mut touched = 0;

    for contract in chain.iter_mut() {
        if contract.iv.is_some() && contract.delta.is_some() {
            continue;
        }
        if !contract.is_well_formed() {
            continue;
        }

        let vol = match contract.iv {
            Some(iv) => iv,
            None => {
                let market = contract.mid();
                let implied = model.implied_vol(
                    contract.kind,
                    spot,
                    contract.strike,
                    contract.time_to_expiry,
                    market,
                );
                implied.unwrap_or(fallback_vol)
            }
        };

        let greeks = match model.greeks(
            contract.kind,
            spot,
            contract.strike,
            contract.time_to_expiry,
            vol,
        ) {
            Ok(g) => g,
            Err(e) => {
                debug!(symbol = %contract.symbol, error = %e, "Skipping enrichment");
                continue;
            }
        };

        if contract.iv.is_none() {
            contract.iv = Some(vol);
        }
        if contract.delta.is_none() {
            contract.delta = Some(greeks.delta);
        }
        touched += 1;
    }

    touched
}
