//! Indicative conversion shown next to the amount field.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::dec;
use serde::{Deserialize, Serialize};

/// Reference ETH price in USD used for the on-screen estimate. Actual
/// rates are quoted by the hosted payment page.
pub const REFERENCE_ETH_USD_RATE: Decimal = dec!(3000);

/// Decimal places shown for the estimated ETH amount.
const ESTIMATE_SCALE: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEstimate {
    pub fiat_amount: Decimal,
    pub estimated_crypto: Decimal,
}

/// Estimate how much ETH `fiat_amount` buys at `rate` USD per ETH.
///
/// Returns `None` for non-positive amounts or rates.
pub fn estimate_purchase(fiat_amount: Decimal, rate: Decimal) -> Option<PurchaseEstimate> {
    if fiat_amount <= Decimal::ZERO || rate <= Decimal::ZERO {
        return None;
    }
    let estimated_crypto = fiat_amount
        .checked_div(rate)?
        .round_dp_with_strategy(ESTIMATE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    Some(PurchaseEstimate {
        fiat_amount,
        estimated_crypto,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rounds_to_six_places() {
        let estimate = estimate_purchase(dec!(25), REFERENCE_ETH_USD_RATE).unwrap();
        assert_eq!(estimate.estimated_crypto, dec!(0.008333));
        assert_eq!(estimate.estimated_crypto.to_string(), "0.008333");

        let estimate = estimate_purchase(dec!(3000), REFERENCE_ETH_USD_RATE).unwrap();
        assert_eq!(estimate.estimated_crypto, dec!(1));
    }

    #[test]
    fn test_no_estimate_for_zero() {
        assert!(estimate_purchase(Decimal::ZERO, REFERENCE_ETH_USD_RATE).is_none());
        assert!(estimate_purchase(dec!(10), Decimal::ZERO).is_none());
    }
}
