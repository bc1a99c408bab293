//! Purchase intent sent by the mobile flow to the relay, and forwarded
//! verbatim to the upstream order endpoint.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use time::macros::datetime;

/// Fiat currency the buyer pays with.
pub const PAYMENT_CURRENCY: &str = "USD";

/// Asset the buyer receives.
pub const PURCHASE_CURRENCY: &str = "ETH";

/// Payment method identifier for guest checkout through Apple Pay.
pub const GUEST_CHECKOUT_APPLE_PAY: &str = "GUEST_CHECKOUT_APPLE_PAY";

/// Identity, compliance and destination metadata required by the upstream
/// order endpoint. Constant for the lifetime of a screen session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerProfile {
    pub destination_address: String,
    pub destination_network: String,
    pub email: String,
    pub phone_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub phone_number_verified_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub agreement_accepted_at: OffsetDateTime,
    pub partner_user_ref: String,
}

impl BuyerProfile {
    /// The fixed buyer used against the sandbox environment.
    pub fn sandbox() -> Self {
        Self {
            destination_address: "0x0000000000000000000000000000000000000000".to_string(),
            destination_network: "base".to_string(),
            email: "test@test.com".to_string(),
            phone_number: "12055555555".to_string(),
            phone_number_verified_at: datetime!(2025-08-07 0:00 UTC),
            agreement_accepted_at: datetime!(2025-08-07 0:00 UTC),
            partner_user_ref: "sandbox-123".to_string(),
        }
    }
}

impl Default for BuyerProfile {
    fn default() -> Self {
        Self::sandbox()
    }
}

/// A request to buy crypto, built fresh for every order-creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseIntent {
    pub payment_amount: String,
    pub purchase_amount: String,
    pub payment_currency: String,
    pub purchase_currency: String,
    pub payment_method: String,
    pub destination_address: String,
    pub destination_network: String,
    pub email: String,
    pub phone_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub phone_number_verified_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub agreement_accepted_at: OffsetDateTime,
    pub partner_user_ref: String,
}

impl PurchaseIntent {
    /// Build an intent for `amount` USD.
    ///
    /// The fiat amount is mirrored into the purchase amount; both are
    /// rendered in canonical decimal form (`25`, `10.5`).
    pub fn for_amount(amount: Decimal, profile: &BuyerProfile) -> Self {
        let amount = amount.normalize().to_string();
        Self {
            payment_amount: amount.clone(),
            purchase_amount: amount,
            payment_currency: PAYMENT_CURRENCY.to_string(),
            purchase_currency: PURCHASE_CURRENCY.to_string(),
            payment_method: GUEST_CHECKOUT_APPLE_PAY.to_string(),
            destination_address: profile.destination_address.clone(),
            destination_network: profile.destination_network.clone(),
            email: profile.email.clone(),
            phone_number: profile.phone_number.clone(),
            phone_number_verified_at: profile.phone_number_verified_at,
            agreement_accepted_at: profile.agreement_accepted_at,
            partner_user_ref: profile.partner_user_ref.clone(),
        }
    }
}

/// Parse the text of the amount field into a fiat amount.
///
/// Empty or unparsable input reads as zero, and so does anything negative:
/// only a positive amount ever starts an order.
pub fn parse_fiat_amount(text: &str) -> Decimal {
    let text = text.trim();
    if text.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .filter(|amount| amount.is_sign_positive())
        .unwrap_or(Decimal::ZERO)
}
