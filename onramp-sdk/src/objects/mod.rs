pub mod envelope;
pub mod estimate;
pub mod purchase;
pub mod surface;

pub use envelope::{
    DataEnvelope, EnvelopeError, ErrorEnvelope, HealthResponse, RelayResponse, ServiceDescriptor,
};
pub use estimate::{PurchaseEstimate, REFERENCE_ETH_USD_RATE, estimate_purchase};
pub use purchase::{
    BuyerProfile, GUEST_CHECKOUT_APPLE_PAY, PAYMENT_CURRENCY, PURCHASE_CURRENCY, PurchaseIntent,
    parse_fiat_amount,
};
pub use surface::{SurfaceEvent, SurfaceEventData, SurfaceMessage, SurfaceMessageError};
