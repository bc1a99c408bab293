use async_trait::async_trait;
use onramp_sdk::client::{ClientError, RelayClient};
use onramp_sdk::objects::{PurchaseIntent, RelayResponse};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("{0}")]
    Other(String),
}

/// Creates orders on behalf of the payment flow.
///
/// [`RelayClient`] is the production implementation; tests substitute
/// in-memory gateways.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn create_order(&self, intent: PurchaseIntent) -> Result<RelayResponse, GatewayError>;
}

#[async_trait]
impl OrderGateway for RelayClient {
    async fn create_order(&self, intent: PurchaseIntent) -> Result<RelayResponse, GatewayError> {
        Ok(RelayClient::create_order(self, &intent).await?)
    }
}
