//! Typed client for the relay backend (mobile flow → relay).

use url::Url;

use super::{ApiClient, ClientError};
use crate::objects::{HealthResponse, PurchaseIntent, RelayResponse, ServiceDescriptor};

pub const ROOT_PATH: &str = "/";
pub const HEALTH_PATH: &str = "/health";
pub const CREATE_ORDER_PATH: &str = "/api/create-order";

/// Typed HTTP client for the relay backend.
#[derive(Debug, Clone)]
pub struct RelayClient {
    api: ApiClient,
}

impl RelayClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Shorthand for a client with a default `reqwest::Client`.
    pub fn from_base_url(base_url: Url) -> Self {
        Self::new(ApiClient::new(base_url))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// `POST /api/create-order` – create an onramp order and return the
    /// upstream response.
    pub async fn create_order(&self, intent: &PurchaseIntent) -> Result<RelayResponse, ClientError> {
        self.api.post(CREATE_ORDER_PATH, intent).await
    }

    /// `GET /health` – liveness of the relay.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.api.get_raw(HEALTH_PATH).await
    }

    /// `GET /` – the relay's self description.
    pub async fn describe(&self) -> Result<ServiceDescriptor, ClientError> {
        self.api.get_raw(ROOT_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::BuyerProfile;
    use axum::{Json, Router, routing::post};
    use rust_decimal::dec;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_create_order_round_trips_data() {
        let router = Router::new().route(
            CREATE_ORDER_PATH,
            post(|Json(intent): Json<Value>| async move {
                Json(json!({
                    "data": {
                        "paymentLink": { "url": "https://pay.example/abc" },
                        "echo": intent["paymentAmount"],
                    }
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let client = RelayClient::from_base_url(Url::parse(&format!("http://{addr}")).unwrap());
        let intent = PurchaseIntent::for_amount(dec!(25), &BuyerProfile::sandbox());
        let response = client.create_order(&intent).await.unwrap();

        assert_eq!(response.payment_link_url(), Some("https://pay.example/abc"));
        assert_eq!(response.0["echo"], "25");
    }
}
