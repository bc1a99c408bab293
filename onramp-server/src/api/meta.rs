use axum::Json;
use onramp_sdk::client::{CREATE_ORDER_PATH, HEALTH_PATH, ROOT_PATH};
use onramp_sdk::objects::{HealthResponse, ServiceDescriptor};
use std::collections::BTreeMap;

/// `GET /` — describe the service and its endpoints.
pub(super) async fn describe() -> Json<ServiceDescriptor> {
    let endpoints = BTreeMap::from([
        (format!("GET {ROOT_PATH}"), "This endpoint - API information".to_string()),
        (format!("GET {HEALTH_PATH}"), "Health check".to_string()),
        (format!("POST {CREATE_ORDER_PATH}"), "Create onramp order".to_string()),
    ]);
    Json(ServiceDescriptor {
        message: "Onramp Relay Backend API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
        status: "running".to_string(),
    })
}

/// `GET /health` — returns OK if the server is running.
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Backend server is running".to_string(),
    })
}
