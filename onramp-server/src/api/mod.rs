//! HTTP API handlers.
//!
//! These endpoints are called by the mobile app. Order creation relays the
//! request body to the upstream onramp API with a freshly minted token.
//!
//! # Endpoints
//!
//! - `GET  /`                 – service descriptor
//! - `GET  /health`           – liveness
//! - `POST /api/create-order` – create an onramp order

use axum::{
    Router,
    routing::{get, post},
};
use onramp_sdk::client::{CREATE_ORDER_PATH, HEALTH_PATH, ROOT_PATH};

use crate::state::AppState;

mod meta;
mod orders;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(ROOT_PATH, get(meta::describe))
        .route(HEALTH_PATH, get(meta::health))
        .route(CREATE_ORDER_PATH, post(orders::create_order))
}
