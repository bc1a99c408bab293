use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kanau::processor::Processor;
use onramp_core::relay::{CreateOnrampOrder, RelayError};
use onramp_sdk::objects::{DataEnvelope, ErrorEnvelope};
use serde_json::Value;

use crate::state::AppState;

/// Client-facing text of every failed order call.
const ORDER_FAILED: &str = "Something went wrong!";

/// `POST /api/create-order` — relay an order to the upstream onramp API.
///
/// The body is forwarded as-is and the upstream JSON comes back inside
/// `{ "data": ... }`.
pub(super) async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<DataEnvelope<Value>>, OrderApiError> {
    let relay = state.relay().await;
    let data = relay
        .process(CreateOnrampOrder { body })
        .await
        .map_err(OrderApiError::Relay)?;
    Ok(Json(DataEnvelope::new(data)))
}

/// Errors that can occur in order handlers.
#[derive(Debug)]
pub(super) enum OrderApiError {
    /// Token issuance, the upstream call, or decoding its answer failed.
    Relay(RelayError),
}

impl IntoResponse for OrderApiError {
    fn into_response(self) -> Response {
        match self {
            OrderApiError::Relay(e) => {
                tracing::error!(error = %e, "Failed to create onramp order");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorEnvelope {
                        error: ORDER_FAILED.to_string(),
                        details: e.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
