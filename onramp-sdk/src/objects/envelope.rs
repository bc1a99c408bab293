//! Response envelopes returned by the relay.
//!
//! Successful relay calls answer `{ "data": <upstream json> }`; failures
//! answer `{ "error": ..., "details": ... }` with status 500.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors produced when unwrapping an envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// The response was a JSON object without a `data` member (or `data`
    /// was `null`).
    #[error("response envelope has no data")]
    MissingData,
}

/// The `{ data }` envelope wrapping every successful relay payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Option<T>,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data: Some(data) }
    }

    /// Take the payload out of the envelope, failing when it is absent.
    pub fn into_data(self) -> Result<T, EnvelopeError> {
        self.data.ok_or(EnvelopeError::MissingData)
    }
}

/// Body of a failed relay call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub details: String,
}

/// `GET /` response describing the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub message: String,
    pub version: String,
    /// `"{METHOD} {path}"` to a one-line description.
    pub endpoints: BTreeMap<String, String>,
    pub status: String,
}

/// `GET /health` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Opaque upstream order response.
///
/// No schema is enforced; the only member the flow cares about is the
/// optional `paymentLink.url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayResponse(pub serde_json::Value);

impl RelayResponse {
    /// URL of the hosted payment page, when the upstream returned one.
    pub fn payment_link_url(&self) -> Option<&str> {
        self.0.pointer("/paymentLink/url")?.as_str()
    }
}
