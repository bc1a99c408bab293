//! OrderRelay processor.
//!
//! The OrderRelay is responsible for:
//! - Minting a bearer token scoped to the upstream order endpoint
//! - Forwarding the caller's order body verbatim to that endpoint
//! - Returning the upstream JSON without validating its shape
//!
//! Every call is a single attempt. There is no retry and no state is kept
//! between calls, so one relay can serve any number of concurrent requests.

use kanau::processor::Processor;
use onramp_sdk::jwt::{DEFAULT_TOKEN_TTL_SECS, TokenError, TokenIssuer, TokenRequest};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// Production host of the upstream onramp API.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.developer.coinbase.com";

/// Order-creation path on the upstream API.
pub const DEFAULT_ORDER_PATH: &str = "/onramp/v2/onramp/order";

/// Upstream request timeout unless configured otherwise.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while relaying an order.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The bearer token could not be minted.
    #[error("token issuance failed: {0}")]
    Token(#[from] TokenError),

    /// Transport-level failure talking to the upstream.
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned status {status}: {body}")]
    Upstream {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The upstream body was not JSON.
    #[error("upstream response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured endpoint does not form a valid URL.
    #[error("invalid upstream url: {0}")]
    Url(#[from] url::ParseError),

    /// The configured endpoint has no host to scope the token to.
    #[error("upstream url has no host")]
    MissingHost,
}

/// Where orders are forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEndpoint {
    base_url: Url,
    path: String,
}

impl UpstreamEndpoint {
    pub fn new(base_url: Url, path: impl Into<String>) -> Self {
        Self {
            base_url,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full URL of the order endpoint.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.path)
    }

    /// Host the token is scoped to, with the port when it is not the
    /// scheme default.
    pub fn token_host(&self) -> Option<String> {
        let host = self.base_url.host_str()?;
        Some(match self.base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }
}

/// Request to create an onramp order.
///
/// The body is whatever the caller sent; unknown fields are preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOnrampOrder {
    pub body: serde_json::Value,
}

/// Relays order-creation requests to the upstream onramp API.
pub struct OrderRelay {
    issuer: Arc<dyn TokenIssuer>,
    endpoint: UpstreamEndpoint,
    token_ttl_secs: u64,
    http_client: reqwest::Client,
}

impl OrderRelay {
    /// Create a new OrderRelay.
    ///
    /// # Arguments
    ///
    /// * `issuer` - Mints the bearer token for each upstream call
    /// * `endpoint` - Upstream order endpoint
    pub fn new(
        issuer: Arc<dyn TokenIssuer>,
        endpoint: UpstreamEndpoint,
    ) -> Result<Self, RelayError> {
        Ok(Self {
            issuer,
            endpoint,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            http_client: http_client_with_timeout(DEFAULT_UPSTREAM_TIMEOUT)?,
        })
    }

    pub fn with_token_ttl(mut self, secs: u64) -> Self {
        self.token_ttl_secs = secs;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, RelayError> {
        self.http_client = http_client_with_timeout(timeout)?;
        Ok(self)
    }

    /// Replace the default `reqwest::Client` (e.g. to add a proxy).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    pub fn endpoint(&self) -> &UpstreamEndpoint {
        &self.endpoint
    }

    fn token_request(&self) -> Result<TokenRequest, RelayError> {
        let host = self.endpoint.token_host().ok_or(RelayError::MissingHost)?;
        Ok(TokenRequest::new("POST", host, self.endpoint.path()).with_expires_in(self.token_ttl_secs))
    }
}

fn http_client_with_timeout(timeout: Duration) -> Result<reqwest::Client, RelayError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

impl Processor<CreateOnrampOrder> for OrderRelay {
    type Output = serde_json::Value;
    type Error = RelayError;

    #[tracing::instrument(skip_all, err, name = "Relay:CreateOnrampOrder")]
    async fn process(&self, order: CreateOnrampOrder) -> Result<serde_json::Value, RelayError> {
        let url = self.endpoint.url()?;
        let token = self.issuer.issue(&self.token_request()?)?;

        let response = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .json(&order.body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            warn!(%status, body = %body, "Upstream rejected order");
            return Err(RelayError::Upstream { status, body });
        }

        let data: serde_json::Value = serde_json::from_slice(&bytes)?;
        info!(
            %status,
            has_payment_link = data.pointer("/paymentLink/url").is_some(),
            "Upstream order created"
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use serde_json::{Value, json};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeIssuer {
        requests: Mutex<Vec<TokenRequest>>,
        fail: bool,
    }

    impl TokenIssuer for FakeIssuer {
        fn issue(&self, request: &TokenRequest) -> Result<String, TokenError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(TokenError::UnsupportedKey);
            }
            Ok("test-token".to_string())
        }
    }

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    async fn spawn_upstream(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    async fn capturing_upstream(captured: Captured) -> Url {
        async fn handler(
            State(captured): State<Captured>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> Json<Value> {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            captured.lock().unwrap().push((auth, body));
            Json(json!({
                "order": { "orderId": "o-1", "status": "ONRAMP_ORDER_STATUS_PENDING_AUTH" },
                "paymentLink": { "url": "https://pay.example/abc?token=t" }
            }))
        }
        let router = Router::new()
            .route(DEFAULT_ORDER_PATH, post(handler))
            .with_state(captured);
        spawn_upstream(router).await
    }

    #[tokio::test]
    async fn test_forwards_body_with_bearer_token() {
        let captured = Captured::default();
        let base = capturing_upstream(captured.clone()).await;
        let issuer = Arc::new(FakeIssuer::default());
        let endpoint = UpstreamEndpoint::new(base.clone(), DEFAULT_ORDER_PATH);
        let relay = OrderRelay::new(issuer.clone(), endpoint).unwrap();

        let body = json!({ "paymentAmount": "25", "purchaseAmount": "25", "extra": [1, 2] });
        let data = relay
            .process(CreateOnrampOrder { body: body.clone() })
            .await
            .unwrap();

        assert_eq!(data["paymentLink"]["url"], "https://pay.example/abc?token=t");

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].0.as_deref(), Some("Bearer test-token"));
        assert_eq!(captured[0].1, body);

        let requests = issuer.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(
            requests[0].host,
            format!("127.0.0.1:{}", base.port().unwrap())
        );
        assert_eq!(requests[0].path, DEFAULT_ORDER_PATH);
        assert_eq!(requests[0].expires_in, DEFAULT_TOKEN_TTL_SECS);
    }

    #[tokio::test]
    async fn test_token_failure_skips_upstream() {
        let captured = Captured::default();
        let base = capturing_upstream(captured.clone()).await;
        let issuer = Arc::new(FakeIssuer {
            fail: true,
            ..Default::default()
        });
        let relay =
            OrderRelay::new(issuer, UpstreamEndpoint::new(base, DEFAULT_ORDER_PATH)).unwrap();

        let err = relay
            .process(CreateOnrampOrder { body: json!({}) })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Token(_)));
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let router = Router::new().route(
            DEFAULT_ORDER_PATH,
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "errorType": "invalid_request", "errorMessage": "bad amount" })),
                )
                    .into_response()
            }),
        );
        let base = spawn_upstream(router).await;
        let relay = OrderRelay::new(
            Arc::new(FakeIssuer::default()),
            UpstreamEndpoint::new(base, DEFAULT_ORDER_PATH),
        )
        .unwrap();

        let err = relay
            .process(CreateOnrampOrder { body: json!({}) })
            .await
            .unwrap_err();
        match err {
            RelayError::Upstream { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(body.contains("bad amount"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body() {
        let router = Router::new().route(DEFAULT_ORDER_PATH, post(|| async { "<html>oops</html>" }));
        let base = spawn_upstream(router).await;
        let relay = OrderRelay::new(
            Arc::new(FakeIssuer::default()),
            UpstreamEndpoint::new(base, DEFAULT_ORDER_PATH),
        )
        .unwrap();

        let err = relay
            .process(CreateOnrampOrder { body: json!({}) })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Decode(_)));
    }

    #[tokio::test]
    async fn test_timeout_applies_to_upstream_calls() {
        let router = Router::new().route(
            DEFAULT_ORDER_PATH,
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        );
        let base = spawn_upstream(router).await;
        let relay = OrderRelay::new(
            Arc::new(FakeIssuer::default()),
            UpstreamEndpoint::new(base, DEFAULT_ORDER_PATH),
        )
        .unwrap()
        .with_timeout(Duration::from_millis(100))
        .unwrap();

        let err = relay
            .process(CreateOnrampOrder { body: json!({}) })
            .await
            .unwrap_err();
        match err {
            RelayError::Request(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let relay = OrderRelay::new(
            Arc::new(FakeIssuer::default()),
            UpstreamEndpoint::new(
                Url::parse(&format!("http://{addr}")).unwrap(),
                DEFAULT_ORDER_PATH,
            ),
        )
        .unwrap();
        let err = relay
            .process(CreateOnrampOrder { body: json!({}) })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Request(_)));
    }

    #[test]
    fn test_token_host_omits_default_port() {
        let endpoint = UpstreamEndpoint::new(
            Url::parse(DEFAULT_UPSTREAM_BASE_URL).unwrap(),
            DEFAULT_ORDER_PATH,
        );
        assert_eq!(endpoint.token_host().as_deref(), Some("api.developer.coinbase.com"));
        assert_eq!(
            endpoint.url().unwrap().as_str(),
            "https://api.developer.coinbase.com/onramp/v2/onramp/order"
        );
    }
}
