//! Generic JSON client for `{ data }`-enveloped APIs.

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::ClientError;
use crate::objects::DataEnvelope;

/// JSON HTTP client bound to one base origin.
///
/// Successful responses are expected as `{ "data": T }`; the envelope is
/// unwrapped and a missing `data` member is an error rather than an empty
/// value. Construct one per backend and pass it to whoever needs it.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new `ApiClient` rooted at `base_url`
    /// (e.g. `http://localhost:3000`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET {path}`, unwrapping the `{ data }` envelope.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let request = self.request(Method::GET, path)?;
        self.call_enveloped(request).await
    }

    /// `POST {path}` with a JSON body, unwrapping the `{ data }` envelope.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path)?.json(body);
        self.call_enveloped(request).await
    }

    /// `PUT {path}` with a JSON body, unwrapping the `{ data }` envelope.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path)?.json(body);
        self.call_enveloped(request).await
    }

    /// `DELETE {path}`, unwrapping the `{ data }` envelope.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let request = self.request(Method::DELETE, path)?;
        self.call_enveloped(request).await
    }

    /// `GET {path}` for endpoints that answer without an envelope.
    pub async fn get_raw<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let request = self.request(Method::GET, path)?;
        let result = send_raw(request).await;
        log_failure(&result);
        result
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        tracing::debug!(%method, %url, "Sending API request");
        Ok(self.http.request(method, url))
    }

    async fn call_enveloped<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let result = send_enveloped(request).await;
        log_failure(&result);
        result
    }
}

async fn send_raw<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let resp = request.send().await?;
    parse_response(resp).await
}

async fn send_enveloped<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let resp = request.send().await?;
    let envelope: DataEnvelope<T> = parse_response(resp).await?;
    Ok(envelope.into_data()?)
}

fn log_failure<T>(result: &Result<T, ClientError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "API request failed");
    }
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::{Value, json};

    async fn spawn_backend(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    #[tokio::test]
    async fn test_post_unwraps_data_and_sends_json() {
        async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({ "data": { "received": body, "contentType": content_type } }))
        }
        let base = spawn_backend(Router::new().route("/echo", post(echo))).await;
        let client = ApiClient::new(base);

        let data: Value = client.post("/echo", &json!({ "a": 1 })).await.unwrap();
        assert_eq!(data["received"], json!({ "a": 1 }));
        assert_eq!(data["contentType"], "application/json");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let base = spawn_backend(Router::new()).await;
        let client = ApiClient::new(base);

        let err = client.get::<Value>("/missing").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_missing_data_fails_loudly() {
        let router = Router::new().route("/bare", get(|| async { Json(json!({ "ok": true })) }));
        let base = spawn_backend(router).await;
        let client = ApiClient::new(base);

        let err = client.get::<Value>("/bare").await.unwrap_err();
        assert!(matches!(err, ClientError::Envelope(_)));

        let raw: Value = client.get_raw("/bare").await.unwrap();
        assert_eq!(raw, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let router = Router::new().route(
            "/items",
            axum::routing::put(|Json(body): Json<Value>| async move {
                Json(json!({ "data": body }))
            })
            .delete(|| async { Json(json!({ "data": "gone" })) }),
        );
        let base = spawn_backend(router).await;
        let client = ApiClient::new(base);

        let put: Value = client.put("/items", &json!([1, 2])).await.unwrap();
        assert_eq!(put, json!([1, 2]));
        let deleted: String = client.delete("/items").await.unwrap();
        assert_eq!(deleted, "gone");
    }
}
