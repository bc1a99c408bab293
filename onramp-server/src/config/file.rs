//! TOML file configuration structures.
//!
//! These structs directly map to the `onramp-config.toml` file format.
//! Every section is optional; a missing file behaves like an empty one.

use onramp_core::relay::{DEFAULT_ORDER_PATH, DEFAULT_UPSTREAM_BASE_URL, DEFAULT_UPSTREAM_TIMEOUT};
use onramp_sdk::jwt::DEFAULT_TOKEN_TTL_SECS;
use serde::Deserialize;
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:3000").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

pub fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:3000".parse().expect("valid default address")
}

/// Upstream onramp API section.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    #[serde(default = "default_order_path")]
    pub path: String,
    /// Lifetime of each bearer token.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Timeout for one upstream call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_order_path(),
            token_ttl_secs: default_token_ttl_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_UPSTREAM_BASE_URL).expect("valid default upstream url")
}

fn default_order_path() -> String {
    DEFAULT_ORDER_PATH.to_string()
}

fn default_token_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_UPSTREAM_TIMEOUT.as_secs()
}

/// API key section. The CLI and environment take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    pub api_key_id: Option<String>,
    pub api_key_secret: Option<String>,
}
