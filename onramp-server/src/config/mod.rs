//! Configuration module for onramp-server.
//!
//! Handles loading configuration from an optional TOML file, CLI arguments
//! and environment variables, and builds the order relay from it.

pub mod file;

use crate::config::file::FileConfig;
use onramp_core::relay::{OrderRelay, RelayError, UpstreamEndpoint};
use onramp_sdk::jwt::{CdpKeySigner, TokenError};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("invalid API key: {0}")]
    InvalidKey(#[from] TokenError),

    #[error("failed to build upstream client: {0}")]
    HttpClient(#[from] RelayError),
}

/// Values given on the command line or through the environment.
///
/// These take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub listen: Option<SocketAddr>,
    pub port: Option<u16>,
    pub api_key_id: Option<String>,
    pub api_key_secret: Option<String>,
}

/// Loaded configuration result.
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub relay: OrderRelay,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    overrides: CliOverrides,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: Option<impl AsRef<Path>>, overrides: CliOverrides) -> Self {
        Self {
            config_path: config_path.map(|p| p.as_ref().to_path_buf()),
            overrides,
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, if one was given
    /// 2. Apply CLI and environment overrides
    /// 3. Validate the configuration
    /// 4. Load the API key and build the order relay
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = match &self.config_path {
            Some(path) => {
                let config_content = std::fs::read_to_string(path)?;
                toml::from_str(&config_content)?
            }
            None => FileConfig::default(),
        };

        self.apply_overrides(&mut file_config);
        self.validate(&file_config)?;

        let key_id = non_empty(file_config.credentials.api_key_id.take())
            .ok_or(ConfigError::MissingCredential("CDP_API_KEY_ID"))?;
        let secret = non_empty(file_config.credentials.api_key_secret.take())
            .ok_or(ConfigError::MissingCredential("CDP_API_KEY_SECRET"))?;
        let signer = CdpKeySigner::new(key_id, &secret)?;
        tracing::info!(
            key_id = signer.key_id(),
            algorithm = signer.algorithm(),
            "API key loaded"
        );

        let upstream = file_config.upstream;
        let relay = OrderRelay::new(
            Arc::new(signer),
            UpstreamEndpoint::new(upstream.base_url, upstream.path),
        )?
        .with_token_ttl(upstream.token_ttl_secs)
        .with_timeout(Duration::from_secs(upstream.timeout_secs))?;

        Ok(LoadedConfig {
            listen: file_config.server.listen,
            relay,
        })
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn apply_overrides(&self, config: &mut FileConfig) {
        if let Some(listen) = self.overrides.listen {
            config.server.listen = listen;
        } else if let Some(port) = self.overrides.port {
            config.server.listen.set_port(port);
        }
        if let Some(id) = &self.overrides.api_key_id {
            config.credentials.api_key_id = Some(id.clone());
        }
        if let Some(secret) = &self.overrides.api_key_secret {
            config.credentials.api_key_secret = Some(secret.clone());
        }
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let upstream = &config.upstream;
        if !matches!(upstream.base_url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "upstream base_url must be http or https, got {}",
                upstream.base_url
            )));
        }
        if upstream.base_url.host_str().is_none() {
            return Err(ConfigError::ValidationError(
                "upstream base_url has no host".to_string(),
            ));
        }
        if !upstream.path.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "upstream path must start with '/', got {}",
                upstream.path
            )));
        }
        if upstream.token_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "upstream token_ttl_secs must be positive".to_string(),
            ));
        }
        if upstream.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "upstream timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
