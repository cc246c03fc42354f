//! Connection settings and the memoized client built from them.
//!
//! # Design
//! `ClientCache` keeps one client and the hash of the config it was built
//! from. Asking for a client with an equal config returns the same `Arc`;
//! any change to base URL, headers or the debug flag rebuilds it.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Deserialize;

use crate::client::HttpClient;
use crate::error::ConfigError;

/// Parameters for building an [`HttpClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub debug: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Read `REQ_BASE_URL`, `REQ_DEBUG` and `REQ_HEADERS` (comma-separated
    /// `name:value` pairs).
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("REQ_BASE_URL").unwrap_or_default();
        let debug = std::env::var("REQ_DEBUG")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let headers = match std::env::var("REQ_HEADERS") {
            Ok(raw) => parse_headers(&raw)?,
            Err(_) => BTreeMap::new(),
        };
        let config = Self {
            base_url,
            headers,
            debug,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidScheme(url.to_string()));
        }
        Ok(())
    }

    /// Identity used to decide whether a cached client is still valid.
    pub fn identity(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn parse_headers(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut headers = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = pair
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidHeader(pair.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::InvalidHeader(pair.to_string()));
        }
        headers.insert(name.to_string(), value.trim().to_string());
    }
    Ok(headers)
}

/// Holds the most recently built client, keyed by config identity.
#[derive(Default)]
pub struct ClientCache {
    entry: Option<(u64, Arc<HttpClient>)>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached client if `config` matches the one it was built from,
    /// otherwise a freshly built client that replaces it.
    pub fn client_for(&mut self, config: &ClientConfig) -> Result<Arc<HttpClient>, ConfigError> {
        let identity = config.identity();
        if let Some((cached, client)) = &self.entry {
            if *cached == identity {
                return Ok(Arc::clone(client));
            }
        }
        let client = Arc::new(HttpClient::new(config.clone())?);
        tracing::debug!(base_url = %config.base_url, "built request client");
        self.entry = Some((identity, Arc::clone(&client)));
        Ok(client)
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
