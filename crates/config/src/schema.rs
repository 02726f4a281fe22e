//! Config schema types (server, store, cors).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardlineConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub cors: CorsConfig,
}

/// Gateway server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on. Defaults to 5000.
    pub port: u16,
    /// Largest accepted request body, in bytes. Defaults to 2 MiB.
    pub max_body_bytes: usize,
}

/// Default request body limit (2 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 5000,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Remote FHIR resource store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// FHIR base URL, e.g. `http://127.0.0.1:8080/fhir`.
    pub base_url: String,
    /// Collection that receives forwarded payload records.
    pub collection: String,
    /// Upper bound for a single store write, in seconds.
    pub timeout_secs: u64,
    /// Skip TLS certificate verification (self-signed lab stores only).
    pub accept_invalid_certs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/fhir".into(),
            collection: "Communication".into(),
            timeout_secs: 5,
            accept_invalid_certs: false,
            user_agent: None,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `<base_url>/<resource_type>`, tolerating a trailing slash on the base.
    pub fn resource_url(&self, resource_type: &str) -> String {
        format!("{}/{resource_type}", self.base_url.trim_end_matches('/'))
    }
}

/// Cross-origin policy for the inbound API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty or `["*"]` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_store() {
        let cfg = WardlineConfig::default();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.store.base_url, "http://127.0.0.1:8080/fhir");
        assert_eq!(cfg.store.collection, "Communication");
        assert_eq!(cfg.store.timeout(), Duration::from_secs(5));
        assert!(cfg.cors.allows_any());
    }

    #[test]
    fn resource_url_trims_trailing_slash() {
        let store = StoreConfig {
            base_url: "https://fhir.example.org/r4/".into(),
            ..StoreConfig::default()
        };
        assert_eq!(
            store.resource_url("Practitioner"),
            "https://fhir.example.org/r4/Practitioner"
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: WardlineConfig = toml::from_str("[store]\ntimeout_secs = 2\n").unwrap();
        assert_eq!(cfg.store.timeout_secs, 2);
        assert_eq!(cfg.store.collection, "Communication");
        assert_eq!(cfg.server, ServerConfig::default());
    }

    #[test]
    fn explicit_origins_disable_any() {
        let cors = CorsConfig {
            allowed_origins: vec!["https://ward.example.org".into()],
        };
        assert!(!cors.allows_any());
    }
}
