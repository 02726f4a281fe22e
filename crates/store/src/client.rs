//! Create-resource contract against a FHIR store.

use {
    async_trait::async_trait,
    bytes::Bytes,
    reqwest::{Client, StatusCode},
    serde_json::Value,
    tracing::{debug, warn},
    wardline_config::StoreConfig,
};

use crate::{Error, Result};

/// Content type for every store write.
pub const FHIR_JSON: &str = "application/fhir+json";

/// A store that creates resources from their wire bytes.
///
/// Implementations must not re-encode `body`; what was validated is what gets
/// persisted.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Create a resource in the `resource_type` collection and return the
    /// store-assigned id.
    async fn create(&self, resource_type: &str, body: Bytes) -> Result<String>;
}

/// [`ResourceStore`] over the FHIR REST `create` interaction.
pub struct HttpResourceStore {
    client: Client,
    config: StoreConfig,
}

impl HttpResourceStore {
    /// Build a client with the configured timeout, TLS policy and user agent.
    pub fn new(config: StoreConfig) -> Result<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("wardline/{}", env!("CARGO_PKG_VERSION")));
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(user_agent)
            .build()
            .map_err(|source| Error::external("failed to build store HTTP client", source))?;
        if config.accept_invalid_certs {
            warn!(base_url = %config.base_url, "TLS certificate verification disabled for store");
        }
        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait]
impl ResourceStore for HttpResourceStore {
    async fn create(&self, resource_type: &str, body: Bytes) -> Result<String> {
        let url = self.config.resource_url(resource_type);
        debug!(%url, bytes = body.len(), "creating resource");

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", FHIR_JSON)
            .header("Accept", FHIR_JSON)
            .header("Prefer", "return=representation")
            .body(body)
            .send()
            .await
            .map_err(|source| Error::unreachable(url.as_str(), source))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|source| Error::unreachable(url.as_str(), source))?;

        if status != StatusCode::CREATED {
            return Err(Error::StoreRejected {
                status: status.as_u16(),
                body: text,
            });
        }
        created_id(&text)
    }
}

/// Pull the store-assigned `id` out of a `201 Created` body.
fn created_id(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::malformed_response(format!("created body is not JSON: {e}")))?;
    match value.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(Error::malformed_response("created body carries no id")),
    }
}
