use std::sync::Arc;

use {
    tracing::{info, warn},
    wardline_bundle::RoutingRequest,
    wardline_config::StoreConfig,
};

use crate::{Error, HttpResourceStore, ResourceStore, Result};

/// Result of a successful forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardOutcome {
    /// Identifier assigned by the store.
    pub store_id: String,
    /// Header destinations, for the caller's response only.
    pub recipients: Vec<String>,
}

/// Writes extracted payload records to the resource store, exactly once per
/// call. No retries; the caller owns retry policy.
#[derive(Clone)]
pub struct Forwarder {
    store: Arc<dyn ResourceStore>,
    collection: String,
}

impl Forwarder {
    pub fn new(store: Arc<dyn ResourceStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Forwarder backed by an [`HttpResourceStore`] built from `config`.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let store = HttpResourceStore::new(config.clone())?;
        Ok(Self::new(Arc::new(store), config.collection.clone()))
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn forward(&self, request: &RoutingRequest) -> Result<ForwardOutcome> {
        let result = self
            .store
            .create(&self.collection, request.payload_wire.clone())
            .await;

        match result {
            Ok(store_id) => {
                info!(
                    %store_id,
                    collection = %self.collection,
                    sender = request.sender().unwrap_or("unspecified"),
                    "payload record stored"
                );
                Ok(ForwardOutcome {
                    store_id,
                    recipients: request.recipients(),
                })
            },
            Err(err) => {
                match &err {
                    Error::StoreRejected { status, body } => {
                        warn!(status, %body, collection = %self.collection, "store rejected payload record");
                    },
                    other => warn!(error = %other, collection = %self.collection, "payload record not stored"),
                }
                Err(err)
            },
        }
    }
}
