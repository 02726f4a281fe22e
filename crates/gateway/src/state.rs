use std::sync::Arc;

use {wardline_config::DEFAULT_MAX_BODY_BYTES, wardline_store::Forwarder};

/// Shared per-process state handed to every handler.
///
/// Holds no mutable data; each request is handled independently.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub version: &'static str,
    /// Request bodies above this size are refused with 413.
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(forwarder: Forwarder) -> Self {
        Self {
            forwarder: Arc::new(forwarder),
            version: env!("CARGO_PKG_VERSION"),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    #[must_use]
    pub fn with_body_limit(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
