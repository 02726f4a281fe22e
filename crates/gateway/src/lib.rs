//! HTTP gateway for wardline.
//!
//! `POST /fhir/process-chat-message` takes a FHIR message bundle, extracts its
//! routing header and payload record, forwards the record to the configured
//! store and answers with the store-assigned id and the intended recipients.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use {
    error::ApiError,
    server::{build_app, start_gateway},
    state::AppState,
};
