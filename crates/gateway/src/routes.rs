use {
    axum::{
        Json,
        extract::{State, rejection::BytesRejection},
        http::StatusCode,
        response::IntoResponse,
    },
    bytes::Bytes,
    serde::Serialize,
    tracing::{debug, info},
    wardline_bundle::{Envelope, extract},
};

use crate::{error::ApiError, state::AppState};

/// Inbound route for message bundles.
pub const PROCESS_MESSAGE_PATH: &str = "/fhir/process-chat-message";

#[derive(Debug, Serialize)]
pub struct ProcessedMessage {
    pub status: &'static str,
    pub communication_id: String,
    pub recipients: Vec<String>,
}

pub async fn root_handler() -> &'static str {
    "wardline gateway is running"
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "collection": state.forwarder.collection(),
    }))
}

/// Validate a message bundle, store its payload record and report the
/// intended recipients.
///
/// The body is taken as raw bytes so that malformed JSON is reported as a
/// bundle error; oversized or unreadable bodies still get a JSON error.
pub async fn process_message_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<ProcessedMessage>), ApiError> {
    let body = body?;
    let envelope = Envelope::from_slice(&body)?;
    let request = extract(&envelope)?;

    let sender = request.sender().unwrap_or("unspecified");
    info!(
        sender,
        recipients = request.recipients().len(),
        entries = envelope.entries.len(),
        "message bundle accepted"
    );
    for diagnostic in &request.diagnostics {
        debug!(?diagnostic, "bundle entry diagnostic");
    }

    let outcome = state.forwarder.forward(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProcessedMessage {
            status: "message stored",
            communication_id: outcome.store_id,
            recipients: outcome.recipients,
        }),
    ))
}
