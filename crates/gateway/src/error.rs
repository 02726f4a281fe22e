use {
    axum::{
        Json,
        extract::rejection::BytesRejection,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde_json::{Value, json},
    tracing::{error, warn},
    wardline_bundle::Error as BundleError,
    wardline_store::Error as StoreError,
};

/// Every failure a request can end in. Converted to a JSON error body in one
/// place so handlers just use `?`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body could not be buffered (too large, aborted upload).
    #[error(transparent)]
    Body(#[from] BytesRejection),
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Body(rejection) => rejection.status(),
            Self::Bundle(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::StoreUnreachable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(StoreError::StoreRejected { status, .. }) => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Body(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "payload_too_large"
            },
            Self::Body(_) => "unreadable_body",
            Self::Bundle(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }

    /// Caller-facing message. Transport failures stay generic; the store
    /// address and cause only go to the log.
    fn public_message(&self) -> String {
        match self {
            Self::Store(StoreError::StoreUnreachable { .. }) => "resource store unreachable".into(),
            other => other.to_string(),
        }
    }

    fn body(&self) -> Value {
        let mut body = json!({
            "error": self.public_message(),
            "kind": self.kind(),
        });
        match self {
            Self::Store(StoreError::StoreRejected { status, body: text }) => {
                body["status_code"] = json!(status);
                body["details"] = json!(text);
            },
            Self::Bundle(BundleError::IncompleteBundle {
                missing,
                diagnostics,
            }) => {
                body["details"] = json!({
                    "missing": missing,
                    "diagnostics": diagnostics,
                });
            },
            Self::Bundle(BundleError::InvalidEnvelopeKind { found }) => {
                body["details"] = json!({ "found": found });
            },
            _ => {},
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(
                kind = self.kind(),
                status = status.as_u16(),
                error = %error_chain(&self),
                "request failed"
            );
        } else {
            warn!(kind = self.kind(), status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

/// `outer: inner: root` rendering of an error and its sources.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
