use std::error::Error as StdError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure: connection refused, timeout, TLS.
    #[error("resource store unreachable at {url}: {source}")]
    StoreUnreachable {
        url: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The store answered with anything other than `201 Created`.
    #[error("resource store rejected the write with HTTP {status}")]
    StoreRejected { status: u16, body: String },

    /// `201 Created` without an extractable `id`.
    #[error("resource store response is malformed: {reason}")]
    MalformedStoreResponse { reason: String },

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn unreachable<E>(url: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::StoreUnreachable {
            url: url.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn malformed_response(reason: impl Into<String>) -> Self {
        Self::MalformedStoreResponse {
            reason: reason.into(),
        }
    }

    /// Machine-readable class name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StoreUnreachable { .. } => "store_unreachable",
            Self::StoreRejected { .. } => "store_rejected",
            Self::MalformedStoreResponse { .. } => "malformed_store_response",
            Self::SerdeJson(_) | Self::Message { .. } | Self::External { .. } => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_keeps_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::unreachable("http://store/Communication", io);
        assert_eq!(err.kind(), "store_unreachable");
        assert!(err.to_string().contains("http://store/Communication"));
        assert_eq!(err.source().unwrap().to_string(), "refused");
    }

    #[test]
    fn rejected_display_omits_body() {
        let err = Error::StoreRejected {
            status: 422,
            body: "{\"issue\":[]}".into(),
        };
        assert_eq!(err.to_string(), "resource store rejected the write with HTTP 422");
        assert_eq!(err.kind(), "store_rejected");
    }
}
