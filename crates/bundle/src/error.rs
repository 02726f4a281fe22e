use serde::Serialize;

use crate::entry::ResourceKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bundle is not valid JSON: {source}")]
    MalformedEnvelope {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid bundle type {}: expected \"message\"", .found.as_deref().unwrap_or("<missing>"))]
    InvalidEnvelopeKind { found: Option<String> },

    #[error("incomplete bundle: missing valid {}", .missing.join(" and "))]
    IncompleteBundle {
        missing: Vec<&'static str>,
        diagnostics: Vec<EntryDiagnostic>,
    },

    #[error("entry {index}: malformed {kind}: {reason}")]
    MalformedEntry {
        index: usize,
        kind: ResourceKind,
        reason: String,
    },
}

impl Error {
    #[must_use]
    pub fn malformed_entry(index: usize, kind: ResourceKind, reason: impl ToString) -> Self {
        Self::MalformedEntry {
            index,
            kind,
            reason: reason.to_string(),
        }
    }

    /// Machine-readable class name used in API error bodies.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope { .. } => "malformed_envelope",
            Self::InvalidEnvelopeKind { .. } => "invalid_envelope_kind",
            Self::IncompleteBundle { .. } => "incomplete_bundle",
            Self::MalformedEntry { .. } => "malformed_entry",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Something noteworthy that happened to a single entry during a scan.
///
/// None of these abort extraction on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "diagnostic", rename_all = "snake_case")]
pub enum EntryDiagnostic {
    Skipped {
        index: usize,
        reason: String,
    },
    Malformed {
        index: usize,
        #[serde(serialize_with = "serialize_kind")]
        kind: ResourceKind,
        reason: String,
    },
    /// A later qualifying entry replaced an earlier one (last wins).
    Replaced {
        index: usize,
        replaced_by: usize,
        #[serde(serialize_with = "serialize_kind")]
        kind: ResourceKind,
    },
}

impl EntryDiagnostic {
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Skipped { index, .. }
            | Self::Malformed { index, .. }
            | Self::Replaced { index, .. } => *index,
        }
    }
}

fn serialize_kind<S: serde::Serializer>(
    kind: &ResourceKind,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(kind)
}
