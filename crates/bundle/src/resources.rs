//! FHIR resource shapes the extractor understands.
//!
//! Only the fields that routing and persistence care about are modelled.
//! Unknown fields in inbound records are ignored on parse; the verbatim record
//! is what gets forwarded, so nothing is lost on the way to the store.

use {
    chrono::{DateTime, FixedOffset},
    serde::{Deserialize, Serialize},
};

pub const MESSAGE_HEADER: &str = "MessageHeader";
pub const COMMUNICATION: &str = "Communication";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn to(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            display: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Transport-level routing metadata, carried as a FHIR `MessageHeader`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination: Vec<Destination>,
}

impl RoutingHeader {
    pub fn sender_reference(&self) -> Option<&str> {
        self.sender.as_ref()?.reference.as_deref()
    }

    /// Destination target references in declaration order.
    ///
    /// Destinations without a target reference (endpoint-only) are dropped.
    pub fn destinations(&self) -> Vec<String> {
        self.destination
            .iter()
            .filter_map(|dest| dest.target.as_ref()?.reference.clone())
            .collect()
    }
}

/// One fragment of communicated content. Exactly one `content[x]` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_attachment: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_reference: Option<Reference>,
}

impl PayloadContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_string: Some(text.into()),
            ..Self::default()
        }
    }

    fn variant_count(&self) -> usize {
        usize::from(self.content_string.is_some())
            + usize::from(self.content_attachment.is_some())
            + usize::from(self.content_reference.is_some())
    }
}

/// The communicated content, carried as a FHIR `Communication`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipient: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<PayloadContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<CodeableConcept>,
}

impl PayloadRecord {
    pub fn sender_reference(&self) -> Option<&str> {
        self.sender.as_ref()?.reference.as_deref()
    }

    pub fn recipients(&self) -> Vec<&str> {
        self.recipient
            .iter()
            .filter_map(|r| r.reference.as_deref())
            .collect()
    }

    /// Text fragments (`contentString`) in order.
    pub fn texts(&self) -> Vec<&str> {
        self.payload
            .iter()
            .filter_map(|p| p.content_string.as_deref())
            .collect()
    }

    /// Structural checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), String> {
        for (i, content) in self.payload.iter().enumerate() {
            match content.variant_count() {
                1 => {},
                0 => return Err(format!("payload[{i}] has no content[x] value")),
                n => return Err(format!("payload[{i}] has {n} content[x] values, expected one")),
            }
        }
        Ok(())
    }
}
