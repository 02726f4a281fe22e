use {
    serde::{Deserialize, Serialize},
    serde_json::value::RawValue,
};

use crate::{
    entry::{Entry, RawRecordEntry},
    error::{Error, Result},
};

/// Bundle `type` accepted by the extractor.
pub const MESSAGE_BUNDLE_TYPE: &str = "message";

/// Inbound FHIR `Bundle`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(
        rename = "resourceType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_type: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "entry", default)]
    pub entries: Vec<BundleEntry>,
}

impl Envelope {
    /// Parse a bundle from its JSON body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|source| Error::MalformedEnvelope { source })
    }

    /// Build a `message` bundle from entry resources.
    pub fn message(resources: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            resource_type: Some("Bundle".into()),
            kind: Some(MESSAGE_BUNDLE_TYPE.into()),
            entries: resources.into_iter().map(BundleEntry::new).collect(),
        }
    }

    pub fn is_message(&self) -> bool {
        self.kind.as_deref() == Some(MESSAGE_BUNDLE_TYPE)
    }
}

/// A single slot in `Bundle.entry`.
///
/// Entries that are not objects, or whose `resource` is absent, parse to an
/// entry without a resource instead of failing the whole bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BundleEntry {
    #[serde(rename = "fullUrl", skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Entry>,
}

#[derive(Deserialize)]
struct BundleEntryShape {
    #[serde(rename = "fullUrl", default)]
    full_url: Option<String>,
    #[serde(default)]
    resource: Option<Box<RawValue>>,
}

impl BundleEntry {
    pub fn new(resource: Entry) -> Self {
        Self {
            full_url: None,
            resource: Some(resource),
        }
    }
}

impl<'de> Deserialize<'de> for BundleEntry {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        if !raw.get().trim_start().starts_with('{') {
            return Ok(Self::default());
        }
        let Ok(shape) = serde_json::from_str::<BundleEntryShape>(raw.get()) else {
            return Ok(Self::default());
        };
        Ok(Self {
            full_url: shape.full_url,
            resource: shape.resource.map(|r| Entry::Raw(RawRecordEntry::new(r))),
        })
    }
}
