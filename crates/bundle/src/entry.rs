//! Bundle entry resources in their two encodings.
//!
//! Producers either hand over an already-typed resource ([`TypedEntry`]) or a
//! raw JSON record ([`RawRecordEntry`]). The extractor only talks to the
//! [`ResourceEntry`] capability so it never branches on the encoding.

use std::fmt;

use {
    bytes::Bytes,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value, value::RawValue},
};

use crate::resources::{COMMUNICATION, MESSAGE_HEADER, PayloadRecord, RoutingHeader};

/// Routing role an entry plays inside a message bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    RoutingHeader,
    PayloadRecord,
    Unknown(String),
}

impl ResourceKind {
    pub fn from_resource_type(name: &str) -> Self {
        match name {
            MESSAGE_HEADER => Self::RoutingHeader,
            COMMUNICATION => Self::PayloadRecord,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// FHIR resource type name for this kind.
    pub fn resource_type(&self) -> &str {
        match self {
            Self::RoutingHeader => MESSAGE_HEADER,
            Self::PayloadRecord => COMMUNICATION,
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_type())
    }
}

/// Capability shared by every entry encoding.
pub trait ResourceEntry {
    /// Routing role of this entry, or `None` when it carries no recognisable
    /// discriminator at all.
    fn discriminator(&self) -> Option<ResourceKind>;

    /// JSON wire form of the resource.
    fn wire_form(&self) -> serde_json::Result<Bytes>;

    /// The already-constructed resource, when the entry holds one.
    fn resolved(&self) -> Option<&TypedResource> {
        None
    }
}

/// A resource that was parsed before it reached the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum TypedResource {
    MessageHeader(RoutingHeader),
    Communication(PayloadRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedEntry(pub TypedResource);

impl ResourceEntry for TypedEntry {
    fn discriminator(&self) -> Option<ResourceKind> {
        Some(match self.0 {
            TypedResource::MessageHeader(_) => ResourceKind::RoutingHeader,
            TypedResource::Communication(_) => ResourceKind::PayloadRecord,
        })
    }

    fn wire_form(&self) -> serde_json::Result<Bytes> {
        serde_json::to_vec(&self.0).map(Bytes::from)
    }

    fn resolved(&self) -> Option<&TypedResource> {
        Some(&self.0)
    }
}

/// An untyped JSON record, kept byte-for-byte as received.
#[derive(Debug, Clone)]
pub struct RawRecordEntry {
    raw: Box<RawValue>,
}

/// Fields read as the discriminator of a raw record, in order of preference.
const DISCRIMINATOR_FIELDS: [&str; 2] = ["resourceType", "resourceKind"];

impl RawRecordEntry {
    pub fn new(raw: Box<RawValue>) -> Self {
        Self { raw }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        RawValue::from_string(json.to_string()).map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        self.raw.get()
    }
}

impl PartialEq for RawRecordEntry {
    fn eq(&self, other: &Self) -> bool {
        self.raw.get() == other.raw.get()
    }
}

impl ResourceEntry for RawRecordEntry {
    fn discriminator(&self) -> Option<ResourceKind> {
        // Only objects are records; the first string-valued field wins.
        let record: Map<String, Value> = serde_json::from_str(self.raw.get()).ok()?;
        DISCRIMINATOR_FIELDS
            .iter()
            .find_map(|field| record.get(*field)?.as_str())
            .map(ResourceKind::from_resource_type)
    }

    fn wire_form(&self) -> serde_json::Result<Bytes> {
        Ok(Bytes::copy_from_slice(self.raw.get().as_bytes()))
    }
}

/// A bundle entry resource in either encoding.
///
/// Deserializing from JSON always yields [`Entry::Raw`]; [`Entry::Typed`] is
/// for callers that build bundles in code.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Typed(TypedEntry),
    Raw(RawRecordEntry),
}

impl Entry {
    pub fn typed(resource: TypedResource) -> Self {
        Self::Typed(TypedEntry(resource))
    }

    fn inner(&self) -> &dyn ResourceEntry {
        match self {
            Self::Typed(entry) => entry,
            Self::Raw(entry) => entry,
        }
    }
}

impl ResourceEntry for Entry {
    fn discriminator(&self) -> Option<ResourceKind> {
        self.inner().discriminator()
    }

    fn wire_form(&self) -> serde_json::Result<Bytes> {
        self.inner().wire_form()
    }

    fn resolved(&self) -> Option<&TypedResource> {
        self.inner().resolved()
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Box::<RawValue>::deserialize(deserializer).map(|raw| Self::Raw(RawRecordEntry::new(raw)))
    }
}

impl Serialize for Entry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Typed(TypedEntry(resource)) => resource.serialize(serializer),
            Self::Raw(raw) => raw.raw.serialize(serializer),
        }
    }
}
