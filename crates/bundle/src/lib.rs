//! Message-bundle validation and routing extraction.
//!
//! An inbound FHIR `Bundle` of type `message` is scanned for exactly one
//! routing header (`MessageHeader`) and one payload record (`Communication`).
//! Entries may arrive already typed or as raw JSON records; both are handled
//! through the [`ResourceEntry`] capability. Unknown or malformed entries are
//! skipped and reported as [`EntryDiagnostic`]s; the bundle only fails when a
//! required entry is missing after the whole scan.

pub mod entry;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod resources;

pub use {
    entry::{Entry, RawRecordEntry, ResourceEntry, ResourceKind, TypedEntry, TypedResource},
    envelope::{BundleEntry, Envelope, MESSAGE_BUNDLE_TYPE},
    error::{EntryDiagnostic, Error, Result},
    extract::{RoutingRequest, extract},
    resources::{
        Attachment, CodeableConcept, Destination, Identifier, PayloadContent, PayloadRecord,
        Reference, RoutingHeader,
    },
};
