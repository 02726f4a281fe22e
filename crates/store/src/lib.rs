//! Resource-store access for wardline.
//!
//! - [`ResourceStore`]: the create-resource contract, with an HTTP
//!   implementation ([`HttpResourceStore`]) speaking `application/fhir+json`.
//! - [`Forwarder`]: writes an extracted payload record to the store and
//!   classifies the outcome.
//! - [`seed`]: bulk-loads sample practitioners and a bootstrap chat message
//!   into a fresh store.

pub mod client;
pub mod error;
pub mod forward;
pub mod seed;

pub use {
    client::{FHIR_JSON, HttpResourceStore, ResourceStore},
    error::{Error, Result},
    forward::{ForwardOutcome, Forwarder},
    seed::{SeedPlan, SeedPractitioner, SeedReport, run_seed},
};
