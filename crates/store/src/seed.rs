//! Bulk-load a fresh store with sample practitioners and a bootstrap chat.
//!
//! Practitioners are created without an `id` so the store assigns one; the
//! plan refers to them by logical id and the bootstrap message is rewritten
//! to the store ids before it is written.

use std::collections::BTreeMap;

use {
    bytes::Bytes,
    chrono::{DateTime, FixedOffset, Local, SubsecRound},
    serde_json::json,
    tracing::{info, warn},
    wardline_bundle::{
        CodeableConcept, Identifier, PayloadContent, PayloadRecord, Reference, TypedResource,
    },
};

use crate::{Error, ResourceStore, Result};

/// Identifier system that ties a message to its chat.
pub const CHAT_IDENTIFIER_SYSTEM: &str = "urn:system:chat-id";

const PRACTITIONER: &str = "Practitioner";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPractitioner {
    pub logical_id: String,
    pub family: String,
    pub given: String,
}

impl SeedPractitioner {
    pub fn new(
        logical_id: impl Into<String>,
        family: impl Into<String>,
        given: impl Into<String>,
    ) -> Self {
        Self {
            logical_id: logical_id.into(),
            family: family.into(),
            given: given.into(),
        }
    }

    /// Wire form, without `id`.
    fn to_resource(&self) -> serde_json::Value {
        json!({
            "resourceType": PRACTITIONER,
            "active": true,
            "name": [{"family": self.family, "given": [self.given]}]
        })
    }
}

/// What to seed. Sender and recipients are logical practitioner ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub practitioners: Vec<SeedPractitioner>,
    pub chat_id: String,
    pub sender: String,
    pub recipients: Vec<String>,
    /// Defaults to `Chat '<chat_id>' started.`
    pub message: Option<String>,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            practitioners: vec![
                SeedPractitioner::new("1", "Rossi", "Mario"),
                SeedPractitioner::new("2", "Bianchi", "Giulia"),
                SeedPractitioner::new("3", "Gialli", "Anna"),
            ],
            chat_id: "chat1".into(),
            sender: "1".into(),
            recipients: vec!["1".into()],
            message: None,
        }
    }
}

impl SeedPlan {
    pub fn message_text(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("Chat '{}' started.", self.chat_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    /// Logical id → store-assigned id, for every practitioner created.
    pub practitioners: BTreeMap<String, String>,
    pub chat_id: String,
    pub communication_id: String,
}

/// Run `plan` against `store`, writing the bootstrap message to `collection`.
///
/// Practitioners that fail to create are logged and skipped. The run fails
/// when none were created, or when the message refers to one that was not.
pub async fn run_seed(
    store: &dyn ResourceStore,
    collection: &str,
    plan: &SeedPlan,
) -> Result<SeedReport> {
    let mut ids = BTreeMap::new();
    for practitioner in &plan.practitioners {
        let body = Bytes::from(serde_json::to_vec(&practitioner.to_resource())?);
        match store.create(PRACTITIONER, body).await {
            Ok(store_id) => {
                info!(
                    logical_id = %practitioner.logical_id,
                    %store_id,
                    family = %practitioner.family,
                    "practitioner created"
                );
                ids.insert(practitioner.logical_id.clone(), store_id);
            },
            Err(err) => warn!(
                logical_id = %practitioner.logical_id,
                error = %err,
                "failed to create practitioner, skipping"
            ),
        }
    }

    if ids.is_empty() {
        return Err(Error::message(
            "no practitioner was created; cannot seed the bootstrap message",
        ));
    }

    let sent = Local::now().fixed_offset().trunc_subsecs(0);
    let record = bootstrap_message(plan, &ids, sent)?;
    let body = Bytes::from(serde_json::to_vec(&TypedResource::Communication(record))?);
    let communication_id = store.create(collection, body).await?;
    info!(chat_id = %plan.chat_id, %communication_id, "bootstrap message created");

    Ok(SeedReport {
        practitioners: ids,
        chat_id: plan.chat_id.clone(),
        communication_id,
    })
}

fn bootstrap_message(
    plan: &SeedPlan,
    ids: &BTreeMap<String, String>,
    sent: DateTime<FixedOffset>,
) -> Result<PayloadRecord> {
    let reference = |logical_id: &str| {
        ids.get(logical_id)
            .map(|store_id| Reference::to(format!("{PRACTITIONER}/{store_id}")))
            .ok_or_else(|| {
                Error::message(format!(
                    "practitioner with logical id '{logical_id}' was not created"
                ))
            })
    };

    Ok(PayloadRecord {
        identifier: vec![Identifier {
            system: Some(CHAT_IDENTIFIER_SYSTEM.into()),
            value: Some(plan.chat_id.clone()),
        }],
        status: Some("completed".into()),
        sent: Some(sent),
        sender: Some(reference(&plan.sender)?),
        recipient: plan
            .recipients
            .iter()
            .map(|id| reference(id))
            .collect::<Result<_>>()?,
        payload: vec![PayloadContent::text(plan.message_text())],
        topic: Some(CodeableConcept {
            text: Some(format!("Chat ID: {}", plan.chat_id)),
        }),
        ..PayloadRecord::default()
    })
}
