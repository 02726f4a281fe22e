use {
    bytes::Bytes,
    tracing::{debug, warn},
};

use crate::{
    entry::{ResourceEntry, ResourceKind, TypedResource},
    envelope::{BundleEntry, Envelope},
    error::{EntryDiagnostic, Error, Result},
    resources::{COMMUNICATION, MESSAGE_HEADER, PayloadRecord, RoutingHeader},
};

/// Normalized output of a successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingRequest {
    pub header: RoutingHeader,
    pub payload: PayloadRecord,
    /// The payload entry exactly as validated; forwarded without re-encoding.
    pub payload_wire: Bytes,
    /// Entries skipped, rejected or replaced while scanning.
    pub diagnostics: Vec<EntryDiagnostic>,
}

impl RoutingRequest {
    /// Intended recipients from the routing header. Never reconciled with
    /// the payload's own `recipient` list.
    pub fn recipients(&self) -> Vec<String> {
        self.header.destinations()
    }

    pub fn sender(&self) -> Option<&str> {
        self.header.sender_reference()
    }
}

/// Validate a message bundle and pull out its routing header and payload.
pub fn extract(envelope: &Envelope) -> Result<RoutingRequest> {
    if !envelope.is_message() {
        return Err(Error::InvalidEnvelopeKind {
            found: envelope.kind.clone(),
        });
    }

    let scan = envelope
        .entries
        .iter()
        .enumerate()
        .fold(Scan::default(), |scan, (index, entry)| {
            scan.visit(index, entry)
        });

    scan.finish()
}

#[derive(Default)]
struct Scan {
    header: Option<(usize, RoutingHeader)>,
    payload: Option<(usize, PayloadRecord, Bytes)>,
    diagnostics: Vec<EntryDiagnostic>,
}

impl Scan {
    fn visit(mut self, index: usize, entry: &BundleEntry) -> Self {
        let Some(resource) = entry.resource.as_ref() else {
            self.skip(index, "entry has no resource");
            return self;
        };

        match resource.discriminator() {
            None => self.skip(index, "resource has no resourceType"),
            Some(ResourceKind::Unknown(name)) => {
                self.skip(index, format!("resource type {name} is not routed"));
            },
            Some(ResourceKind::RoutingHeader) => match build_header(resource) {
                Ok(header) => {
                    if let Some((previous, _)) = self.header.replace((index, header)) {
                        self.replaced(previous, index, ResourceKind::RoutingHeader);
                    }
                },
                Err(reason) => self.malformed(index, ResourceKind::RoutingHeader, reason),
            },
            Some(ResourceKind::PayloadRecord) => match build_payload(resource) {
                Ok((record, wire)) => {
                    if let Some((previous, ..)) = self.payload.replace((index, record, wire)) {
                        self.replaced(previous, index, ResourceKind::PayloadRecord);
                    }
                },
                Err(reason) => self.malformed(index, ResourceKind::PayloadRecord, reason),
            },
        }
        self
    }

    fn skip(&mut self, index: usize, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(entry = index, %reason, "skipping bundle entry");
        self.diagnostics
            .push(EntryDiagnostic::Skipped { index, reason });
    }

    fn malformed(&mut self, index: usize, kind: ResourceKind, reason: String) {
        let err = Error::malformed_entry(index, kind.clone(), &reason);
        warn!(entry = index, error = %err, "ignoring malformed bundle entry");
        self.diagnostics.push(EntryDiagnostic::Malformed {
            index,
            kind,
            reason,
        });
    }

    fn replaced(&mut self, index: usize, replaced_by: usize, kind: ResourceKind) {
        warn!(
            entry = index,
            replaced_by,
            %kind,
            "bundle carries more than one {kind}; keeping the last one"
        );
        self.diagnostics.push(EntryDiagnostic::Replaced {
            index,
            replaced_by,
            kind,
        });
    }

    fn finish(self) -> Result<RoutingRequest> {
        match (self.header, self.payload) {
            (Some((_, header)), Some((_, payload, payload_wire))) => Ok(RoutingRequest {
                header,
                payload,
                payload_wire,
                diagnostics: self.diagnostics,
            }),
            (header, payload) => {
                let mut missing = Vec::new();
                if header.is_none() {
                    missing.push(MESSAGE_HEADER);
                }
                if payload.is_none() {
                    missing.push(COMMUNICATION);
                }
                Err(Error::IncompleteBundle {
                    missing,
                    diagnostics: self.diagnostics,
                })
            },
        }
    }
}

/// Builders report why an entry was rejected; the caller owns its position.
type Built<T> = std::result::Result<T, String>;

fn build_header(entry: &impl ResourceEntry) -> Built<RoutingHeader> {
    if let Some(TypedResource::MessageHeader(header)) = entry.resolved() {
        return Ok(header.clone());
    }
    let wire = entry.wire_form().map_err(|e| e.to_string())?;
    serde_json::from_slice(&wire).map_err(|e| e.to_string())
}

fn build_payload(entry: &impl ResourceEntry) -> Built<(PayloadRecord, Bytes)> {
    let wire = entry.wire_form().map_err(|e| e.to_string())?;
    let record = match entry.resolved() {
        Some(TypedResource::Communication(record)) => record.clone(),
        _ => serde_json::from_slice::<PayloadRecord>(&wire).map_err(|e| e.to_string())?,
    };
    record.validate()?;
    Ok((record, wire))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            entry::Entry,
            resources::{Destination, PayloadContent, Reference},
        },
    };

    fn header_json(sender: &str, to: &str) -> String {
        format!(
            r#"{{"resourceType":"MessageHeader","sender":{{"reference":"{sender}"}},"destination":[{{"target":{{"reference":"{to}"}}}}]}}"#
        )
    }

    fn payload_json(text: &str) -> String {
        format!(
            r#"{{"resourceType":"Communication","sender":{{"reference":"Practitioner/1"}},"recipient":[{{"reference":"Practitioner/2"}}],"payload":[{{"contentString":"{text}"}}]}}"#
        )
    }

    fn bundle(kind: &str, resources: &[String]) -> Envelope {
        let entries = resources
            .iter()
            .map(|r| format!(r#"{{"resource":{r}}}"#))
            .collect::<Vec<_>>()
            .join(",");
        Envelope::from_slice(format!(r#"{{"type":"{kind}","entry":[{entries}]}}"#).as_bytes())
            .unwrap()
    }

    #[test]
    fn rejects_non_message_bundle() {
        let env = bundle("collection", &[
            header_json("Practitioner/1", "Practitioner/2"),
            payload_json("hi"),
        ]);
        let err = extract(&env).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidEnvelopeKind { found: Some(ref k) } if k == "collection"
        ));
    }

    #[test]
    fn rejects_bundle_without_type() {
        let env = Envelope::from_slice(br#"{"entry":[]}"#).unwrap();
        assert!(matches!(
            extract(&env).unwrap_err(),
            Error::InvalidEnvelopeKind { found: None }
        ));
    }

    #[test]
    fn extracts_header_and_payload() {
        let env = bundle("message", &[
            header_json("Practitioner/1", "Practitioner/2"),
            payload_json("hello"),
        ]);
        let req = extract(&env).unwrap();
        assert_eq!(req.sender(), Some("Practitioner/1"));
        assert_eq!(req.recipients(), vec!["Practitioner/2".to_string()]);
        assert_eq!(req.payload.texts(), vec!["hello"]);
        assert_eq!(req.payload_wire, Bytes::from(payload_json("hello")));
        assert!(req.diagnostics.is_empty());
    }

    #[test]
    fn missing_header_is_incomplete() {
        let env = bundle("message", &[payload_json("hello")]);
        match extract(&env).unwrap_err() {
            Error::IncompleteBundle { missing, .. } => assert_eq!(missing, vec!["MessageHeader"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_bundle_misses_both() {
        let env = bundle("message", &[]);
        match extract(&env).unwrap_err() {
            Error::IncompleteBundle { missing, .. } => {
                assert_eq!(missing, vec!["MessageHeader", "Communication"]);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_header_does_not_mask_later_valid_one() {
        let env = bundle("message", &[
            r#"{"resourceType":"MessageHeader","sender":"not-a-reference"}"#.to_string(),
            payload_json("hello"),
            header_json("Practitioner/7", "Practitioner/8"),
        ]);
        let req = extract(&env).unwrap();
        assert_eq!(req.sender(), Some("Practitioner/7"));
        assert!(matches!(
            req.diagnostics.as_slice(),
            [EntryDiagnostic::Malformed { index: 0, kind: ResourceKind::RoutingHeader, .. }]
        ));
    }

    #[test]
    fn malformed_diagnostics_keep_entry_positions() {
        let env = bundle("message", &[
            r#"{"resourceType":"Patient"}"#.to_string(),
            payload_json("hello"),
            r#"{"resourceType":"MessageHeader","destination":"nowhere"}"#.to_string(),
            r#"{"resourceType":"Communication","payload":[{}]}"#.to_string(),
            header_json("Practitioner/1", "Practitioner/2"),
        ]);
        let req = extract(&env).unwrap();
        let malformed: Vec<_> = req
            .diagnostics
            .iter()
            .filter_map(|d| match d {
                EntryDiagnostic::Malformed { index, kind, .. } => Some((*index, kind.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(malformed, vec![
            (2, ResourceKind::RoutingHeader),
            (3, ResourceKind::PayloadRecord),
        ]);
    }

    #[test]
    fn payload_with_non_string_resource_kind_is_still_routed() {
        let env = bundle("message", &[
            header_json("Practitioner/1", "Practitioner/2"),
            r#"{"resourceType":"Communication","resourceKind":7,"payload":[{"contentString":"hi"}]}"#
                .to_string(),
        ]);
        let req = extract(&env).unwrap();
        assert!(req.diagnostics.is_empty());
        assert!(std::str::from_utf8(&req.payload_wire).unwrap().contains(r#""resourceKind":7"#));
    }

    #[test]
    fn only_malformed_payload_is_incomplete_with_diagnostics() {
        let env = bundle("message", &[
            header_json("Practitioner/1", "Practitioner/2"),
            r#"{"resourceType":"Communication","payload":[{}]}"#.to_string(),
        ]);
        match extract(&env).unwrap_err() {
            Error::IncompleteBundle {
                missing,
                diagnostics,
            } => {
                assert_eq!(missing, vec!["Communication"]);
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics[0].index(), 1);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn last_qualifying_entry_wins() {
        let env = bundle("message", &[
            payload_json("first"),
            header_json("Practitioner/1", "Practitioner/2"),
            payload_json("second"),
        ]);
        let req = extract(&env).unwrap();
        assert_eq!(req.payload.texts(), vec!["second"]);
        assert_eq!(req.diagnostics, vec![EntryDiagnostic::Replaced {
            index: 0,
            replaced_by: 2,
            kind: ResourceKind::PayloadRecord,
        }]);
    }

    #[test]
    fn typed_entries_are_used_directly() {
        let header = RoutingHeader {
            sender: Some(Reference::to("Practitioner/1")),
            destination: vec![Destination {
                target: Some(Reference::to("Practitioner/2")),
                ..Destination::default()
            }],
            ..RoutingHeader::default()
        };
        let payload = PayloadRecord {
            status: Some("in-progress".into()),
            payload: vec![PayloadContent::text("typed")],
            ..PayloadRecord::default()
        };
        let env = Envelope::message([
            Entry::typed(TypedResource::Communication(payload.clone())),
            Entry::typed(TypedResource::MessageHeader(header.clone())),
        ]);

        let req = extract(&env).unwrap();
        assert_eq!(req.header, header);
        assert_eq!(req.payload, payload);
        let decoded: PayloadRecord = serde_json::from_slice(&req.payload_wire).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn invalid_typed_payload_is_skipped() {
        let env = Envelope::message([
            Entry::typed(TypedResource::MessageHeader(RoutingHeader::default())),
            Entry::typed(TypedResource::Communication(PayloadRecord {
                payload: vec![PayloadContent::default()],
                ..PayloadRecord::default()
            })),
        ]);
        assert!(matches!(
            extract(&env).unwrap_err(),
            Error::IncompleteBundle { .. }
        ));
    }
}
