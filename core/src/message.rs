//! Wire payload published by the producer and consumed by the emailer.
//!
//! The payload is a JSON object that must carry at least an `id`. Any other
//! field travels opportunistically: consumers re-derive the full content from
//! the [`SubmittedRecord`](crate::SubmittedRecord) and must tolerate their
//! absence. Unknown fields are ignored.

use crate::record::{RecordId, SubmittedRecord};
use serde::{Deserialize, Deserializer, Serialize};

/// Reference to a submitted complaint, as carried on the message bus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplaintMessage {
    /// Record identifier. Accepts JSON strings or numbers.
    #[serde(
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// Submitter-supplied identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,

    /// Contact address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Submitter first name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Complaint subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Complaint body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ComplaintMessage {
    /// Build the minimal message the producer publishes for a new record.
    #[must_use]
    pub fn for_record(record: &SubmittedRecord) -> Self {
        Self {
            id: Some(record.id.to_string()),
            email_id: Some(record.email_id.clone()),
            email: Some(record.email.clone()),
            subject: Some(record.subject.clone()),
            ..Self::default()
        }
    }

    /// The record identifier, if present and non-blank.
    #[must_use]
    pub fn record_id(&self) -> Option<RecordId> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(RecordId::from)
    }

    /// Decode a raw payload.
    ///
    /// A JSON `null` decodes to `Ok(None)` so callers can treat it the same
    /// way as an absent payload.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the bytes are not a valid message.
    pub fn decode(payload: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Encode as JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    #[test]
    fn decodes_full_payload() {
        let payload =
            br#"{"id":"789","email_id":"jane@example.com","subject":"Complaint","body":"..."}"#;
        let message = ComplaintMessage::decode(payload).ok().flatten();
        let Some(message) = message else {
            unreachable!("payload should decode");
        };
        assert_eq!(message.record_id(), Some(RecordId::new("789")));
        assert_eq!(message.email_id.as_deref(), Some("jane@example.com"));
        assert_eq!(message.email, None);
    }

    #[test]
    fn tolerates_missing_and_unknown_fields() {
        let message = ComplaintMessage::decode(br#"{"id":"abc","priority":"high"}"#);
        assert!(matches!(message, Ok(Some(ref m)) if m.subject.is_none()));
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let message = ComplaintMessage::decode(br#"{"id":42}"#).ok().flatten();
        assert_eq!(message.and_then(|m| m.record_id()), Some(RecordId::new("42")));
    }

    #[test]
    fn json_null_decodes_to_none() {
        assert!(matches!(ComplaintMessage::decode(b"null"), Ok(None)));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(ComplaintMessage::decode(b"\xff\xfe not json").is_err());
        assert!(ComplaintMessage::decode(br#""just a string""#).is_err());
    }

    #[test]
    fn blank_id_is_treated_as_absent() {
        let message = ComplaintMessage {
            id: Some("   ".to_string()),
            ..ComplaintMessage::default()
        };
        assert_eq!(message.record_id(), None);
    }

    #[test]
    fn producer_message_omits_body() {
        let record = SubmittedRecord {
            id: RecordId::new("rec-1"),
            email_id: "ticket@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Outage".to_string(),
            body: "Service is down".to_string(),
            attachment: None,
            submitted_at: Utc::now(),
        };

        let encoded = ComplaintMessage::for_record(&record).encode().unwrap_or_default();
        let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap_or_default();

        assert_eq!(value["id"], "rec-1");
        assert_eq!(value["email"], "ada@example.com");
        assert!(value.get("body").is_none());
    }

    proptest! {
        #[test]
        fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = ComplaintMessage::decode(&bytes);
        }

        #[test]
        fn record_id_is_trimmed_and_never_blank(id in "\\PC*") {
            let message = ComplaintMessage { id: Some(id.clone()), ..ComplaintMessage::default() };
            if let Some(record_id) = message.record_id() {
                prop_assert_eq!(record_id.as_str(), id.trim());
            } else {
                prop_assert!(id.trim().is_empty());
            }
        }
    }
}
