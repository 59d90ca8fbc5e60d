use std::collections::BTreeMap;

use responder_core_types::{CorrelationId, MessageId};
use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::HEADER_INCIDENT_ID;

/// Generic bus message envelope
///
/// `message_type` is the routing discriminator and is compared
/// case-sensitively. `headers` carries correlation data such as the
/// incident id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message<T> {
    pub message_type: String,
    #[serde(default)]
    pub id: MessageId,
    #[serde(default)]
    pub invoking_service: String,
    /// Epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
    pub body: T,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub headers: BTreeMap<String, String>,
}

impl<T> Message<T> {
    /// Build a fresh envelope stamped with a new id and the current time
    pub fn new(
        message_type: impl Into<String>,
        invoking_service: impl Into<String>,
        body: T,
    ) -> Self {
        Self {
            message_type: message_type.into(),
            id: MessageId::new(),
            invoking_service: invoking_service.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            body,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// The incident correlation id, exactly as received
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.header_value(HEADER_INCIDENT_ID).map(CorrelationId::new)
    }
}

/// Read only the `messageType` discriminator of a JSON payload
///
/// Returns `None` when the payload is not a JSON object or the field is
/// missing or not a string.
pub fn probe_message_type(payload: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    value
        .get("messageType")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}
