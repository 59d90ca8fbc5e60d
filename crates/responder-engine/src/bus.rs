//! Transport-side view of the message bus
//!
//! Only what the listeners need: an inbound record with its headers, an
//! acknowledgment handle, and the handler seam the listener container
//! drives.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use responder_core::ResponderError;

/// A raw transport header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Bytes(Vec<u8>),
    Text(String),
    Int(i64),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Bytes(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            HeaderValue::Text(text) => write!(f, "{}", text),
            HeaderValue::Int(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Bytes(value.as_bytes().to_vec())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Bytes(value.into_bytes())
    }
}

/// Ordered transport headers of one record
///
/// Keys may repeat; lookups return the last value, as Kafka clients do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportHeaders(Vec<(String, HeaderValue)>);

impl TransportHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<HeaderValue>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.0.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for TransportHeaders {
    fn from(map: HashMap<String, String>) -> Self {
        let mut entries: Vec<_> = map
            .into_iter()
            .map(|(k, v)| (k, HeaderValue::Text(v)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self(entries)
    }
}

/// One record as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub headers: TransportHeaders,
    pub payload: String,
}

impl ConsumerRecord {
    pub fn new(topic: impl Into<String>, partition: i32, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset: 0,
            headers: TransportHeaders::new(),
            payload: payload.into(),
        }
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_headers(mut self, headers: TransportHeaders) -> Self {
        self.headers = headers;
        self
    }
}

/// Manual acknowledgment of one delivered record
///
/// A record that is never acknowledged is considered unprocessed and is
/// eligible for redelivery.
pub trait Acknowledgment: Send + Sync {
    fn acknowledge(&self);
}

/// Something that processes delivered records
pub trait RecordHandler: Send + Sync {
    /// Handle one record, acknowledging it when processing is complete
    ///
    /// # Errors
    ///
    /// Returns an error for a processing failure the transport should
    /// retry; the record is then left unacknowledged.
    fn on_record(
        &self,
        record: &ConsumerRecord,
        ack: &dyn Acknowledgment,
    ) -> Result<(), ResponderError>;
}

/// Routes records to a handler by topic
///
/// Records on a topic with no handler are acknowledged and dropped.
#[derive(Default, Clone)]
pub struct TopicRouter {
    routes: HashMap<String, Arc<dyn RecordHandler>>,
}

impl TopicRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, topic: impl Into<String>, handler: Arc<dyn RecordHandler>) -> Self {
        self.routes.insert(topic.into(), handler);
        self
    }
}

impl RecordHandler for TopicRouter {
    fn on_record(
        &self,
        record: &ConsumerRecord,
        ack: &dyn Acknowledgment,
    ) -> Result<(), ResponderError> {
        match self.routes.get(&record.topic) {
            Some(handler) => handler.on_record(record, ack),
            None => {
                tracing::warn!(
                    topic = %record.topic,
                    offset = record.offset,
                    "no listener for topic, record dropped"
                );
                ack.acknowledge();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_headers_decode_as_utf8() {
        let value = HeaderValue::Bytes("incident-1".as_bytes().to_vec());
        assert_eq!(value.to_string(), "incident-1");
        assert_eq!(HeaderValue::Int(7).to_string(), "7");
    }

    #[test]
    fn test_last_header_wins() {
        let headers = TransportHeaders::new().with("k", "a").with("k", "b");
        assert_eq!(headers.get("k").map(ToString::to_string).as_deref(), Some("b"));
        assert!(headers.get("missing").is_none());
    }
}
