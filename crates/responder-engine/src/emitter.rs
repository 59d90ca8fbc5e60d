//! Fire-and-forget event publishing
//!
//! Publishing never blocks the consumer path and never fails it: the send
//! is handed to the runtime and a completion observer logs the outcome.

use std::io::Write;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use responder_core::errors::{CoreError, CoreErrorKind};
use responder_core::Message;
use serde::Serialize;
use thiserror::Error;
use tokio::runtime::Handle;

/// An outbound record addressed to a destination topic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundRecord {
    pub destination: String,
    /// Partition key
    pub key: String,
    pub message: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("serialization failure: {0}")]
    Serialization(String),
}

impl From<PublishError> for CoreError {
    fn from(err: PublishError) -> Self {
        CoreError::new(CoreErrorKind::Publish)
            .with_op("publish")
            .with_message(err.to_string())
    }
}

/// Asynchronous submission to the bus
pub trait EventPublisher: Send + Sync {
    /// Submit a record; the returned future resolves on broker confirmation
    fn send(&self, record: OutboundRecord) -> BoxFuture<'static, Result<(), PublishError>>;
}

/// Builds outbound records and submits them without waiting
#[derive(Clone)]
pub struct EventEmitter {
    publisher: Arc<dyn EventPublisher>,
    runtime: Handle,
}

impl EventEmitter {
    pub fn new(publisher: Arc<dyn EventPublisher>, runtime: Handle) -> Self {
        Self { publisher, runtime }
    }

    /// Serialize `message` and submit it to `destination` under `key`
    ///
    /// Returns as soon as the send is submitted. Failures, including a
    /// message that cannot be serialized, are logged and dropped.
    pub fn publish<T: Serialize>(&self, destination: &str, key: &str, message: &Message<T>) {
        let payload = match serde_json::to_value(message) {
            Ok(payload) => payload,
            Err(err) => {
                let err = PublishError::Serialization(err.to_string());
                tracing::error!(
                    message_type = %message.message_type,
                    key,
                    error = %err,
                    "error serializing outbound message"
                );
                return;
            }
        };

        let pending = self.publisher.send(OutboundRecord {
            destination: destination.to_string(),
            key: key.to_string(),
            message: payload,
        });

        let message_type = message.message_type.clone();
        let key = key.to_string();
        self.runtime.spawn(async move {
            match pending.await {
                Ok(()) => tracing::debug!(%message_type, %key, "sent message"),
                Err(err) => {
                    let err: CoreError = err.into();
                    tracing::error!(
                        %message_type,
                        %key,
                        err.code = err.code(),
                        error = %err,
                        "error sending message"
                    );
                }
            }
        });
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter").finish_non_exhaustive()
    }
}

/// Publisher that writes each record as one JSON line
///
/// Used by the CLI to surface outbound events on stdout.
pub struct JsonLinesPublisher<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn write_line(&self, record: &OutboundRecord) -> Result<(), PublishError> {
        let line = serde_json::to_string(record)
            .map_err(|e| PublishError::Serialization(e.to_string()))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| PublishError::Transport("writer lock poisoned".to_string()))?;
        writeln!(writer, "{}", line)
            .and_then(|()| writer.flush())
            .map_err(|e| PublishError::Transport(e.to_string()))
    }
}

impl<W: Write + Send> EventPublisher for JsonLinesPublisher<W> {
    fn send(&self, record: OutboundRecord) -> BoxFuture<'static, Result<(), PublishError>> {
        let result = self.write_line(&record);
        Box::pin(futures::future::ready(result))
    }
}
