//! Update command listener
//!
//! Filters inbound records by message type, reconciles accepted update
//! commands against the store and, when the command is correlated to an
//! incident, tells the incident's subscribers how it went.

use std::sync::Arc;
use std::time::Instant;

use responder_core::message::probe_message_type;
use responder_core::schema::{
    INVOKING_SERVICE, MESSAGE_RESPONDER_UPDATED_EVENT, MESSAGE_UPDATE_RESPONDER_COMMAND,
};
use responder_core::{
    log_op_end, log_op_error, log_op_start, reconcile, EventStatus, Message, ResponderError,
    ResponderStore, ResponderUpdatedEvent, UpdateResponderCommand, Verdict,
};

use crate::bus::{Acknowledgment, ConsumerRecord, RecordHandler};
use crate::codec::normalize_payload;
use crate::emitter::EventEmitter;
use crate::propagation::TracePropagator;

const OP_PROCESS_COMMAND: &str = "process_update_responder_command";

/// Listener for `UpdateResponderCommand` messages
pub struct CommandDispatcher {
    store: Arc<dyn ResponderStore>,
    emitter: EventEmitter,
    propagator: TracePropagator,
    destination: String,
    accepted: Vec<String>,
}

impl CommandDispatcher {
    /// Create a dispatcher publishing `ResponderUpdatedEvent`s to
    /// `destination`
    pub fn new(
        store: Arc<dyn ResponderStore>,
        emitter: EventEmitter,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            store,
            emitter,
            propagator: TracePropagator::new(),
            destination: destination.into(),
            accepted: vec![MESSAGE_UPDATE_RESPONDER_COMMAND.to_string()],
        }
    }

    /// Handle one inbound record
    ///
    /// Records of other types, or without a readable type, are acknowledged
    /// and dropped. Accepted records are acknowledged once fully processed.
    ///
    /// # Errors
    ///
    /// Returns `MalformedMessage` when an accepted record cannot be decoded
    /// and `Store` when the current record cannot be read. The record is
    /// left unacknowledged in both cases.
    pub fn on_message(
        &self,
        record: &ConsumerRecord,
        ack: &dyn Acknowledgment,
    ) -> Result<(), ResponderError> {
        let payload = normalize_payload(&record.payload);

        match probe_message_type(&payload) {
            Some(message_type) if self.accepted.contains(&message_type) => {}
            Some(message_type) => {
                tracing::debug!(%message_type, topic = %record.topic, "message type ignored");
                ack.acknowledge();
                return Ok(());
            }
            None => {
                tracing::warn!(
                    topic = %record.topic,
                    offset = record.offset,
                    "unexpected message without 'messageType' field"
                );
                ack.acknowledge();
                return Ok(());
            }
        }

        let _span = self
            .propagator
            .child_span(OP_PROCESS_COMMAND, &record.headers);
        let started = Instant::now();
        log_op_start!(OP_PROCESS_COMMAND, topic = %record.topic, partition = record.partition);

        let outcome = self.process(&payload, record);
        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(()) => {
                ack.acknowledge();
                log_op_end!(OP_PROCESS_COMMAND, duration_ms = duration_ms);
                Ok(())
            }
            Err(err) => {
                log_op_error!(
                    OP_PROCESS_COMMAND,
                    &err,
                    duration_ms = duration_ms,
                    payload = %payload
                );
                Err(err)
            }
        }
    }

    fn process(&self, payload: &str, record: &ConsumerRecord) -> Result<(), ResponderError> {
        let message: Message<UpdateResponderCommand> =
            serde_json::from_str(payload).map_err(|e| ResponderError::MalformedMessage {
                reason: e.to_string(),
            })?;
        let patch = &message.body.responder;

        tracing::debug!(
            responder_id = %patch.id,
            topic = %record.topic,
            partition = record.partition,
            "processing update responder command"
        );

        let verdict = reconcile(self.store.as_ref(), patch)?;

        if let Some(correlation_id) = message.correlation_id() {
            let event = updated_event(&verdict, patch.id);
            let outbound = Message::new(MESSAGE_RESPONDER_UPDATED_EVENT, INVOKING_SERVICE, event)
                .with_header(
                    responder_core::schema::HEADER_INCIDENT_ID,
                    correlation_id.as_str(),
                );
            self.emitter
                .publish(&self.destination, &patch.id.to_string(), &outbound);
        }

        Ok(())
    }
}

fn updated_event(
    verdict: &Verdict,
    responder_id: responder_core::ResponderId,
) -> ResponderUpdatedEvent {
    ResponderUpdatedEvent {
        status: EventStatus::from_changed(verdict.changed),
        status_message: verdict.status_message(),
        responder_id,
    }
}

impl RecordHandler for CommandDispatcher {
    fn on_record(
        &self,
        record: &ConsumerRecord,
        ack: &dyn Acknowledgment,
    ) -> Result<(), ResponderError> {
        self.on_message(record, ack)
    }
}
