//! Location update listener
//!
//! Location updates bypass the merger: coordinates of a moving responder
//! are written straight to the store with no verdict and no event.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use responder_core::model::decimal::decimal_from_value;
use responder_core::{ResponderError, ResponderId, ResponderPatch, ResponderStore};
use serde_json::Value;

use crate::bus::{Acknowledgment, ConsumerRecord, RecordHandler};
use crate::codec::normalize_payload;

const STATUS_MOVING: &str = "MOVING";

/// Fields of a location message this service consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationUpdate {
    pub responder_id: ResponderId,
    pub latitude: BigDecimal,
    pub longitude: BigDecimal,
    pub status: String,
}

impl LocationUpdate {
    /// Read `responderId`, `lat`, `lon` and `status` from a raw payload
    ///
    /// Returns `None` if any of them is missing or has the wrong shape.
    pub fn parse(payload: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(payload).ok()?;
        let responder_id = match value.get("responderId")? {
            Value::String(text) => text.parse().ok()?,
            Value::Number(number) => ResponderId::new(number.as_i64()?),
            _ => return None,
        };
        Some(Self {
            responder_id,
            latitude: decimal_from_value(value.get("lat")?)?,
            longitude: decimal_from_value(value.get("lon")?)?,
            status: value.get("status")?.as_str()?.to_string(),
        })
    }

    pub fn is_moving(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_MOVING)
    }
}

/// Listener for responder location updates
pub struct LocationIngestor {
    store: Arc<dyn ResponderStore>,
}

impl LocationIngestor {
    pub fn new(store: Arc<dyn ResponderStore>) -> Self {
        Self { store }
    }

    /// Handle one inbound location record
    ///
    /// Malformed updates and other statuses are logged, acknowledged and
    /// dropped, as are updates for unknown responders.
    ///
    /// # Errors
    ///
    /// Returns `Store` when the location write fails. The record is left
    /// unacknowledged so the transport redelivers it.
    pub fn on_location_message(
        &self,
        record: &ConsumerRecord,
        ack: &dyn Acknowledgment,
    ) -> Result<(), ResponderError> {
        let payload = normalize_payload(&record.payload);
        match LocationUpdate::parse(&payload) {
            Some(update) if update.is_moving() => self.apply(update, record)?,
            Some(update) => {
                tracing::debug!(
                    responder_id = %update.responder_id,
                    status = %update.status,
                    "location update ignored for status"
                );
            }
            None => {
                tracing::warn!(payload = %payload, "unexpected message structure");
            }
        }
        ack.acknowledge();
        Ok(())
    }

    fn apply(
        &self,
        update: LocationUpdate,
        record: &ConsumerRecord,
    ) -> Result<(), ResponderError> {
        tracing::debug!(
            responder_id = %update.responder_id,
            topic = %record.topic,
            partition = record.partition,
            "processing responder location update"
        );
        let patch =
            ResponderPatch::location(update.responder_id, update.latitude, update.longitude);
        match self.store.update_location(&patch) {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(responder_id = %patch.id, "location update for unknown responder");
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    responder_id = %patch.id,
                    err.code = err.code(),
                    error = %err,
                    "location update failed"
                );
                Err(ResponderError::Store(err))
            }
        }
    }
}

impl RecordHandler for LocationIngestor {
    fn on_record(
        &self,
        record: &ConsumerRecord,
        ack: &dyn Acknowledgment,
    ) -> Result<(), ResponderError> {
        self.on_location_message(record, ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_string_id_and_numeric_coordinates() {
        let update = LocationUpdate::parse(
            concat!(
                r#"{"responderId":"64","missionId":"m","incidentId":"i","status":"MOVING","#,
                r#""lat":34.1701,"lon":-77.9482,"human":false,"continue":true}"#
            ),
        )
        .unwrap();
        assert_eq!(update.responder_id, ResponderId::new(64));
        assert_eq!(update.latitude.to_string(), "34.1701");
        assert_eq!(update.longitude.to_string(), "-77.9482");
        assert!(update.is_moving());
    }

    #[test]
    fn test_status_is_case_insensitive() {
        let update = LocationUpdate::parse(
            r#"{"responderId":7,"status":"moving","lat":"1.5","lon":"2.5"}"#,
        )
        .unwrap();
        assert!(update.is_moving());
    }

    #[test]
    fn test_parse_rejects_missing_or_mistyped_paths() {
        assert!(LocationUpdate::parse(r#"{"status":"MOVING","lat":1,"lon":2}"#).is_none());
        assert!(LocationUpdate::parse(
            r#"{"responderId":"1","status":"MOVING","lat":"north","lon":2}"#
        )
        .is_none());
        assert!(
            LocationUpdate::parse(r#"{"responderId":"1","status":3,"lat":1,"lon":2}"#).is_none()
        );
        assert!(LocationUpdate::parse("garbage").is_none());
    }
}
