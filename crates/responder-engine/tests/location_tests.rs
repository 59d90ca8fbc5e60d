//! Location listener: status filtering and direct coordinate updates

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::{Arc, Mutex};

use common::{dec, john_doe, CountingAck};
use responder_core::{
    CoreError, CoreErrorKind, MemoryStore, NewResponder, Responder, ResponderError, ResponderId,
    ResponderPatch, ResponderQuery, ResponderStats, ResponderStore, StoreResult, StoredResponder,
};
use responder_engine::{ConsumerRecord, LocationIngestor, RecordHandler};
use serde_json::json;

const LOCATION_TOPIC: &str = "topic-responder-location-update";

/// Memory store that records every direct location update
#[derive(Default)]
struct SpyStore {
    inner: MemoryStore,
    location_updates: Mutex<Vec<ResponderPatch>>,
    fail_location_updates: bool,
}

impl SpyStore {
    fn location_updates(&self) -> Vec<ResponderPatch> {
        self.location_updates.lock().unwrap().clone()
    }
}

impl ResponderStore for SpyStore {
    fn find_by_id(&self, id: ResponderId) -> StoreResult<Option<StoredResponder>> {
        self.inner.find_by_id(id)
    }

    fn find_by_name(&self, name: &str) -> StoreResult<Option<StoredResponder>> {
        self.inner.find_by_name(name)
    }

    fn list(&self, query: &ResponderQuery) -> StoreResult<Vec<Responder>> {
        self.inner.list(query)
    }

    fn create(&self, responder: &NewResponder) -> StoreResult<StoredResponder> {
        self.inner.create(responder)
    }

    fn merge(&self, candidate: &Responder, expected_version: u64) -> StoreResult<StoredResponder> {
        self.inner.merge(candidate, expected_version)
    }

    fn update_location(&self, patch: &ResponderPatch) -> StoreResult<bool> {
        self.location_updates.lock().unwrap().push(patch.clone());
        if self.fail_location_updates {
            return Err(CoreError::new(CoreErrorKind::Persistence)
                .with_op("update_location")
                .with_message("db down"));
        }
        self.inner.update_location(patch)
    }

    fn stats(&self) -> StoreResult<ResponderStats> {
        self.inner.stats()
    }

    fn reset(&self) -> StoreResult<()> {
        self.inner.reset()
    }

    fn clear(&self) -> StoreResult<Vec<ResponderId>> {
        self.inner.clear()
    }
}

fn spy_with(records: Vec<Responder>) -> Arc<SpyStore> {
    let spy = SpyStore::default();
    for record in records {
        spy.inner.insert(record).unwrap();
    }
    Arc::new(spy)
}

fn location(responder_id: serde_json::Value, status: &str) -> ConsumerRecord {
    let payload = json!({
        "responderId": responder_id,
        "missionId": "f5a9bc5e-408c-4f86-8592-6f67bb73c5fd",
        "incidentId": "5d9b2d3a-136f-414f-96ba-1b2a445fee5d",
        "status": status,
        "lat": 34.1701,
        "lon": -77.9482,
        "human": false,
        "continue": true,
    });
    ConsumerRecord::new(LOCATION_TOPIC, 0, payload.to_string())
}

#[test]
fn test_moving_update_goes_straight_to_store() {
    let store = spy_with(vec![john_doe(64, true)]);
    let ingestor = LocationIngestor::new(store.clone());
    let ack = CountingAck::default();

    ingestor.on_location_message(&location(json!("64"), "MOVING"), &ack).unwrap();

    assert_eq!(ack.count(), 1);
    let updates = store.location_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, ResponderId::new(64));
    assert_eq!(updates[0].latitude, Some(dec("34.1701")));
    assert_eq!(updates[0].longitude, Some(dec("-77.9482")));
    assert_eq!(updates[0].available, None);

    let stored = store.find_by_id(ResponderId::new(64)).unwrap().unwrap();
    assert_eq!(stored.responder.latitude, dec("34.1701"));
    assert_eq!(stored.responder.longitude, dec("-77.9482"));
    assert_eq!(stored.version, 0);
}

#[test]
fn test_status_match_ignores_case() {
    let store = spy_with(vec![john_doe(64, true)]);
    let ingestor = LocationIngestor::new(store.clone());
    let ack = CountingAck::default();

    ingestor.on_location_message(&location(json!(64), "Moving"), &ack).unwrap();

    assert!(ack.acknowledged());
    assert_eq!(store.location_updates().len(), 1);
}

#[test]
fn test_other_statuses_are_acknowledged_without_update() {
    let store = spy_with(vec![john_doe(64, true)]);
    let ingestor = LocationIngestor::new(store.clone());

    for status in ["DROPPED", "PICKEDUP", "", "MOVINGG"] {
        let ack = CountingAck::default();
        ingestor.on_location_message(&location(json!("64"), status), &ack).unwrap();
        assert!(ack.acknowledged(), "status {:?} should be acknowledged", status);
    }

    assert!(store.location_updates().is_empty());
    let stored = store.find_by_id(ResponderId::new(64)).unwrap().unwrap();
    assert_eq!(stored.responder.latitude, dec("30.12345"));
}

#[test]
fn test_malformed_location_is_acknowledged_and_dropped() {
    let store = spy_with(vec![john_doe(64, true)]);
    let ingestor = LocationIngestor::new(store.clone());

    let payloads = [
        "{".to_string(),
        json!({"status": "MOVING", "lat": 1.0, "lon": 2.0}).to_string(),
        json!({"responderId": "64", "status": "MOVING", "lat": "north", "lon": 2.0}).to_string(),
        json!({"responderId": "64", "status": "MOVING", "lat": 1.0}).to_string(),
    ];
    for payload in payloads {
        let ack = CountingAck::default();
        ingestor
            .on_location_message(&ConsumerRecord::new(LOCATION_TOPIC, 0, payload), &ack)
            .unwrap();
        assert!(ack.acknowledged());
    }

    assert!(store.location_updates().is_empty());
}

#[test]
fn test_unknown_responder_is_still_acknowledged() {
    let store = spy_with(vec![]);
    let ingestor = LocationIngestor::new(store.clone());
    let ack = CountingAck::default();

    ingestor.on_location_message(&location(json!("64"), "MOVING"), &ack).unwrap();

    assert!(ack.acknowledged());
    assert_eq!(store.location_updates().len(), 1);
    assert!(store.find_by_id(ResponderId::new(64)).unwrap().is_none());
}

#[test]
fn test_failed_store_write_is_left_for_redelivery() {
    let store = Arc::new(SpyStore {
        fail_location_updates: true,
        ..SpyStore::default()
    });
    store.inner.insert(john_doe(64, true)).unwrap();
    let ingestor = LocationIngestor::new(store.clone());
    let ack = CountingAck::default();

    let result = ingestor.on_record(&location(json!("64"), "MOVING"), &ack);

    match result {
        Err(ResponderError::Store(err)) => assert_eq!(err.kind(), CoreErrorKind::Persistence),
        other => panic!("expected store failure, got {:?}", other),
    }
    assert_eq!(ack.count(), 0);
    assert_eq!(store.location_updates().len(), 1);
}
