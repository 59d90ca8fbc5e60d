use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use futures::future::BoxFuture;
use responder_core::model::decimal::parse_decimal;
use responder_core::{MemoryStore, Responder, ResponderId};
use responder_engine::bus::Acknowledgment;
use responder_engine::{EventEmitter, EventPublisher, OutboundRecord, PublishError};
use tokio::runtime::Runtime;

/// Parse a decimal literal for test fixtures
#[allow(dead_code)]
pub fn dec(raw: &str) -> BigDecimal {
    parse_decimal(raw).unwrap()
}

/// The "John Doe" fixture record
#[allow(dead_code)]
pub fn john_doe(id: i64, available: bool) -> Responder {
    Responder {
        id: ResponderId::new(id),
        name: "John Doe".to_string(),
        phone_number: "111-222-333".to_string(),
        latitude: dec("30.12345"),
        longitude: dec("-70.98765"),
        boat_capacity: 3,
        medical_kit: true,
        available,
        person: true,
        enrolled: true,
    }
}

/// Publisher that records every submitted record at submission time
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingPublisher {
    records: Mutex<Vec<OutboundRecord>>,
    fail: bool,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<OutboundRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn to(&self, destination: &str) -> Vec<OutboundRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.destination == destination)
            .collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn send(&self, record: OutboundRecord) -> BoxFuture<'static, Result<(), PublishError>> {
        self.records.lock().unwrap().push(record);
        let result = if self.fail {
            Err(PublishError::Transport("broker unavailable".to_string()))
        } else {
            Ok(())
        };
        Box::pin(futures::future::ready(result))
    }
}

/// Acknowledgment that counts calls
#[derive(Default)]
#[allow(dead_code)]
pub struct CountingAck(AtomicUsize);

#[allow(dead_code)]
impl CountingAck {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn acknowledged(&self) -> bool {
        self.count() > 0
    }
}

impl Acknowledgment for CountingAck {
    fn acknowledge(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Runtime, store and publisher shared by one test
#[allow(dead_code)]
pub struct Harness {
    pub runtime: Runtime,
    pub store: Arc<MemoryStore>,
    pub publisher: Arc<RecordingPublisher>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(records: Vec<Responder>) -> Self {
        Self::with_publisher(records, RecordingPublisher::default())
    }

    pub fn with_publisher(records: Vec<Responder>, publisher: RecordingPublisher) -> Self {
        let store = MemoryStore::new();
        for record in records {
            store.insert(record).unwrap();
        }
        Self {
            runtime: Runtime::new().unwrap(),
            store: Arc::new(store),
            publisher: Arc::new(publisher),
        }
    }

    pub fn emitter(&self) -> EventEmitter {
        EventEmitter::new(self.publisher.clone(), self.runtime.handle().clone())
    }
}
