use bigdecimal::BigDecimal;
use responder_core::model::decimal::parse_decimal;
use responder_core::{
    CoreError, CoreErrorKind, MemoryStore, NewResponder, Responder, ResponderId, ResponderPatch,
    ResponderQuery, ResponderStats, ResponderStore, StoreResult, StoredResponder,
};

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

/// A memory store seeded with the given records
#[allow(dead_code)]
pub fn seeded_store(records: Vec<Responder>) -> MemoryStore {
    let store = MemoryStore::new();
    for record in records {
        store.insert(record).unwrap();
    }
    store
}

/// Store whose merges always fail with the given kind
#[allow(dead_code)]
pub struct FailingStore {
    pub inner: MemoryStore,
    pub kind: CoreErrorKind,
}

impl ResponderStore for FailingStore {
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

    fn merge(&self, candidate: &Responder, _expected_version: u64) -> StoreResult<StoredResponder> {
        Err(CoreError::new(self.kind)
            .with_op("merge")
            .with_entity_id(candidate.id.to_string()))
    }

    fn update_location(&self, patch: &ResponderPatch) -> StoreResult<bool> {
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
