use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::store::{page, ResponderQuery, ResponderStore, StoreResult};
use crate::errors::{CoreError, CoreErrorKind};
use crate::model::{
    NewResponder, Responder, ResponderId, ResponderPatch, ResponderStats, StoredResponder,
};

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<ResponderId, StoredResponder>,
    baseline: BTreeMap<ResponderId, Responder>,
    last_id: i64,
}

/// In-memory record store
///
/// Backs unit and integration tests. Behaves like the SQLite store,
/// including version checks on merge.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    merges: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record with a fixed id at version 0
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the id is taken.
    pub fn insert(&self, responder: Responder) -> StoreResult<StoredResponder> {
        let mut state = self.write("insert")?;
        let id = responder.id;
        if state.records.contains_key(&id) {
            return Err(CoreError::new(CoreErrorKind::AlreadyExists)
                .with_op("insert")
                .with_entity_id(id.to_string()));
        }
        let stored = StoredResponder {
            responder: responder.clone(),
            version: 0,
        };
        state.last_id = state.last_id.max(id.get());
        state.baseline.insert(id, responder);
        state.records.insert(id, stored.clone());
        Ok(stored)
    }

    /// Number of merges that reached the store and succeeded
    pub fn merges_applied(&self) -> usize {
        self.merges.load(Ordering::SeqCst)
    }

    fn read(&self, op: &str) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| poisoned(op))
    }

    fn write(&self, op: &str) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| poisoned(op))
    }
}

fn poisoned(op: &str) -> CoreError {
    CoreError::new(CoreErrorKind::Internal)
        .with_op(op)
        .with_message("memory store lock poisoned")
}

impl ResponderStore for MemoryStore {
    fn find_by_id(&self, id: ResponderId) -> StoreResult<Option<StoredResponder>> {
        Ok(self.read("find_by_id")?.records.get(&id).cloned())
    }

    fn find_by_name(&self, name: &str) -> StoreResult<Option<StoredResponder>> {
        Ok(self
            .read("find_by_name")?
            .records
            .values()
            .find(|stored| stored.responder.name == name)
            .cloned())
    }

    fn list(&self, query: &ResponderQuery) -> StoreResult<Vec<Responder>> {
        let state = self.read("list")?;
        let matching = state
            .records
            .values()
            .filter(|stored| query.filter.matches(&stored.responder))
            .map(|stored| stored.responder.clone());
        Ok(page(matching, query))
    }

    fn create(&self, responder: &NewResponder) -> StoreResult<StoredResponder> {
        let mut state = self.write("create")?;
        state.last_id += 1;
        let id = ResponderId::new(state.last_id);
        let record = responder.clone().into_responder(id);
        let stored = StoredResponder {
            responder: record.clone(),
            version: 0,
        };
        state.baseline.insert(id, record);
        state.records.insert(id, stored.clone());
        Ok(stored)
    }

    fn merge(&self, candidate: &Responder, expected_version: u64) -> StoreResult<StoredResponder> {
        let mut state = self.write("merge")?;
        let stored = state.records.get_mut(&candidate.id).ok_or_else(|| {
            CoreError::new(CoreErrorKind::NotFound)
                .with_op("merge")
                .with_entity_id(candidate.id.to_string())
        })?;
        if stored.version != expected_version {
            return Err(CoreError::new(CoreErrorKind::VersionConflict)
                .with_op("merge")
                .with_entity_id(candidate.id.to_string())
                .with_message(format!(
                    "Expected version {} but store holds {}",
                    expected_version, stored.version
                )));
        }
        stored.responder = candidate.clone();
        stored.version += 1;
        let merged = stored.clone();
        self.merges.fetch_add(1, Ordering::SeqCst);
        Ok(merged)
    }

    fn update_location(&self, patch: &ResponderPatch) -> StoreResult<bool> {
        let mut state = self.write("update_location")?;
        let Some(stored) = state.records.get_mut(&patch.id) else {
            return Ok(false);
        };
        if let Some(latitude) = &patch.latitude {
            stored.responder.latitude = latitude.clone();
        }
        if let Some(longitude) = &patch.longitude {
            stored.responder.longitude = longitude.clone();
        }
        Ok(true)
    }

    fn stats(&self) -> StoreResult<ResponderStats> {
        let state = self.read("stats")?;
        let enrolled = state
            .records
            .values()
            .map(|stored| &stored.responder)
            .filter(|r| r.enrolled);
        let (total, active) = enrolled.fold((0, 0), |(total, active), r| {
            (total + 1, active + u64::from(!r.available))
        });
        Ok(ResponderStats { total, active })
    }

    fn reset(&self) -> StoreResult<()> {
        let mut state = self.write("reset")?;
        let MemoryState {
            records, baseline, ..
        } = &mut *state;
        for (id, stored) in records.iter_mut() {
            if let Some(initial) = baseline.get(id) {
                stored.responder = initial.clone();
            }
        }
        Ok(())
    }

    fn clear(&self) -> StoreResult<Vec<ResponderId>> {
        let mut state = self.write("clear")?;
        let removed: Vec<ResponderId> = state
            .records
            .values()
            .filter(|stored| !stored.responder.person)
            .map(StoredResponder::id)
            .collect();
        for id in &removed {
            state.records.remove(id);
            state.baseline.remove(id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::decimal::parse_decimal;
    use crate::ops::ResponderFilter;

    fn new_responder(name: &str, person: bool, available: bool) -> NewResponder {
        NewResponder {
            name: name.to_string(),
            phone_number: "111-222-333".to_string(),
            latitude: parse_decimal("30.12345").unwrap(),
            longitude: parse_decimal("-70.98765").unwrap(),
            boat_capacity: 3,
            medical_kit: true,
            available,
            person,
            enrolled: true,
        }
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.create(&new_responder("a", true, true)).unwrap();
        let b = store.create(&new_responder("b", true, true)).unwrap();
        assert_eq!(a.id(), ResponderId::new(1));
        assert_eq!(b.id(), ResponderId::new(2));
        assert_eq!(a.version, 0);
    }

    #[test]
    fn test_merge_bumps_version_and_rejects_stale() {
        let store = MemoryStore::new();
        let stored = store.create(&new_responder("a", true, true)).unwrap();
        let mut candidate = stored.responder.clone();
        candidate.available = false;

        let merged = store.merge(&candidate, 0).unwrap();
        assert_eq!(merged.version, 1);

        let err = store.merge(&candidate, 0).unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::VersionConflict);
        assert_eq!(store.merges_applied(), 1);
    }

    #[test]
    fn test_update_location_leaves_version() {
        let store = MemoryStore::new();
        let stored = store.create(&new_responder("a", true, true)).unwrap();
        let patch = ResponderPatch::location(
            stored.id(),
            parse_decimal("34.1701").unwrap(),
            parse_decimal("-77.9482").unwrap(),
        );
        assert!(store.update_location(&patch).unwrap());
        let after = store.find_by_id(stored.id()).unwrap().unwrap();
        assert_eq!(after.version, 0);
        assert_eq!(after.responder.latitude, parse_decimal("34.1701").unwrap());
        assert!(!store
            .update_location(&ResponderPatch::new(ResponderId::new(99)))
            .unwrap());
    }

    #[test]
    fn test_list_filters_and_pages() {
        let store = MemoryStore::new();
        store.create(&new_responder("a", true, true)).unwrap();
        store.create(&new_responder("b", false, true)).unwrap();
        store.create(&new_responder("c", true, false)).unwrap();

        let people = store.list(&ResponderQuery::new(ResponderFilter::Person)).unwrap();
        assert_eq!(people.len(), 2);

        let available = store
            .list(&ResponderQuery::new(ResponderFilter::Available))
            .unwrap();
        assert_eq!(available.len(), 2);

        let paged = store
            .list(&ResponderQuery::new(ResponderFilter::All).with_page(Some(1), 1))
            .unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].name, "b");
    }

    #[test]
    fn test_stats_counts_enrolled_and_committed() {
        let store = MemoryStore::new();
        store.create(&new_responder("a", true, true)).unwrap();
        store.create(&new_responder("b", true, false)).unwrap();
        let mut not_enrolled = new_responder("c", true, false);
        not_enrolled.enrolled = false;
        store.create(&not_enrolled).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
    }

    #[test]
    fn test_reset_restores_snapshot_and_clear_keeps_people() {
        let store = MemoryStore::new();
        let person = store.create(&new_responder("a", true, true)).unwrap();
        store.create(&new_responder("b", false, true)).unwrap();

        let mut candidate = person.responder.clone();
        candidate.available = false;
        store.merge(&candidate, 0).unwrap();

        store.reset().unwrap();
        let restored = store.find_by_id(person.id()).unwrap().unwrap();
        assert!(restored.responder.available);
        assert_eq!(restored.version, 1);

        let removed = store.clear().unwrap();
        assert_eq!(removed, vec![ResponderId::new(2)]);
        assert!(store.find_by_name("b").unwrap().is_none());
        assert!(store.find_by_name("a").unwrap().is_some());
    }
}
