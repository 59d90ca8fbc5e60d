//! Administrative operations on responder records
//!
//! Queries plus the bulk lifecycle operations. Creation and clearing
//! announce themselves on the bus; reset is silent.

use std::sync::Arc;

use responder_core::schema::{
    INVOKING_SERVICE, MESSAGE_RESPONDERS_CREATED_EVENT, MESSAGE_RESPONDERS_DELETED_EVENT,
};
use responder_core::{
    Message, NewResponder, Responder, ResponderError, ResponderFilter, ResponderId,
    ResponderQuery, ResponderStats, ResponderStore, RespondersCreatedEvent,
    RespondersDeletedEvent, Result,
};
use responder_core_types::Sensitive;

use crate::config::DestinationsConfig;
use crate::emitter::EventEmitter;

/// Partition key of every created event
pub const KEY_RESPONDERS_CREATED: &str = "RespondersCreated";
/// Partition key of every deleted event
pub const KEY_RESPONDERS_DELETED: &str = "RespondersDeleted";

pub struct ResponderService {
    store: Arc<dyn ResponderStore>,
    emitter: EventEmitter,
    destinations: DestinationsConfig,
}

impl ResponderService {
    pub fn new(
        store: Arc<dyn ResponderStore>,
        emitter: EventEmitter,
        destinations: DestinationsConfig,
    ) -> Self {
        Self {
            store,
            emitter,
            destinations,
        }
    }

    /// # Errors
    ///
    /// Returns `Store` when the lookup fails.
    pub fn get_responder(&self, id: ResponderId) -> Result<Option<Responder>> {
        Ok(self.store.find_by_id(id)?.map(|stored| stored.responder))
    }

    /// # Errors
    ///
    /// Returns `Store` when the lookup fails.
    pub fn get_responder_by_name(&self, name: &str) -> Result<Option<Responder>> {
        Ok(self.store.find_by_name(name)?.map(|stored| stored.responder))
    }

    /// Enrolled responders that are free for a mission
    ///
    /// # Errors
    ///
    /// Returns `Store` when the listing fails.
    pub fn available_responders(
        &self,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Responder>> {
        self.list(ResponderFilter::Available, limit, offset)
    }

    /// # Errors
    ///
    /// Returns `Store` when the listing fails.
    pub fn all_responders(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Responder>> {
        self.list(ResponderFilter::All, limit, offset)
    }

    /// # Errors
    ///
    /// Returns `Store` when the listing fails.
    pub fn person_responders(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Responder>> {
        self.list(ResponderFilter::Person, limit, offset)
    }

    /// Listing with an explicit filter
    ///
    /// # Errors
    ///
    /// Returns `Store` when the listing fails.
    pub fn list(
        &self,
        filter: ResponderFilter,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Responder>> {
        let query = ResponderQuery::new(filter).with_page(limit, offset);
        Ok(self.store.list(&query)?)
    }

    /// # Errors
    ///
    /// Returns `Store` when the counters cannot be read.
    pub fn stats(&self) -> Result<ResponderStats> {
        Ok(self.store.stats()?)
    }

    /// Create one responder and announce it
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponder` for a record that fails validation and
    /// `Store` when the insert fails.
    pub fn create_responder(&self, responder: &NewResponder) -> Result<Responder> {
        responder.validate()?;
        let stored = self.store.create(responder)?;
        tracing::info!(
            responder_id = %stored.id(),
            phone_number = %Sensitive::new(&responder.phone_number),
            "responder created"
        );
        self.announce_created(&[stored.id()]);
        Ok(stored.responder)
    }

    /// Create a batch of responders and announce them in one event
    ///
    /// Every record is validated before any is written.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponder` naming the first invalid record and
    /// `Store` when an insert fails. Records inserted before a failing
    /// insert stay, and are announced.
    pub fn create_responders(&self, responders: &[NewResponder]) -> Result<Vec<ResponderId>> {
        for (index, responder) in responders.iter().enumerate() {
            responder.validate().map_err(|err| match err {
                ResponderError::InvalidResponder { reason } => ResponderError::InvalidResponder {
                    reason: format!("record {}: {}", index, reason),
                },
                other => other,
            })?;
        }

        let mut ids = Vec::with_capacity(responders.len());
        for responder in responders {
            match self.store.create(responder) {
                Ok(stored) => ids.push(stored.id()),
                Err(err) => {
                    if !ids.is_empty() {
                        self.announce_created(&ids);
                    }
                    return Err(err.into());
                }
            }
        }

        tracing::info!(count = ids.len(), "responders created");
        self.announce_created(&ids);
        Ok(ids)
    }

    /// Restore every record to its creation values; emits nothing
    ///
    /// # Errors
    ///
    /// Returns `Store` when the reset fails.
    pub fn reset(&self) -> Result<()> {
        tracing::info!("reset called");
        Ok(self.store.reset()?)
    }

    /// Delete every non-person responder and announce the removed ids
    ///
    /// # Errors
    ///
    /// Returns `Store` when the delete fails; nothing is announced then.
    pub fn clear(&self) -> Result<Vec<ResponderId>> {
        tracing::info!("clear called");
        let removed = self.store.clear()?;
        let message = Message::new(
            MESSAGE_RESPONDERS_DELETED_EVENT,
            INVOKING_SERVICE,
            RespondersDeletedEvent::new(&removed),
        );
        self.emitter.publish(
            &self.destinations.responders_deleted_event,
            KEY_RESPONDERS_DELETED,
            &message,
        );
        Ok(removed)
    }

    fn announce_created(&self, ids: &[ResponderId]) {
        let message = Message::new(
            MESSAGE_RESPONDERS_CREATED_EVENT,
            INVOKING_SERVICE,
            RespondersCreatedEvent::new(ids),
        );
        self.emitter.publish(
            &self.destinations.responders_created_event,
            KEY_RESPONDERS_CREATED,
            &message,
        );
    }
}
