use crate::errors::CoreError;
use crate::model::{
    NewResponder, Responder, ResponderId, ResponderPatch, ResponderStats, StoredResponder,
};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, CoreError>;

/// Which records a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponderFilter {
    #[default]
    All,
    /// Enrolled and available for a mission
    Available,
    /// Registered as an individual person rather than a unit
    Person,
}

impl ResponderFilter {
    pub fn matches(&self, responder: &Responder) -> bool {
        match self {
            ResponderFilter::All => true,
            ResponderFilter::Available => responder.available && responder.enrolled,
            ResponderFilter::Person => responder.person,
        }
    }
}

/// A filtered, paged listing request
///
/// Results are ordered by id ascending before the page is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResponderQuery {
    pub filter: ResponderFilter,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl ResponderQuery {
    pub fn new(filter: ResponderFilter) -> Self {
        Self {
            filter,
            limit: None,
            offset: 0,
        }
    }

    pub fn with_page(mut self, limit: Option<usize>, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Durable storage for responder records
///
/// Implementations must be safe to share between listener workers. Every
/// operation is atomic on its own; `merge` is the only one that moves a
/// record's version.
pub trait ResponderStore: Send + Sync {
    /// Look up a record by id
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when the backing store fails.
    fn find_by_id(&self, id: ResponderId) -> StoreResult<Option<StoredResponder>>;

    /// Look up a record by exact name
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when the backing store fails.
    fn find_by_name(&self, name: &str) -> StoreResult<Option<StoredResponder>>;

    /// List records matching the query
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when the backing store fails.
    fn list(&self, query: &ResponderQuery) -> StoreResult<Vec<Responder>>;

    /// Insert a new record, assigning its id; the values also become the
    /// record's reset snapshot
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when the backing store fails.
    fn create(&self, responder: &NewResponder) -> StoreResult<StoredResponder>;

    /// Replace a record with `candidate` if its version is still
    /// `expected_version`, bumping the version
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the record is gone and `VersionConflict`
    /// when another writer got there first.
    fn merge(&self, candidate: &Responder, expected_version: u64) -> StoreResult<StoredResponder>;

    /// Write the coordinates of `patch` straight through, leaving every
    /// other field and the version untouched
    ///
    /// Returns `false` when no record has the patch's id.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when the backing store fails.
    fn update_location(&self, patch: &ResponderPatch) -> StoreResult<bool>;

    /// Enrolment counters
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when the backing store fails.
    fn stats(&self) -> StoreResult<ResponderStats>;

    /// Restore every record to its creation snapshot
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when the backing store fails.
    fn reset(&self) -> StoreResult<()>;

    /// Delete every non-person record, returning the removed ids in
    /// ascending order
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when the backing store fails.
    fn clear(&self) -> StoreResult<Vec<ResponderId>>;
}

/// Apply the paging of `query` to an already filtered, ordered listing
pub fn page<T>(items: impl IntoIterator<Item = T>, query: &ResponderQuery) -> Vec<T> {
    let skipped = items.into_iter().skip(query.offset);
    match query.limit {
        Some(limit) => skipped.take(limit).collect(),
        None => skipped.collect(),
    }
}
