//! Responder Core - reconciliation kernel for the responder service
//!
//! This crate provides the domain model and the pure parts of the
//! command-to-state pipeline:
//! - Responder records, sparse update patches and the stored (versioned) form
//! - The bus message envelope and the command/event bodies
//! - The `ResponderStore` seam plus an in-memory implementation
//! - The partial-update merger that turns a patch into a verdict
//! - The canonical error and structured logging facilities

pub mod errors;
pub mod logging_facility;
pub mod merge;
pub mod message;
pub mod model;
pub mod ops;

pub use responder_core_types::schema;

// Re-export commonly used types
pub use errors::{CoreError, CoreErrorKind, ResponderError, Result};
pub use merge::{merge_update, reconcile, Verdict, VerdictReason};
pub use message::{
    EventStatus, Message, RespondersCreatedEvent, RespondersDeletedEvent, ResponderUpdatedEvent,
    UpdateResponderCommand,
};
pub use model::{
    NewResponder, Responder, ResponderId, ResponderPatch, ResponderStats, StoredResponder,
};
pub use ops::{MemoryStore, ResponderFilter, ResponderQuery, ResponderStore, StoreResult};
