//! Responder Store - SQLite persistence for responder records
//!
//! Provides:
//! - SQLite schema with an embedded, checksummed migrations framework
//! - `SqliteResponderStore`, the durable `ResponderStore` implementation

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteResponderStore;
