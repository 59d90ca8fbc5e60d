//! Repository layer mapping responder records onto SQLite rows

mod sqlite_store;

pub use sqlite_store::SqliteResponderStore;
