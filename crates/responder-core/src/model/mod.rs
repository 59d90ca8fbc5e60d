//! Domain model: responder records and sparse updates

pub mod decimal;
pub mod patch;
pub mod responder;

pub use patch::ResponderPatch;
pub use responder::{NewResponder, Responder, ResponderId, ResponderStats, StoredResponder};
