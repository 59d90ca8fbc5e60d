//! Core types shared across the responder service crates
//!
//! This crate provides foundational types used by the error, logging and
//! messaging facilities:
//!
//! - **Correlation types**: TraceId, SpanId, MessageId, CorrelationId
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical field keys, header keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{CorrelationId, MessageId, SpanId, TraceId};
pub use sensitive::Sensitive;
