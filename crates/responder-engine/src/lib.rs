//! Responder Engine - message-driven orchestration
//!
//! Wires the reconciliation kernel to the bus:
//! - `CommandDispatcher` for update commands, `LocationIngestor` for
//!   location updates
//! - `EventEmitter` for fire-and-forget outbound events
//! - `TracePropagator` for continuing upstream traces
//! - `ResponderService` for the administrative operations
//! - `ListenerContainer`, a partition-ordered worker pool
//! - `ServiceConfig`, the layered configuration

pub mod bus;
pub mod codec;
pub mod config;
pub mod container;
pub mod dispatcher;
pub mod emitter;
pub mod location;
pub mod propagation;
pub mod service;

pub use bus::{
    Acknowledgment, ConsumerRecord, HeaderValue, RecordHandler, TopicRouter, TransportHeaders,
};
pub use config::{ConfigError, ServiceConfig};
pub use container::{ContainerStats, ListenerContainer};
pub use dispatcher::CommandDispatcher;
pub use emitter::{EventEmitter, EventPublisher, JsonLinesPublisher, OutboundRecord, PublishError};
pub use location::LocationIngestor;
pub use propagation::{CarrierError, ConsumerSpan, SpanContext, TraceCarrier, TracePropagator};
pub use service::ResponderService;
