//! Trace context propagation across the bus boundary
//!
//! Inbound transport headers are read through a narrow carrier, a parent
//! context is extracted from W3C `traceparent` or Jaeger `uber-trace-id`,
//! and a fresh consumer span is opened as its child.

use std::collections::BTreeMap;

use responder_core_types::{SpanId, TraceId};
use thiserror::Error;
use tracing::span::EnteredSpan;

use crate::bus::TransportHeaders;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const UBER_TRACE_ID_HEADER: &str = "uber-trace-id";

/// Component tag on every consumer span
pub const COMPONENT: &str = "responder-service";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CarrierError {
    /// The carrier is extract-only
    #[error("carrier is read-only: cannot inject '{key}'")]
    InjectUnsupported { key: String },
}

/// Text-map view of propagation headers
pub trait TraceCarrier {
    fn get(&self, key: &str) -> Option<&str>;

    fn keys(&self) -> Vec<&str>;

    /// Write a propagation header
    ///
    /// # Errors
    ///
    /// Read-only carriers return `CarrierError::InjectUnsupported`.
    fn set(&mut self, key: &str, value: String) -> Result<(), CarrierError>;
}

/// Read-only carrier over inbound transport headers
///
/// Values are decoded once on construction: bytes as UTF-8, anything else
/// through its string form. Keys match case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct HeadersExtractCarrier {
    entries: BTreeMap<String, String>,
}

impl HeadersExtractCarrier {
    pub fn new(headers: &TransportHeaders) -> Self {
        let entries = headers
            .iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value.to_string()))
            .collect();
        Self { entries }
    }
}

impl TraceCarrier for HeadersExtractCarrier {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    fn set(&mut self, key: &str, _value: String) -> Result<(), CarrierError> {
        Err(CarrierError::InjectUnsupported {
            key: key.to_string(),
        })
    }
}

/// Identity of one span in a distributed trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub sampled: bool,
}

impl SpanContext {
    /// Extract a parent context, preferring `traceparent`
    pub fn extract(carrier: &dyn TraceCarrier) -> Option<Self> {
        carrier
            .get(TRACEPARENT_HEADER)
            .and_then(Self::from_traceparent)
            .or_else(|| {
                carrier
                    .get(UBER_TRACE_ID_HEADER)
                    .and_then(Self::from_uber_trace_id)
            })
    }

    /// Parse `00-<32 hex trace>-<16 hex span>-<2 hex flags>`
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let version = parts.next()?;
        let trace = parts.next()?;
        let span = parts.next()?;
        let flags = parts.next()?;
        if version.len() != 2 || version == "ff" || trace.len() != 32 || span.len() != 16 {
            return None;
        }
        let flags = u8::from_str_radix(flags, 16).ok()?;
        Some(Self {
            trace_id: TraceId::parse(trace)?,
            span_id: SpanId::parse(span)?,
            sampled: flags & 0x01 == 0x01,
        })
    }

    /// Parse `<trace>:<span>:<parent>:<flags>`, URL-encoded colons allowed
    pub fn from_uber_trace_id(value: &str) -> Option<Self> {
        let decoded = value.trim().replace("%3A", ":").replace("%3a", ":");
        let parts: Vec<&str> = decoded.split(':').collect();
        if parts.len() != 4 {
            return None;
        }
        let flags = u8::from_str_radix(parts[3], 16).ok()?;
        Some(Self {
            trace_id: TraceId::parse(parts[0])?,
            span_id: SpanId::parse(parts[1])?,
            sampled: flags & 0x01 == 0x01,
        })
    }

    /// A new span in the same trace
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: SpanId::new(),
            sampled: self.sampled,
        }
    }

    /// A new root span in a new trace
    pub fn root() -> Self {
        Self {
            trace_id: TraceId::new(),
            span_id: SpanId::new(),
            sampled: true,
        }
    }

    /// Render as a W3C `traceparent` value
    pub fn to_traceparent(&self) -> String {
        format!(
            "00-{}-{}-{}",
            self.trace_id,
            self.span_id,
            if self.sampled { "01" } else { "00" }
        )
    }
}

/// An entered consumer span; exiting and closing happen on drop
#[derive(Debug)]
pub struct ConsumerSpan {
    context: SpanContext,
    parent: Option<SpanContext>,
    _entered: EnteredSpan,
}

impl ConsumerSpan {
    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    pub fn parent(&self) -> Option<&SpanContext> {
        self.parent.as_ref()
    }
}

/// Opens consumer spans that continue upstream traces
#[derive(Debug, Clone, Copy, Default)]
pub struct TracePropagator;

impl TracePropagator {
    pub fn new() -> Self {
        Self
    }

    /// Open and enter a consumer span for `operation`
    ///
    /// The span never attaches to whatever span is current on this thread;
    /// its only parent is the one carried by the headers, if any.
    pub fn child_span(&self, operation: &'static str, headers: &TransportHeaders) -> ConsumerSpan {
        let carrier = HeadersExtractCarrier::new(headers);
        let parent = SpanContext::extract(&carrier);
        let context = parent
            .as_ref()
            .map(SpanContext::child)
            .unwrap_or_else(SpanContext::root);

        let span = tracing::info_span!(
            parent: None,
            "consumer",
            op = operation,
            span.kind = "consumer",
            component = COMPONENT,
            trace_id = %context.trace_id,
            span_id = %context.span_id,
            parent_span_id = tracing::field::Empty,
            reference = tracing::field::Empty,
        );
        if let Some(parent) = &parent {
            span.record("parent_span_id", parent.span_id.as_str());
            span.record("reference", "child_of");
        }

        ConsumerSpan {
            context,
            parent,
            _entered: span.entered(),
        }
    }
}
