//! Test capture mode for deterministic logging assertions
//!
//! This module provides a test-only subscriber that captures log events and
//! span lifecycles in memory for assertion in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::Visit;
use tracing::span::{Attributes, Id};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// A captured log event with all its fields
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    pub fields: HashMap<String, String>,
    /// Name of the innermost span the event was emitted in
    pub span: Option<String>,
}

/// A captured span with its recorded fields
#[derive(Clone, Debug)]
pub struct CapturedSpan {
    pub name: String,
    pub fields: HashMap<String, String>,
    /// Name of the parent span, `None` for root spans
    pub parent: Option<String>,
    pub closed: bool,
    id: u64,
}

struct FieldVisitor {
    fields: HashMap<String, String>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }
}

#[derive(Default)]
struct Captured {
    events: Vec<CapturedEvent>,
    spans: Vec<CapturedSpan>,
}

/// Test capture layer for collecting log events and spans
pub struct TestCaptureLayer {
    captured: Arc<Mutex<Captured>>,
}

impl TestCaptureLayer {
    pub fn new() -> (Self, TestCapture) {
        let captured = Arc::new(Mutex::new(Captured::default()));
        let layer = Self {
            captured: captured.clone(),
        };
        (layer, TestCapture { captured })
    }
}

impl<S> Layer<S> for TestCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::new();
        attrs.record(&mut visitor);
        let parent = ctx
            .span(id)
            .and_then(|span| span.parent())
            .map(|parent| parent.name().to_string());

        let span = CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.fields,
            parent,
            closed: false,
            id: id.into_u64(),
        };
        self.captured
            .lock()
            .map(|mut c| c.spans.push(span))
            .ok();
    }

    fn on_record(&self, id: &Id, values: &tracing::span::Record<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::new();
        values.record(&mut visitor);
        self.captured
            .lock()
            .map(|mut c| {
                if let Some(span) = c
                    .spans
                    .iter_mut()
                    .rev()
                    .find(|s| s.id == id.into_u64() && !s.closed)
                {
                    span.fields.extend(visitor.fields);
                }
            })
            .ok();
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        let captured = CapturedEvent {
            level: *metadata.level(),
            component: visitor.fields.get("component").cloned(),
            op: visitor.fields.get("op").cloned(),
            event: visitor.fields.get("event").cloned(),
            fields: visitor.fields,
            span: ctx.event_span(event).map(|s| s.name().to_string()),
        };

        self.captured
            .lock()
            .map(|mut c| c.events.push(captured))
            .ok();
    }

    fn on_close(&self, id: Id, _ctx: Context<'_, S>) {
        self.captured
            .lock()
            .map(|mut c| {
                if let Some(span) = c
                    .spans
                    .iter_mut()
                    .rev()
                    .find(|s| s.id == id.into_u64() && !s.closed)
                {
                    span.closed = true;
                }
            })
            .ok();
    }
}

/// Handle for accessing captured events in tests
#[derive(Clone)]
pub struct TestCapture {
    captured: Arc<Mutex<Captured>>,
}

impl TestCapture {
    /// Get all captured events
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.captured
            .lock()
            .map(|c| c.events.clone())
            .unwrap_or_default()
    }

    /// Get all captured spans
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.captured
            .lock()
            .map(|c| c.spans.clone())
            .unwrap_or_default()
    }

    /// Spans whose field `key` equals `value`
    pub fn spans_with_field(&self, key: &str, value: &str) -> Vec<CapturedSpan> {
        self.spans()
            .into_iter()
            .filter(|s| s.fields.get(key).map(String::as_str) == Some(value))
            .collect()
    }

    /// Assert that an event exists with the given operation and event type
    ///
    /// # Panics
    ///
    /// Panics if the event is not found
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        let found = events
            .iter()
            .any(|e| e.op.as_deref() == Some(op) && e.event.as_deref() == Some(event));
        assert!(
            found,
            "Expected event op={} event={} not found in {} captured events",
            op,
            event,
            events.len()
        );
    }

    /// Clear all captured events and spans
    pub fn clear(&self) {
        self.captured
            .lock()
            .map(|mut c| {
                c.events.clear();
                c.spans.clear();
            })
            .ok();
    }

    /// Count events matching a predicate
    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Initialize test capture mode
///
/// Installs the capture layer as the global subscriber on first use and
/// returns a handle to the shared capture. Tests running in parallel share
/// it, so assertions should filter on values unique to the test.
///
/// # Example
///
/// ```
/// use responder_core::logging_facility::test_capture::init_test_capture;
/// use responder_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_operation");
/// capture.assert_event_exists("doc_operation", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCaptureLayer::new();
            let _ = tracing_subscriber::registry().with(layer).try_init();
            capture
        })
        .clone()
}
