//! Consumer spans: parentage, trace continuation and closing on every path

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{john_doe, CountingAck, Harness};
use responder_core::logging_facility::init_test_capture;
use responder_engine::propagation::{TRACEPARENT_HEADER, UBER_TRACE_ID_HEADER};
use responder_engine::{
    CommandDispatcher, ConsumerRecord, HeaderValue, TracePropagator, TransportHeaders,
};
use serde_json::json;

fn traceparent(trace: &str) -> String {
    format!("00-{}-00f067aa0ba902b7-01", trace)
}

#[test]
fn test_span_ignores_the_current_span() {
    let capture = init_test_capture();
    let trace = "11111111111111111111111111111111";
    let headers = TransportHeaders::new().with(TRACEPARENT_HEADER, traceparent(trace));

    let outer = tracing::info_span!("outer_request");
    let _outer = outer.enter();
    let span = TracePropagator::new().child_span("test_operation", &headers);

    assert_eq!(span.context().trace_id.as_str(), trace);
    assert_eq!(span.parent().unwrap().span_id.as_str(), "00f067aa0ba902b7");

    let spans = capture.spans_with_field("trace_id", trace);
    assert_eq!(spans.len(), 1);
    let captured = &spans[0];
    assert_eq!(captured.name, "consumer");
    assert!(captured.parent.is_none());
    assert_eq!(captured.fields.get("op").map(String::as_str), Some("test_operation"));
    assert_eq!(captured.fields.get("span.kind").map(String::as_str), Some("consumer"));
    assert_eq!(captured.fields.get("component").map(String::as_str), Some("responder-service"));
    assert_eq!(
        captured.fields.get("parent_span_id").map(String::as_str),
        Some("00f067aa0ba902b7")
    );
    assert_eq!(captured.fields.get("reference").map(String::as_str), Some("child_of"));
}

#[test]
fn test_span_closes_when_dropped() {
    let capture = init_test_capture();
    let trace = "22222222222222222222222222222222";
    let headers = TransportHeaders::new().with(TRACEPARENT_HEADER, traceparent(trace));

    let span = TracePropagator::new().child_span("test_operation", &headers);
    assert!(!capture.spans_with_field("trace_id", trace)[0].closed);
    drop(span);

    assert!(capture.spans_with_field("trace_id", trace)[0].closed);
}

#[test]
fn test_jaeger_header_continues_the_trace() {
    init_test_capture();
    let mut headers = TransportHeaders::new();
    headers.insert(UBER_TRACE_ID_HEADER, HeaderValue::Text("3333abcd:4444:0:1".to_string()));

    let span = TracePropagator::new().child_span("test_operation", &headers);

    assert_eq!(span.context().trace_id.as_str(), "0000000000000000000000003333abcd");
    assert_eq!(span.parent().unwrap().span_id.as_str(), "0000000000004444");
}

#[test]
fn test_missing_context_starts_a_new_trace() {
    let capture = init_test_capture();

    let span = TracePropagator::new().child_span("test_operation", &TransportHeaders::new());
    let trace = span.context().trace_id.as_str().to_string();

    assert!(span.parent().is_none());
    let spans = capture.spans_with_field("trace_id", &trace);
    assert_eq!(spans.len(), 1);
    assert!(!spans[0].fields.contains_key("reference"));
}

#[test]
fn test_dispatcher_span_closes_on_failure() {
    let capture = init_test_capture();
    let trace = "55555555555555555555555555555555";
    let harness = Harness::new(vec![john_doe(1, true)]);
    let dispatcher = CommandDispatcher::new(harness.store.clone(), harness.emitter(), "events");
    let payload = json!({"messageType": "UpdateResponderCommand", "body": {}});
    let record = ConsumerRecord::new("commands", 0, payload.to_string())
        .with_headers(TransportHeaders::new().with(TRACEPARENT_HEADER, traceparent(trace)));
    let ack = CountingAck::default();

    assert!(dispatcher.on_message(&record, &ack).is_err());

    let spans = capture.spans_with_field("trace_id", trace);
    assert_eq!(spans.len(), 1);
    assert_eq!(
        spans[0].fields.get("op").map(String::as_str),
        Some("process_update_responder_command")
    );
    assert!(spans[0].closed);
    assert!(!ack.acknowledged());
}

#[test]
fn test_dispatcher_logs_inside_the_consumer_span() {
    let capture = init_test_capture();
    let trace = "66666666666666666666666666666666";
    let harness = Harness::new(vec![john_doe(1, true)]);
    let dispatcher = CommandDispatcher::new(harness.store.clone(), harness.emitter(), "events");
    let payload = json!({
        "messageType": "UpdateResponderCommand",
        "body": {"responder": {"id": "1", "available": false}},
    });
    let record = ConsumerRecord::new("commands", 3, payload.to_string())
        .with_headers(TransportHeaders::new().with(TRACEPARENT_HEADER, traceparent(trace)));

    dispatcher.on_message(&record, &CountingAck::default()).unwrap();

    capture.assert_event_exists("process_update_responder_command", "end");
    assert!(capture.spans_with_field("trace_id", trace)[0].closed);
    let in_span = capture.count_events(|e| {
        e.op.as_deref() == Some("process_update_responder_command")
            && e.span.as_deref() == Some("consumer")
    });
    assert!(in_span >= 2);
}
