//! Correlation types for message tracking and tracing
//!
//! These types tie an inbound bus message to the work it causes and to the
//! outbound events it produces, and carry trace identity across the
//! asynchronous boundary.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trace identifier shared by every span of one distributed trace
///
/// Always 32 lowercase hex characters, never all zeros.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(String);

impl TraceId {
    /// Generate a new random TraceId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    /// Parse a hex trace id as found in propagation headers
    ///
    /// Accepts 1 to 32 hex digits (Jaeger drops leading zeros) and
    /// normalizes to the padded lowercase form. Returns `None` for
    /// non-hex input or the invalid all-zero id.
    pub fn parse(raw: &str) -> Option<Self> {
        parse_hex_id(raw, 32).map(Self)
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span identifier for one unit of work within a trace
///
/// Always 16 lowercase hex characters, never all zeros.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanId(String);

impl SpanId {
    /// Generate a new random SpanId
    pub fn new() -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        Self(raw[..16].to_string())
    }

    /// Parse a hex span id as found in propagation headers
    pub fn parse(raw: &str) -> Option<Self> {
        parse_hex_id(raw, 16).map(Self)
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SpanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SpanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique identifier of a bus message envelope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a new random MessageId using UUIDv4
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied correlation id (the incident id)
///
/// Opaque: copied verbatim from inbound to outbound headers, never
/// generated or normalized here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wrap a correlation value exactly as received
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_hex_id(raw: &str, width: usize) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.len() > width || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    if raw.chars().all(|c| c == '0') {
        return None;
    }
    Some(format!("{:0>width$}", raw.to_ascii_lowercase(), width = width))
}
