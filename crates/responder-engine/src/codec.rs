//! Inbound payload normalization
//!
//! Some producers publish the JSON envelope as a JSON string literal, with
//! the inner quotes escaped. Such payloads are unwrapped before parsing;
//! everything else passes through untouched.

use std::borrow::Cow;

/// Unwrap a payload that arrived as a quoted JSON string
pub fn normalize_payload(payload: &str) -> Cow<'_, str> {
    let trimmed = payload.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        let inner = &trimmed[1..trimmed.len() - 1];
        Cow::Owned(inner.replace("\\\"", "\""))
    } else {
        Cow::Borrowed(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = concat!(
        r#"{"messageType":"UpdateResponderCommand","id":"messageId","#,
        r#""body":{"lat": "34.14338","numberOfPeople": 3}}"#
    );

    #[test]
    fn test_unquoted_passes_through() {
        let normalized = normalize_payload(PLAIN);
        assert!(matches!(normalized, Cow::Borrowed(_)));
        assert_eq!(normalized, PLAIN);
    }

    #[test]
    fn test_quoted_is_unwrapped() {
        let quoted = format!("\"{}\"", PLAIN.replace('"', "\\\""));
        assert_eq!(normalize_payload(&quoted), PLAIN);
    }

    #[test]
    fn test_partially_escaped_quotes_are_unwrapped() {
        let quoted = r#""{\"messageType\":\"X\",\"body\": {\"id":\"incident123\"}}""#;
        assert_eq!(
            normalize_payload(quoted),
            r#"{"messageType":"X","body": {"id":"incident123"}}"#
        );
    }

    #[test]
    fn test_lone_quote_is_left_alone() {
        assert_eq!(normalize_payload("\""), "\"");
    }
}
