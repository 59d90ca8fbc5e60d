//! Sensitive data marker for automatic redaction
//!
//! The `Sensitive<T>` wrapper keeps personal data such as responder phone
//! numbers out of logs and debug output.

use std::fmt;

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use responder_core_types::Sensitive;
///
/// let phone = Sensitive::new("111-222-333");
/// assert_eq!(format!("{:?}", phone), "***REDACTED***");
/// assert_eq!(format!("{}", phone), "***REDACTED***");
///
/// // Access the actual value when needed
/// assert_eq!(phone.expose(), &"111-222-333");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_redaction() {
        let phone = Sensitive::new("555-0100");
        let debug_str = format!("{:?}", phone);
        assert_eq!(debug_str, "***REDACTED***");
        assert!(!debug_str.contains("555"));
    }

    #[test]
    fn test_sensitive_into_inner() {
        let phone = Sensitive::new(String::from("555-0100"));
        assert_eq!(phone.into_inner(), "555-0100");
    }

    #[test]
    fn test_sensitive_equality_compares_inner() {
        assert_eq!(Sensitive::new(1), Sensitive::new(1));
        assert_ne!(Sensitive::new(1), Sensitive::new(2));
    }

    #[test]
    fn test_sensitive_inside_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Contact {
            name: String,
            phone: Sensitive<String>,
        }

        let contact = Contact {
            name: "John Doe".to_string(),
            phone: Sensitive::new("111-222-333".to_string()),
        };

        let debug_str = format!("{:?}", contact);
        assert!(debug_str.contains("John Doe"));
        assert!(debug_str.contains("***REDACTED***"));
        assert!(!debug_str.contains("111-222-333"));
    }
}
