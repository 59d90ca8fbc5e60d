use thiserror::Error;

/// Result type alias using ResponderError
pub type Result<T> = std::result::Result<T, ResponderError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure in the service is classified into one of these kinds. Each
/// kind maps to a stable error code for programmatic handling and to a class
/// name that is reported to correlation subscribers when a store write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorKind {
    // Structural/Validation
    InvalidInput,
    NotFound,
    AlreadyExists,

    // Optimistic concurrency
    VersionConflict,

    // Messaging
    MalformedMessage,
    UnsupportedOperation,
    Publish,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Config,

    // Internal
    Internal,
}

impl CoreErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            CoreErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            CoreErrorKind::NotFound => "ERR_NOT_FOUND",
            CoreErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            CoreErrorKind::VersionConflict => "ERR_VERSION_CONFLICT",
            CoreErrorKind::MalformedMessage => "ERR_MALFORMED_MESSAGE",
            CoreErrorKind::UnsupportedOperation => "ERR_UNSUPPORTED_OPERATION",
            CoreErrorKind::Publish => "ERR_PUBLISH",
            CoreErrorKind::Io => "ERR_IO",
            CoreErrorKind::Serialization => "ERR_SERIALIZATION",
            CoreErrorKind::Persistence => "ERR_PERSISTENCE",
            CoreErrorKind::Config => "ERR_CONFIG",
            CoreErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Get the failure class name used in human-readable status messages
    pub fn class_name(&self) -> &'static str {
        match self {
            CoreErrorKind::InvalidInput => "InvalidInput",
            CoreErrorKind::NotFound => "NotFound",
            CoreErrorKind::AlreadyExists => "AlreadyExists",
            CoreErrorKind::VersionConflict => "VersionConflict",
            CoreErrorKind::MalformedMessage => "MalformedMessage",
            CoreErrorKind::UnsupportedOperation => "UnsupportedOperation",
            CoreErrorKind::Publish => "Publish",
            CoreErrorKind::Io => "Io",
            CoreErrorKind::Serialization => "Serialization",
            CoreErrorKind::Persistence => "Persistence",
            CoreErrorKind::Config => "Config",
            CoreErrorKind::Internal => "Internal",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus enough context (operation, entity id,
/// message) to make a log line actionable without the original error value.
#[derive(Debug, Clone)]
pub struct CoreError {
    kind: CoreErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
}

impl CoreError {
    /// Create a new error with the specified kind
    pub fn new(kind: CoreErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> CoreErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for CoreError {}

// ========== End Error Facility ==========

/// Typed failures raised by the reconciliation pipeline
#[derive(Error, Debug, Clone)]
pub enum ResponderError {
    /// A responder record failed validation
    #[error("Invalid responder: {reason}")]
    InvalidResponder { reason: String },

    /// An inbound message of an accepted type could not be decoded
    #[error("Malformed message: {reason}")]
    MalformedMessage { reason: String },

    /// Store or other collaborator failure
    #[error("{0}")]
    Store(CoreError),

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<CoreError> for ResponderError {
    fn from(err: CoreError) -> Self {
        ResponderError::Store(err)
    }
}

impl From<serde_json::Error> for ResponderError {
    fn from(err: serde_json::Error) -> Self {
        ResponderError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from ResponderError to CoreError
impl From<ResponderError> for CoreError {
    fn from(err: ResponderError) -> Self {
        match err {
            ResponderError::InvalidResponder { reason } => {
                CoreError::new(CoreErrorKind::InvalidInput).with_message(reason)
            }

            ResponderError::MalformedMessage { reason } => {
                CoreError::new(CoreErrorKind::MalformedMessage).with_message(reason)
            }

            ResponderError::Store(inner) => inner,

            ResponderError::Serialization { message } => {
                CoreError::new(CoreErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<&ResponderError> for CoreError {
    fn from(err: &ResponderError) -> Self {
        CoreError::from(err.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let kinds = [
            CoreErrorKind::InvalidInput,
            CoreErrorKind::NotFound,
            CoreErrorKind::AlreadyExists,
            CoreErrorKind::VersionConflict,
            CoreErrorKind::MalformedMessage,
            CoreErrorKind::UnsupportedOperation,
            CoreErrorKind::Publish,
            CoreErrorKind::Io,
            CoreErrorKind::Serialization,
            CoreErrorKind::Persistence,
            CoreErrorKind::Config,
            CoreErrorKind::Internal,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_display_includes_context() {
        let err = CoreError::new(CoreErrorKind::Persistence)
            .with_op("merge")
            .with_entity_id("7")
            .with_message("disk full");
        assert_eq!(
            err.to_string(),
            "[ERR_PERSISTENCE] in operation 'merge': disk full (entity_id: 7)"
        );
    }

    #[test]
    fn test_malformed_message_maps_to_kind() {
        let err: CoreError = ResponderError::MalformedMessage {
            reason: "missing body".to_string(),
        }
        .into();
        assert_eq!(err.kind(), CoreErrorKind::MalformedMessage);
        assert_eq!(err.message(), "missing body");
    }

    #[test]
    fn test_version_conflict_class_name() {
        assert_eq!(CoreErrorKind::VersionConflict.class_name(), "VersionConflict");
    }

    #[test]
    fn test_store_error_round_trips_through_domain_error() {
        let inner = CoreError::new(CoreErrorKind::Io).with_message("boom");
        let domain: ResponderError = inner.into();
        let back: CoreError = domain.into();
        assert_eq!(back.kind(), CoreErrorKind::Io);
        assert_eq!(back.message(), "boom");
    }
}
