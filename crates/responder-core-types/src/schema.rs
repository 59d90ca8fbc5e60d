//! Canonical schema constants for structured logging and bus messages
//!
//! These constants keep event names, header keys and message type tags
//! consistent across logging and the wire format.

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Envelope header carrying the incident correlation id
pub const HEADER_INCIDENT_ID: &str = "incidentId";

// Message type tags
pub const MESSAGE_UPDATE_RESPONDER_COMMAND: &str = "UpdateResponderCommand";
pub const MESSAGE_RESPONDER_UPDATED_EVENT: &str = "ResponderUpdatedEvent";
pub const MESSAGE_RESPONDERS_CREATED_EVENT: &str = "RespondersCreatedEvent";
pub const MESSAGE_RESPONDERS_DELETED_EVENT: &str = "RespondersDeletedEvent";

// Name this service stamps on every envelope it produces
pub const INVOKING_SERVICE: &str = "ResponderService";
