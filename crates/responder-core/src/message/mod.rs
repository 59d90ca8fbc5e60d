//! Bus message envelope and the bodies this service reads and writes

pub mod body;
pub mod envelope;

pub use body::{
    EventStatus, RespondersCreatedEvent, RespondersDeletedEvent, ResponderUpdatedEvent,
    UpdateResponderCommand,
};
pub use envelope::{probe_message_type, Message};
