use serde::{Deserialize, Serialize};

use crate::model::{ResponderId, ResponderPatch};

/// Body of an `UpdateResponderCommand` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponderCommand {
    pub responder: ResponderPatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Success,
    Error,
}

impl EventStatus {
    pub fn from_changed(changed: bool) -> Self {
        if changed {
            EventStatus::Success
        } else {
            EventStatus::Error
        }
    }
}

/// Body of a `ResponderUpdatedEvent` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponderUpdatedEvent {
    pub status: EventStatus,
    pub status_message: String,
    pub responder_id: ResponderId,
}

/// Body of a `RespondersCreatedEvent` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondersCreatedEvent {
    pub created: usize,
    pub responders: Vec<i64>,
}

impl RespondersCreatedEvent {
    pub fn new(ids: &[ResponderId]) -> Self {
        Self {
            created: ids.len(),
            responders: ids.iter().map(ResponderId::get).collect(),
        }
    }
}

/// Body of a `RespondersDeletedEvent` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondersDeletedEvent {
    pub deleted: usize,
    pub responders: Vec<i64>,
}

impl RespondersDeletedEvent {
    pub fn new(ids: &[ResponderId]) -> Self {
        Self {
            deleted: ids.len(),
            responders: ids.iter().map(ResponderId::get).collect(),
        }
    }
}
