use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::decimal;
use crate::errors::{ResponderError, Result};

/// Store-assigned responder identifier
///
/// Written as a string on the wire; accepted as a string or an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResponderId(i64);

impl ResponderId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ResponderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ResponderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResponderId {
    type Err = ResponderError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| ResponderError::InvalidResponder {
                reason: format!("'{}' is not a responder id", s),
            })
    }
}

impl Serialize for ResponderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ResponderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Int(id) => Ok(Self(id)),
            RawId::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A fully populated responder record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Responder {
    pub id: ResponderId,
    pub name: String,
    pub phone_number: String,
    #[serde(with = "decimal::required")]
    pub latitude: BigDecimal,
    #[serde(with = "decimal::required")]
    pub longitude: BigDecimal,
    pub boat_capacity: i32,
    pub medical_kit: bool,
    pub available: bool,
    pub person: bool,
    pub enrolled: bool,
}

/// A responder record that has not been assigned an id yet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewResponder {
    pub name: String,
    pub phone_number: String,
    #[serde(with = "decimal::required")]
    pub latitude: BigDecimal,
    #[serde(with = "decimal::required")]
    pub longitude: BigDecimal,
    pub boat_capacity: i32,
    pub medical_kit: bool,
    pub available: bool,
    pub person: bool,
    pub enrolled: bool,
}

impl NewResponder {
    /// Check the record before it reaches a store
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponder` for an empty name or a negative boat capacity.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ResponderError::InvalidResponder {
                reason: "name must not be empty".to_string(),
            });
        }
        if self.boat_capacity < 0 {
            return Err(ResponderError::InvalidResponder {
                reason: format!("boat capacity {} is negative", self.boat_capacity),
            });
        }
        Ok(())
    }

    /// Attach the id the store assigned
    pub fn into_responder(self, id: ResponderId) -> Responder {
        Responder {
            id,
            name: self.name,
            phone_number: self.phone_number,
            latitude: self.latitude,
            longitude: self.longitude,
            boat_capacity: self.boat_capacity,
            medical_kit: self.medical_kit,
            available: self.available,
            person: self.person,
            enrolled: self.enrolled,
        }
    }
}

/// A record as held by a store, with its optimistic-concurrency version
///
/// The version never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponder {
    pub responder: Responder,
    pub version: u64,
}

impl StoredResponder {
    pub fn id(&self) -> ResponderId {
        self.responder.id
    }
}

/// Enrolment counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponderStats {
    /// Enrolled responders
    pub total: u64,
    /// Enrolled responders currently committed to a mission
    pub active: u64,
}
