use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::decimal;
use super::responder::{Responder, ResponderId};

/// Sparse update to a responder record
///
/// `None` means "leave unchanged": an absent field and an explicit `null`
/// are the same thing. The id addresses the record and is never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponderPatch {
    pub id: ResponderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(
        default,
        with = "decimal::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<BigDecimal>,
    #[serde(
        default,
        with = "decimal::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boat_capacity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_kit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled: Option<bool>,
}

impl ResponderPatch {
    /// A patch that supplies nothing
    pub fn new(id: ResponderId) -> Self {
        Self {
            id,
            name: None,
            phone_number: None,
            latitude: None,
            longitude: None,
            boat_capacity: None,
            medical_kit: None,
            available: None,
            person: None,
            enrolled: None,
        }
    }

    /// A coordinate-only patch as produced by the location path
    pub fn location(id: ResponderId, latitude: BigDecimal, longitude: BigDecimal) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::new(id)
        }
    }

    /// True when no field is supplied
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone_number.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.boat_capacity.is_none()
            && self.medical_kit.is_none()
            && self.available.is_none()
            && self.person.is_none()
            && self.enrolled.is_none()
    }

    /// Overlay the supplied fields on `current`
    ///
    /// The result keeps `current.id` whatever the patch addresses.
    pub fn apply_to(&self, current: &Responder) -> Responder {
        Responder {
            id: current.id,
            name: pick(&self.name, &current.name),
            phone_number: pick(&self.phone_number, &current.phone_number),
            latitude: pick(&self.latitude, &current.latitude),
            longitude: pick(&self.longitude, &current.longitude),
            boat_capacity: self.boat_capacity.unwrap_or(current.boat_capacity),
            medical_kit: self.medical_kit.unwrap_or(current.medical_kit),
            available: self.available.unwrap_or(current.available),
            person: self.person.unwrap_or(current.person),
            enrolled: self.enrolled.unwrap_or(current.enrolled),
        }
    }

    /// Names of the supplied fields whose value differs from `current`
    ///
    /// Coordinates compare numerically, so `30.10` and `30.1` are equal.
    pub fn changes(&self, current: &Responder) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if differs(&self.name, &current.name) {
            changed.push("name");
        }
        if differs(&self.phone_number, &current.phone_number) {
            changed.push("phoneNumber");
        }
        if differs(&self.latitude, &current.latitude) {
            changed.push("latitude");
        }
        if differs(&self.longitude, &current.longitude) {
            changed.push("longitude");
        }
        if differs(&self.boat_capacity, &current.boat_capacity) {
            changed.push("boatCapacity");
        }
        if differs(&self.medical_kit, &current.medical_kit) {
            changed.push("medicalKit");
        }
        if differs(&self.available, &current.available) {
            changed.push("available");
        }
        if differs(&self.person, &current.person) {
            changed.push("person");
        }
        if differs(&self.enrolled, &current.enrolled) {
            changed.push("enrolled");
        }
        changed
    }

    /// True when at least one supplied field differs from `current`
    pub fn differs_from(&self, current: &Responder) -> bool {
        !self.changes(current).is_empty()
    }
}

fn pick<T: Clone>(supplied: &Option<T>, current: &T) -> T {
    supplied.as_ref().unwrap_or(current).clone()
}

fn differs<T: PartialEq>(supplied: &Option<T>, current: &T) -> bool {
    supplied.as_ref().is_some_and(|value| value != current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::decimal::parse_decimal;
    use serde_json::json;

    fn current() -> Responder {
        Responder {
            id: ResponderId::new(1),
            name: "John Doe".to_string(),
            phone_number: "111-222-333".to_string(),
            latitude: parse_decimal("30.12345").unwrap(),
            longitude: parse_decimal("-70.98765").unwrap(),
            boat_capacity: 3,
            medical_kit: true,
            available: true,
            person: true,
            enrolled: true,
        }
    }

    #[test]
    fn test_null_and_absent_are_both_unset() {
        let patch: ResponderPatch =
            serde_json::from_value(json!({"id": "1", "name": null, "available": false})).unwrap();
        assert!(patch.name.is_none());
        assert!(patch.latitude.is_none());
        assert_eq!(patch.available, Some(false));
    }

    #[test]
    fn test_apply_keeps_unset_fields_and_current_id() {
        let mut patch = ResponderPatch::new(ResponderId::new(99));
        patch.boat_capacity = Some(5);
        let candidate = patch.apply_to(&current());
        assert_eq!(candidate.id, ResponderId::new(1));
        assert_eq!(candidate.boat_capacity, 5);
        assert_eq!(candidate.name, "John Doe");
        assert_eq!(candidate.latitude, current().latitude);
    }

    #[test]
    fn test_changes_lists_only_differing_supplied_fields() {
        let mut patch = ResponderPatch::new(ResponderId::new(1));
        patch.available = Some(false);
        patch.enrolled = Some(true);
        patch.latitude = Some(parse_decimal("30.123450").unwrap());
        assert_eq!(patch.changes(&current()), vec!["available"]);
    }

    #[test]
    fn test_empty_patch_never_differs() {
        let patch = ResponderPatch::new(ResponderId::new(1));
        assert!(patch.is_empty());
        assert!(!patch.differs_from(&current()));
    }

    #[test]
    fn test_location_patch_sets_coordinates_only() {
        let patch = ResponderPatch::location(
            ResponderId::new(64),
            parse_decimal("34.1701").unwrap(),
            parse_decimal("-77.9482").unwrap(),
        );
        assert!(!patch.is_empty());
        assert!(patch.name.is_none());
        assert!(patch.available.is_none());
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, json!({"id": "64", "latitude": "34.1701", "longitude": "-77.9482"}));
    }
}
