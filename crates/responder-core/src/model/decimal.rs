//! Serde helpers for high-precision coordinates
//!
//! Coordinates are written as decimal strings so no precision is lost on the
//! way out, and accepted as either JSON numbers or numeric strings on the way
//! in.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecimal {
    Number(serde_json::Number),
    Text(String),
}

impl RawDecimal {
    fn into_decimal<E: serde::de::Error>(self) -> Result<BigDecimal, E> {
        match self {
            RawDecimal::Number(number) => parse_decimal(&number.to_string()),
            RawDecimal::Text(text) => parse_decimal(&text),
        }
        .ok_or_else(|| E::custom("expected a decimal number"))
    }
}

/// Parse a decimal from its textual form
pub fn parse_decimal(raw: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(raw.trim()).ok()
}

/// Read a decimal out of a JSON value holding a number or a numeric string
pub fn decimal_from_value(value: &serde_json::Value) -> Option<BigDecimal> {
    match value {
        serde_json::Value::Number(number) => parse_decimal(&number.to_string()),
        serde_json::Value::String(text) => parse_decimal(text),
        _ => None,
    }
}

pub mod required {
    use super::*;

    pub fn serialize<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
        RawDecimal::deserialize(deserializer)?.into_decimal()
    }
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<BigDecimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&value.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigDecimal>, D::Error> {
        Option::<RawDecimal>::deserialize(deserializer)?
            .map(RawDecimal::into_decimal)
            .transpose()
    }
}
