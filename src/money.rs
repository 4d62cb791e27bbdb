//! Exact decimal money amounts.
//!
//! Prices and totals are `BigDecimal` in memory and `NUMERIC(12,2)` in
//! Postgres. On the wire they are plain JSON numbers, so clients see `299` or
//! `0.3` rather than quoted strings.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serializer};

pub use sqlx::types::BigDecimal;

/// Parse a decimal literal such as `"349"` or `"0.10"`.
pub fn parse(raw: &str) -> Result<BigDecimal, String> {
    BigDecimal::from_str(raw.trim()).map_err(|e| format!("invalid amount '{}': {}", raw, e))
}

/// Convert a JSON float by its shortest decimal form, so `0.1` becomes exactly
/// `0.1` and not the nearest binary fraction.
pub fn from_f64(value: f64) -> Result<BigDecimal, String> {
    if !value.is_finite() {
        return Err(format!("invalid amount {}", value));
    }
    parse(&value.to_string())
}

pub fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

/// Whether `value` fits the two decimal places the database stores.
pub fn is_whole_cents(value: &BigDecimal) -> bool {
    value.with_scale(2) == *value
}

fn to_f64(value: &BigDecimal) -> Result<f64, String> {
    value
        .to_string()
        .parse::<f64>()
        .map_err(|e| format!("amount {} is not representable: {}", value, e))
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = BigDecimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount as a number or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigDecimal, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigDecimal, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<BigDecimal, E> {
        from_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BigDecimal, E> {
        parse(v).map_err(E::custom)
    }
}

/// `#[serde(with = "crate::money::amount")]`
pub mod amount {
    use super::*;

    pub fn serialize<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
        let number = to_f64(value).map_err(serde::ser::Error::custom)?;
        serializer.serialize_f64(number)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// `#[serde(default, with = "crate::money::optional_amount")]`
pub mod optional_amount {
    use super::*;

    #[derive(Deserialize)]
    struct Amount(#[serde(with = "super::amount")] BigDecimal);

    pub fn serialize<S: Serializer>(value: &Option<BigDecimal>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => super::amount::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BigDecimal>, D::Error> {
        Ok(Option::<Amount>::deserialize(deserializer)?.map(|Amount(value)| value))
    }
}
