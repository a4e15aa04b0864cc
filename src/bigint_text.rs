/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
//! Decimal-text `serde` shim for `BigUint`.
//!
//! `num-bigint`'s own derived `Serialize`/`Deserialize` impls (enabled by its
//! `serde` feature) write a `BigUint` as its little-endian base-2^32 digit
//! array, e.g. `[91]` or `[4294967295, 1]`, not as a number or a decimal
//! string. That loses the human-readable, arbitrary-precision text form this
//! crate's wire format requires, so every `BigUint` field uses this shim via
//! `#[serde(with = "bigint_text")]` (or `bigint_text::vec` for `Vec<BigUint>`)
//! instead of deriving directly.

use num_bigint::BigUint;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serialize a single `BigUint` as a decimal string.
pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    value.to_str_radix(10).serialize(serializer)
}

/// Deserialize a single `BigUint` from a decimal string.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
    let text = String::deserialize(deserializer)?;
    BigUint::parse_bytes(text.as_bytes(), 10).ok_or_else(|| D::Error::custom("not a decimal integer"))
}

/// The same shim for `Vec<BigUint>`, for fields like `Part::values`.
pub mod vec {
    use super::*;

    /// Serialize each `BigUint` in the slice as a decimal string.
    pub fn serialize<S: Serializer>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error> {
        let texts: Vec<String> = values.iter().map(|v| v.to_str_radix(10)).collect();
        texts.serialize(serializer)
    }

    /// Deserialize a `Vec<BigUint>` from a list of decimal strings.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BigUint>, D::Error> {
        let texts = Vec::<String>::deserialize(deserializer)?;
        texts
            .into_iter()
            .map(|text| BigUint::parse_bytes(text.as_bytes(), 10).ok_or_else(|| D::Error::custom("not a decimal integer")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Single(#[serde(with = "super")] BigUint);

    #[derive(Serialize, Deserialize)]
    struct Many(#[serde(with = "super::vec")] Vec<BigUint>);

    #[test]
    fn single_value_serializes_as_a_decimal_string() {
        let json = serde_json::to_string(&Single(BigUint::from(91u32))).unwrap();
        assert_eq!(json, "\"91\"");
    }

    #[test]
    fn vec_serializes_as_a_list_of_decimal_strings() {
        let json = serde_json::to_string(&Many(vec![BigUint::from(91u32), BigUint::from(39u32)])).unwrap();
        assert_eq!(json, "[\"91\",\"39\"]");
    }

    #[test]
    fn round_trips_a_value_beyond_u128() {
        let huge = BigUint::parse_bytes(b"123456789012345678901234567890123456789012345", 10).unwrap();
        let json = serde_json::to_string(&Single(huge.clone())).unwrap();
        let decoded: Single = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.0, huge);
    }

    #[test]
    fn rejects_non_decimal_text() {
        let result: Result<Single, _> = serde_json::from_str("\"not a number\"");
        assert!(result.is_err());
    }
}
