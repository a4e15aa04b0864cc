/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
//! A participant's share values and their wire encoding.

use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// One participant's shares: `values[j]` is the share for the `(name, j+1)`
/// VAR occurrence. Each value is written through [`crate::bigint_text`] as a
/// decimal string, which is how this crate satisfies "serialization must
/// preserve full precision" for moduli wider than any fixed-width integer --
/// `num-bigint`'s own derived (de)serialization writes a digit array, not
/// text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// The participant's name as written in the access formula.
    pub name: String,
    /// Share values, one per occurrence of `name`, in occurrence order.
    #[serde(with = "crate::bigint_text::vec")]
    pub values: Vec<BigUint>,
}

impl Part {
    /// Construct a part directly.
    pub fn new(name: impl Into<String>, values: Vec<BigUint>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Encode as `{"name": ..., "values": [...]}`, UTF-8, URL-safe Base64
    /// without padding.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("Part serializes infallibly");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Inverse of [`Part::encode`].
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| Error::InvalidFormula("part is not valid base64"))?;
        serde_json::from_slice(&bytes).map_err(|_| Error::InvalidFormula("part is not valid JSON"))
    }
}
