/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
//! The public façade: binds a modulus and formula text together and
//! orchestrates parse -> index -> splitter/restorer -> group for callers.

use crate::ast::Formula;
use crate::error::{Error, Result};
use crate::indexer::{index, VarKey};
use crate::parser::parse;
use crate::part::Part;
use crate::restorer::{Restored, Restorer};
use crate::rng::ShareRng;
use crate::splitter::{ShareValue, Splitter};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

fn default_version() -> u32 {
    1
}

/// Binds a modulus, an access formula, and a format version. Immutable
/// once built; `version` is reserved for forward compatibility and does
/// not otherwise affect behavior.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// The prime (or at least odd-enough-to-be-treated-as-prime) modulus.
    #[serde(with = "crate::bigint_text")]
    pub modulo: BigUint,
    /// Access formula text, parsed fresh on every call.
    pub formula: String,
    /// Opaque forward-compatibility marker.
    #[serde(default = "default_version")]
    pub version: u32,
}

impl Configuration {
    /// Build a configuration with `version` defaulted to `1`.
    pub fn new(modulo: BigUint, formula: impl Into<String>) -> Self {
        Self {
            modulo,
            formula: formula.into(),
            version: default_version(),
        }
    }

    /// Override the format version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    fn parsed(&self) -> Result<Formula<String>> {
        parse(&self.formula)
    }

    fn indexed_formula(&self) -> Result<Formula<VarKey>> {
        Ok(index(self.parsed()?))
    }

    /// The distinct participant names mentioned anywhere in the formula.
    pub fn names(&self) -> Result<BTreeSet<String>> {
        Ok(self.parsed()?.leaves().into_iter().cloned().collect())
    }

    /// True iff the top-level node is a THRESHOLD whose every child is a
    /// bare VAR: a single flat Shamir scheme. Other topologies may not
    /// admit a correct [`Configuration::modify`] (see DESIGN.md's notes
    /// on AND-shrinking and OR-branch removal).
    pub fn is_modifiable(&self) -> Result<bool> {
        let formula = self.parsed()?;
        Ok(match &formula {
            Formula::Threshold(_, children) => children.iter().all(|c| matches!(c, Formula::Var(_))),
            _ => false,
        })
    }

    /// Split `secret` into parts satisfying the formula.
    ///
    /// `seed` selects a deterministic RNG (reproducible, for tests) versus a
    /// cryptographically secure one drawn from OS entropy. `assigned`
    /// optionally pre-populates leaf values (used internally by
    /// [`Configuration::modify`]; most callers pass `None`).
    pub fn split(&self, secret: &BigUint, seed: Option<u64>, assigned: Option<&[Part]>) -> Result<Vec<Part>> {
        let formula = self.indexed_formula()?;
        let seeded = assigned.map(parts_to_known_map).unwrap_or_default();
        let mut splitter = Splitter::new(self.modulo.clone(), rng_for(seed), seeded);
        splitter.split(secret, &formula)?;
        splitter.into_parts()
    }

    /// Evaluate the formula against `parts`, returning the secret or
    /// [`Restored::Unknown`] if `parts` do not satisfy the formula.
    pub fn restore(&self, parts: &[Part]) -> Result<Restored> {
        let formula = self.indexed_formula()?;
        let given = parts_to_value_map(parts);
        Restorer::new(self.modulo.clone(), &given).restore(&formula)
    }

    /// Re-share the same secret under `new`'s formula, preserving the value
    /// of every `(name, occurrence)` leaf common to both formulas.
    ///
    /// Fails with [`Error::CannotRestore`] if `parts` do not restore under
    /// `self`'s (the old) formula.
    pub fn modify(&self, new: &Configuration, parts: &[Part], seed: Option<u64>) -> Result<Vec<Part>> {
        let secret = match self.restore(parts)? {
            Restored::Value(v) => v,
            Restored::Unknown => return Err(Error::CannotRestore),
        };

        let given = parts_to_value_map(parts);
        let new_formula = new.indexed_formula()?;

        let mut seeded: HashMap<VarKey, ShareValue> = HashMap::new();
        for key in new_formula.leaves() {
            let value = given
                .get(key)
                .cloned()
                .map(ShareValue::Known)
                .unwrap_or(ShareValue::Unassigned);
            seeded.insert(key.clone(), value);
        }

        let mut splitter = Splitter::new(new.modulo.clone(), rng_for(seed), seeded);
        splitter.split(&secret, &new_formula)?;
        splitter.into_parts()
    }

    /// Encode as `{"modulo", "formula", "version"}`, UTF-8, URL-safe
    /// Base64 without padding.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("Configuration serializes infallibly");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Inverse of [`Configuration::encode`].
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| Error::InvalidFormula("configuration is not valid base64"))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| Error::InvalidFormula("configuration is not valid JSON"))
    }
}

fn rng_for(seed: Option<u64>) -> ShareRng {
    match seed {
        Some(s) => ShareRng::seeded(s),
        None => ShareRng::secure(),
    }
}

fn parts_to_value_map(parts: &[Part]) -> HashMap<VarKey, BigUint> {
    let mut map = HashMap::new();
    for part in parts {
        for (i, value) in part.values.iter().enumerate() {
            map.insert(
                VarKey {
                    name: part.name.clone(),
                    occurrence: i + 1,
                },
                value.clone(),
            );
        }
    }
    map
}

fn parts_to_known_map(parts: &[Part]) -> HashMap<VarKey, ShareValue> {
    parts_to_value_map(parts)
        .into_iter()
        .map(|(k, v)| (k, ShareValue::Known(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use rstest::rstest;

    fn bu(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn config(formula: &str) -> Configuration {
        Configuration::new(bu(101), formula)
    }

    #[rstest]
    #[case("a | b | c")]
    #[case("a & b & c")]
    #[case("T2(a,b,c)")]
    #[case("T3(a,b,c,d,e)")]
    #[case("(XXX & T2(x & y, b | c, d, e)) | (b & c & d & e)")]
    fn round_trip_restores_the_original_secret(#[case] formula: &str) {
        let conf = config(formula);
        let parts = conf.split(&bu(42), Some(0), None).unwrap();
        assert_eq!(conf.restore(&parts).unwrap(), Restored::Value(bu(42)));
    }

    #[test]
    fn deterministic_seed_reproduces_byte_identical_parts() {
        let conf = config("T3(a,b,c,d,e)");
        let p1 = conf.split(&bu(42), Some(7), None).unwrap();
        let p2 = conf.split(&bu(42), Some(7), None).unwrap();
        assert_eq!(p1, p2);
    }

    #[test]
    fn restoring_twice_is_idempotent() {
        let conf = config("T2(a,b,c)");
        let parts = conf.split(&bu(42), Some(0), None).unwrap();
        assert_eq!(conf.restore(&parts[..2]).unwrap(), conf.restore(&parts[..2]).unwrap());
    }

    #[test]
    fn names_returns_every_distinct_participant() {
        let conf = config("a & (a | b) & T2(c, d)");
        let name_set = conf.names().unwrap();
        let names: Vec<&str> = name_set.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn is_modifiable_true_only_for_flat_threshold_of_vars() {
        assert!(config("T2(a,b,c)").is_modifiable().unwrap());
        assert!(!config("T2(a,b|c,d)").is_modifiable().unwrap());
        assert!(!config("a & b").is_modifiable().unwrap());
        assert!(!config("a | b").is_modifiable().unwrap());
    }

    #[test]
    fn modify_preserves_secret_and_common_shares() {
        let old = config("T2(a,b,c)");
        let new = config("T2(a,b,c,d)");
        let old_parts = old.split(&bu(42), Some(0), None).unwrap();
        let given: Vec<Part> = old_parts.iter().filter(|p| p.name != "c").cloned().collect();

        let new_parts = old.modify(&new, &given, Some(1)).unwrap();
        assert_eq!(new.restore(&new_parts).unwrap(), Restored::Value(bu(42)));

        for part in &given {
            let preserved = new_parts.iter().find(|p| p.name == part.name).unwrap();
            assert_eq!(preserved.values, part.values);
        }
    }

    #[test]
    fn modify_fails_if_old_parts_do_not_restore() {
        let old = config("T2(a,b,c)");
        let new = config("T2(a,b,c,d)");
        let bogus = vec![Part::new("a", vec![bu(1)])];
        assert_eq!(old.modify(&new, &bogus, Some(1)), Err(Error::CannotRestore));
    }

    #[test]
    fn encode_decode_round_trips() {
        let conf = config("T2(a,b,c)").with_version(3);
        let decoded = Configuration::decode(&conf.encode()).unwrap();
        assert_eq!(conf, decoded);
    }

    #[test]
    fn wire_shape_uses_a_decimal_string_modulus() {
        let conf = config("T2(a,b,c)");
        let json = serde_json::to_string(&conf).unwrap();
        assert_eq!(json, r#"{"modulo":"101","formula":"T2(a,b,c)","version":1}"#);
    }
}
