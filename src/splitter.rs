/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
//! Lowers a formula and a target secret into per-leaf share values.
//!
//! This is the heart of the design: the VAR/AND/OR/THRESHOLD recursion is
//! straightforward, but when some leaves already carry values (as happens
//! during `modify`), the splitter must detect and reuse them rather than
//! blindly overwrite, while still catching genuine contradictions. See the
//! module-level notes on `is_random` below.

use crate::ast::Formula;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::indexer::VarKey;
use crate::part::Part;
use crate::restorer::{Restored, Restorer};
use crate::rng::ShareRng;
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::{HashMap, HashSet};

/// The value held for a leaf during a split: either a concrete field
/// element, or the "this variable exists in the formula but has no value
/// yet" marker used when seeding a `modify` call. See spec §3's "Share
/// value" and §4.F's discussion of seeding unassigned markers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareValue {
    /// A concrete field element.
    Known(BigUint),
    /// Known to exist, not yet assigned a value.
    Unassigned,
}

/// Produces an assignment map consistent with a target secret, reusing any
/// pre-populated values.
pub struct Splitter {
    field: Field,
    modulus: BigUint,
    rng: ShareRng,
    assigned: HashMap<VarKey, ShareValue>,
    /// Keys assigned from freshly drawn randomness during this walk. Used to
    /// tell "we just picked this ourselves, a conflicting value here is a
    /// bug" apart from "the caller already gave us this, trust it."
    random_keys: HashSet<VarKey>,
}

impl Splitter {
    /// Create a splitter with an optional pre-populated assignment map
    /// (used by `modify`; pass an empty map for a fresh split).
    pub fn new(modulus: BigUint, rng: ShareRng, assigned: HashMap<VarKey, ShareValue>) -> Self {
        Self {
            field: Field::new(modulus.clone()),
            modulus,
            rng,
            assigned,
            random_keys: HashSet::new(),
        }
    }

    /// Split `secret` into `formula`'s leaves. On success every leaf of
    /// `formula` is assigned a concrete value in `self.assigned()`
    /// restoring to `secret`.
    pub fn split(&mut self, secret: &BigUint, formula: &Formula<VarKey>) -> Result<()> {
        let secret = self.field.reduce(secret);
        self.split_node(&secret, formula, false)
    }

    /// Consume the splitter and group its assignments into `Part`s, sorted
    /// by occurrence index, per spec §4.F's grouping contract.
    pub fn into_parts(self) -> Result<Vec<Part>> {
        let mut entries = Vec::with_capacity(self.assigned.len());
        for (key, value) in self.assigned {
            match value {
                ShareValue::Known(v) => entries.push((key, v)),
                ShareValue::Unassigned => return Err(Error::ShapeMismatch),
            }
        }
        entries.sort_by(|(a, _), (b, _)| a.occurrence.cmp(&b.occurrence).then_with(|| a.name.cmp(&b.name)));

        let mut parts: Vec<Part> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();
        for (key, value) in entries {
            let idx = *index_of.entry(key.name.clone()).or_insert_with(|| {
                parts.push(Part::new(key.name.clone(), Vec::new()));
                parts.len() - 1
            });
            let part = &mut parts[idx];
            if key.occurrence != part.values.len() + 1 {
                return Err(Error::ShapeMismatch);
            }
            part.values.push(value);
        }
        Ok(parts)
    }

    fn split_node(&mut self, secret: &BigUint, formula: &Formula<VarKey>, is_random: bool) -> Result<()> {
        match formula {
            Formula::Var(key) => self.assign(key, secret, is_random),
            Formula::Or(children) => {
                for child in children {
                    self.split_node(secret, child, is_random)?;
                }
                Ok(())
            }
            Formula::And(children) => self.split_and(secret, children, is_random),
            Formula::Threshold(k, children) => self.split_threshold(secret, *k, children, is_random),
        }
    }

    fn assign(&mut self, key: &VarKey, value: &BigUint, is_random: bool) -> Result<()> {
        match self.assigned.get(key) {
            None | Some(ShareValue::Unassigned) => {
                self.assigned.insert(key.clone(), ShareValue::Known(value.clone()));
                if is_random {
                    self.random_keys.insert(key.clone());
                }
                Ok(())
            }
            Some(ShareValue::Known(existing)) => {
                if existing == value {
                    Ok(())
                } else if self.random_keys.contains(key) {
                    Err(Error::Inconsistent("a freshly randomized leaf was assigned two different values"))
                } else {
                    // The caller's pre-existing value is authoritative: modify must
                    // leave it untouched rather than overwrite it with ours.
                    Ok(())
                }
            }
        }
    }

    fn concrete_snapshot(&self) -> HashMap<VarKey, BigUint> {
        self.assigned
            .iter()
            .filter_map(|(k, v)| match v {
                ShareValue::Known(b) => Some((k.clone(), b.clone())),
                ShareValue::Unassigned => None,
            })
            .collect()
    }

    fn try_restore(&self, formula: &Formula<VarKey>) -> Result<Restored> {
        let snapshot = self.concrete_snapshot();
        Restorer::new(self.modulus.clone(), &snapshot).restore(formula)
    }

    /// AND: children already restorable under the current assignment are
    /// left as-is (but re-split to make sure every one of their own leaves
    /// is populated); the remaining "free" children receive fresh random
    /// subsecrets except the last, which closes the sum to `secret`.
    fn split_and(&mut self, secret: &BigUint, children: &[Formula<VarKey>], is_random: bool) -> Result<()> {
        let mut known_sum = BigUint::zero();
        let mut free = Vec::new();

        for child in children {
            match self.try_restore(child)? {
                Restored::Value(v) => {
                    known_sum = self.field.add(&known_sum, &v);
                    self.split_node(&v, child, is_random)?;
                }
                Restored::Unknown => free.push(child),
            }
        }

        if free.is_empty() {
            return if known_sum == *secret {
                Ok(())
            } else {
                Err(Error::Inconsistent("AND's already-assigned children do not sum to the target secret"))
            };
        }

        let mut running = known_sum;
        let (last, leading) = free.split_last().expect("free is non-empty");
        for child in leading {
            let r = self.rng.uniform(&self.modulus);
            running = self.field.add(&running, &r);
            self.split_node(&r, child, true)?;
        }
        let closing = self.field.sub(secret, &running);
        self.split_node(&closing, last, !leading.is_empty())
    }

    /// THRESHOLD: reuse the polynomial already implied by assigned children
    /// when one exists and is consistent with `secret`; otherwise draw a
    /// fresh degree-`(k-1)` polynomial with intercept `secret`.
    fn split_threshold(
        &mut self,
        secret: &BigUint,
        k: usize,
        children: &[Formula<VarKey>],
        is_random: bool,
    ) -> Result<()> {
        let recovered = self.try_recover_polynomial(k, children)?;

        let (evaluated, child_is_random) = match recovered {
            Some(evaluated) => {
                if evaluated[0] != *secret {
                    return Err(Error::Inconsistent(
                        "the threshold's existing polynomial disagrees with the target secret",
                    ));
                }
                (evaluated, is_random)
            }
            None => {
                let mut coefficients = Vec::with_capacity(k);
                coefficients.push(secret.clone());
                for _ in 1..k {
                    coefficients.push(self.rng.uniform(&self.modulus));
                }
                let evaluated: Vec<BigUint> = (0..=children.len() as u64)
                    .map(|x| self.horner(&coefficients, x))
                    .collect();
                debug_assert_eq!(&evaluated[0], secret);
                (evaluated, true)
            }
        };

        for (n, child) in children.iter().enumerate() {
            self.split_node(&evaluated[n + 1], child, child_is_random)?;
        }
        Ok(())
    }

    fn try_recover_polynomial(&self, k: usize, children: &[Formula<VarKey>]) -> Result<Option<Vec<BigUint>>> {
        let snapshot = self.concrete_snapshot();
        let restorer = Restorer::new(self.modulus.clone(), &snapshot);
        let mut evaluated = Vec::with_capacity(children.len() + 1);
        for x in 0..=children.len() as u64 {
            match restorer.restore_threshold_at(k, children, &BigUint::from(x))? {
                Restored::Value(v) => evaluated.push(v),
                Restored::Unknown => return Ok(None),
            }
        }
        Ok(Some(evaluated))
    }

    fn horner(&self, coefficients: &[BigUint], x: u64) -> BigUint {
        let x = BigUint::from(x);
        let mut acc = BigUint::zero();
        for c in coefficients.iter().rev() {
            acc = self.field.add(&self.field.mul(&acc, &x), c);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index;
    use crate::parser::parse;
    use std::collections::HashMap as Map;

    fn bu(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn split(formula_text: &str, secret: u64, seed: u64) -> Vec<Part> {
        let formula = index(parse(formula_text).unwrap());
        let mut splitter = Splitter::new(bu(101), ShareRng::seeded(seed), Map::new());
        splitter.split(&bu(secret), &formula).unwrap();
        splitter.into_parts().unwrap()
    }

    fn restore_all(formula_text: &str, parts: &[Part]) -> Option<BigUint> {
        let formula = index(parse(formula_text).unwrap());
        let mut given = Map::new();
        for part in parts {
            for (i, v) in part.values.iter().enumerate() {
                given.insert(
                    VarKey { name: part.name.clone(), occurrence: i + 1 },
                    v.clone(),
                );
            }
        }
        Restorer::new(bu(101), &given).restore(&formula).unwrap().into_value()
    }

    #[test]
    fn or_replicates_the_secret_to_every_branch() {
        let parts = split("a | b | c", 42, 0);
        for part in &parts {
            assert_eq!(part.values, vec![bu(42)]);
        }
    }

    #[test]
    fn and_shares_sum_to_the_secret() {
        let parts = split("a & b & c", 42, 0);
        let sum: BigUint = parts.iter().fold(bu(0), |acc, p| (acc + &p.values[0]) % bu(101));
        assert_eq!(sum, bu(42));
        assert_eq!(restore_all("a & b & c", &parts), Some(bu(42)));
    }

    #[test]
    fn threshold_any_k_of_n_restores() {
        let parts = split("T2(a,b,c)", 42, 0);
        assert_eq!(restore_all("T2(a,b,c)", &parts[..2]), Some(bu(42)));
        assert_eq!(restore_all("T2(a,b,c)", &parts[1..]), Some(bu(42)));
        assert_eq!(restore_all("T2(a,b,c)", &parts[..1]), None);
    }

    #[test]
    fn round_trip_holds_for_a_mixed_formula() {
        let text = "(XXX & T2(x & y, b | c, d, e)) | (b & c & d & e)";
        let parts = split(text, 42, 0);
        assert_eq!(restore_all(text, &parts), Some(bu(42)));
    }

    #[test]
    fn splitting_is_deterministic_under_a_fixed_seed() {
        let a = split("a & b & c", 42, 0);
        let b = split("a & b & c", 42, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn modify_preserves_existing_values_and_extends_the_polynomial() {
        let old_formula = index(parse("T2(a,b,c)").unwrap());
        let mut splitter = Splitter::new(bu(101), ShareRng::seeded(0), Map::new());
        splitter.split(&bu(42), &old_formula).unwrap();
        let old_parts = splitter.into_parts().unwrap();

        let mut seed_map = Map::new();
        for part in old_parts.iter().filter(|p| p.name != "c") {
            seed_map.insert(
                VarKey { name: part.name.clone(), occurrence: 1 },
                ShareValue::Known(part.values[0].clone()),
            );
        }
        let new_formula = index(parse("T2(a,b,c,d)").unwrap());
        let mut splitter = Splitter::new(bu(101), ShareRng::seeded(1), seed_map);
        splitter.split(&bu(42), &new_formula).unwrap();
        let new_parts = splitter.into_parts().unwrap();

        for part in &new_parts {
            if part.name != "d" {
                let old = old_parts.iter().find(|p| p.name == part.name).unwrap();
                assert_eq!(part.values, old.values);
            }
        }
        assert_eq!(restore_all("T2(a,b,c,d)", &new_parts[..2]), Some(bu(42)));
    }
}
