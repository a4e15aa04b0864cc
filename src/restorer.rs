/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
//! Bottom-up evaluation of a formula against an assignment map, recovering
//! the secret or determining it is unrecoverable.

use crate::ast::Formula;
use crate::error::Result;
use crate::field::Field;
use crate::indexer::VarKey;
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::HashMap;

/// The outcome of evaluating a (sub-)formula against an assignment map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Restored {
    /// The (sub-)formula is satisfied by the given assignments, yielding this value.
    Value(BigUint),
    /// Not enough assignments are present to satisfy the (sub-)formula.
    Unknown,
}

impl Restored {
    /// True when this is [`Restored::Unknown`].
    pub fn is_unknown(&self) -> bool {
        matches!(self, Restored::Unknown)
    }

    /// Converts to `Option<BigUint>`, discarding the distinction documented
    /// in [`Restorer::restore`]'s OR handling.
    pub fn into_value(self) -> Option<BigUint> {
        match self {
            Restored::Value(v) => Some(v),
            Restored::Unknown => None,
        }
    }
}

/// Evaluates an indexed formula against a fixed assignment map.
pub struct Restorer<'a> {
    field: Field,
    given: &'a HashMap<VarKey, BigUint>,
}

impl<'a> Restorer<'a> {
    /// Build a restorer over `given`, operating in the field defined by `modulus`.
    pub fn new(modulus: BigUint, given: &'a HashMap<VarKey, BigUint>) -> Self {
        Self {
            field: Field::new(modulus),
            given,
        }
    }

    /// Evaluate `formula` bottom-up.
    ///
    /// VAR returns the given value or [`Restored::Unknown`]. AND is the
    /// modular sum of its children, or `Unknown` if any child is unknown.
    /// OR returns the first child that restores to a **non-zero** value.
    /// This is a deliberately preserved quirk: a restorable value of exactly zero
    /// is treated the same as "unknown" in an OR branch. This matches the
    /// historical behavior this crate's algorithm was distilled from; a
    /// secret or sub-secret that happens to be zero can make an otherwise
    /// satisfied OR branch look unsatisfied. Callers who cannot tolerate
    /// this should avoid zero-valued secrets under OR.
    pub fn restore(&self, formula: &Formula<VarKey>) -> Result<Restored> {
        match formula {
            Formula::Var(key) => Ok(match self.given.get(key) {
                Some(v) => Restored::Value(v.clone()),
                None => Restored::Unknown,
            }),
            Formula::Or(children) => {
                for child in children {
                    if let Restored::Value(v) = self.restore(child)? {
                        if !v.is_zero() {
                            return Ok(Restored::Value(v));
                        }
                    }
                }
                Ok(Restored::Unknown)
            }
            Formula::And(children) => {
                let mut sum = BigUint::zero();
                for child in children {
                    match self.restore(child)? {
                        Restored::Value(v) => sum = self.field.add(&sum, &v),
                        Restored::Unknown => return Ok(Restored::Unknown),
                    }
                }
                Ok(Restored::Value(sum))
            }
            Formula::Threshold(k, children) => {
                self.restore_threshold_at(*k, children, &BigUint::zero())
            }
        }
    }

    /// Evaluates a THRESHOLD node's implied polynomial at an arbitrary `x`,
    /// rather than only at `x = 0`. Used by the splitter to probe whether a
    /// polynomial consistent with the currently-assigned children already
    /// exists, by evaluating at every `x` from `0` to `children.len()`.
    pub fn restore_threshold_at(
        &self,
        k: usize,
        children: &[Formula<VarKey>],
        x0: &BigUint,
    ) -> Result<Restored> {
        let mut xs = Vec::with_capacity(children.len());
        let mut ys = Vec::with_capacity(children.len());
        for (i, child) in children.iter().enumerate() {
            if let Restored::Value(v) = self.restore(child)? {
                xs.push(BigUint::from(i + 1));
                ys.push(v);
            }
        }
        if xs.len() < k {
            return Ok(Restored::Unknown);
        }
        let secret = self.lagrange_at(x0, &xs[..k], &ys[..k])?;
        Ok(Restored::Value(secret))
    }

    /// Lagrange interpolation of the polynomial implied by `(xs[j], ys[j])`
    /// pairs, evaluated at `x0`.
    fn lagrange_at(&self, x0: &BigUint, xs: &[BigUint], ys: &[BigUint]) -> Result<BigUint> {
        let f = &self.field;
        let mut secret = BigUint::zero();
        for j in 0..xs.len() {
            let mut numerator = num_bigint::BigInt::from(1u8);
            let mut denominator = num_bigint::BigInt::from(1u8);
            for i in 0..xs.len() {
                if i == j {
                    continue;
                }
                let a = big_int_sub(x0, &xs[i]);
                let b = big_int_sub(&xs[j], &xs[i]);
                numerator *= a;
                denominator *= b;
            }
            let numerator = reduce_signed(&numerator, f.modulus());
            let denominator = reduce_signed(&denominator, f.modulus());
            let coefficient = f.div(&numerator, &denominator)?;
            let term = f.mul(&ys[j], &coefficient);
            secret = f.add(&secret, &term);
        }
        Ok(secret)
    }
}

fn big_int_sub(a: &BigUint, b: &BigUint) -> num_bigint::BigInt {
    num_bigint::BigInt::from(a.clone()) - num_bigint::BigInt::from(b.clone())
}

fn reduce_signed(value: &num_bigint::BigInt, modulus: &BigUint) -> BigUint {
    let m = num_bigint::BigInt::from(modulus.clone());
    let mut v = value % &m;
    if v.sign() == num_bigint::Sign::Minus {
        v += &m;
    }
    v.to_biguint().expect("reduced modulo a positive modulus")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index;
    use crate::parser::parse;

    fn bu(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn given(pairs: &[(&str, usize, u64)]) -> HashMap<VarKey, BigUint> {
        pairs
            .iter()
            .map(|(name, occ, v)| {
                (
                    VarKey {
                        name: name.to_string(),
                        occurrence: *occ,
                    },
                    bu(*v),
                )
            })
            .collect()
    }

    #[test]
    fn and_sums_all_children() {
        let f = index(parse("a & b & c").unwrap());
        let g = given(&[("a", 1, 49), ("b", 1, 97), ("c", 1, 98)]);
        let restorer = Restorer::new(bu(101), &g);
        assert_eq!(restorer.restore(&f).unwrap(), Restored::Value(bu(42)));
    }

    #[test]
    fn and_is_unknown_if_any_child_missing() {
        let f = index(parse("a & b").unwrap());
        let g = given(&[("a", 1, 1)]);
        let restorer = Restorer::new(bu(101), &g);
        assert_eq!(restorer.restore(&f).unwrap(), Restored::Unknown);
    }

    #[test]
    fn or_returns_first_nonzero_branch() {
        let f = index(parse("a | b | c").unwrap());
        let g = given(&[("b", 1, 42)]);
        let restorer = Restorer::new(bu(101), &g);
        assert_eq!(restorer.restore(&f).unwrap(), Restored::Value(bu(42)));
    }

    #[test]
    fn or_treats_zero_as_unknown() {
        let f = index(parse("a | b").unwrap());
        let g = given(&[("a", 1, 0), ("b", 1, 7)]);
        let restorer = Restorer::new(bu(101), &g);
        assert_eq!(restorer.restore(&f).unwrap(), Restored::Value(bu(7)));
    }

    #[test]
    fn threshold_reconstructs_from_any_k_shares() {
        let f = index(parse("T2(a,b,c)").unwrap());
        let g = given(&[("a", 1, 91), ("b", 1, 39)]);
        let restorer = Restorer::new(bu(101), &g);
        assert_eq!(restorer.restore(&f).unwrap(), Restored::Value(bu(42)));
    }

    #[test]
    fn threshold_below_k_is_unknown() {
        let f = index(parse("T2(a,b,c)").unwrap());
        let g = given(&[("a", 1, 91)]);
        let restorer = Restorer::new(bu(101), &g);
        assert_eq!(restorer.restore(&f).unwrap(), Restored::Unknown);
    }
}
