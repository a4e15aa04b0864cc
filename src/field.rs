/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
//! Modular arithmetic in Z/pZ over arbitrary-precision integers.
//!
//! `Field` does not require `p` to be prime: addition, subtraction,
//! multiplication and negation are well defined for any modulus. `inv` only
//! succeeds for values coprime to `p`; the splitter and restorer are only
//! guaranteed correct when `p` is prime, per the crate's access-structure
//! contract.

use crate::error::{Error, Result};
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};

/// A modulus and the arithmetic operations defined over it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    modulus: BigUint,
}

impl Field {
    /// Create a field over the given modulus.
    pub fn new(modulus: BigUint) -> Self {
        Self { modulus }
    }

    /// The modulus this field reduces into.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Reduce an arbitrary `BigUint` into `[0, p)`.
    pub fn reduce(&self, value: &BigUint) -> BigUint {
        value % &self.modulus
    }

    /// `(a + b) mod p`
    pub fn add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + b) % &self.modulus
    }

    /// `(a - b) mod p`, always returning a value in `[0, p)`.
    pub fn sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        let a = a % &self.modulus;
        let b = b % &self.modulus;
        if a >= b {
            a - b
        } else {
            &self.modulus - (b - a)
        }
    }

    /// `(a * b) mod p`
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.modulus
    }

    /// `-a mod p`
    pub fn neg(&self, a: &BigUint) -> BigUint {
        let a = a % &self.modulus;
        if a.is_zero() {
            a
        } else {
            &self.modulus - a
        }
    }

    /// Modular inverse of `a` via the extended Euclidean algorithm.
    ///
    /// Fails with [`Error::NotInvertible`] when `gcd(a, p) != 1`; on a prime
    /// `p` this can only happen for `a ≡ 0 (mod p)`.
    pub fn inv(&self, a: &BigUint) -> Result<BigUint> {
        let (gcd, x, _) = extended_gcd(
            &BigInt::from(a % &self.modulus),
            &BigInt::from(self.modulus.clone()),
        );
        if gcd != BigInt::one() {
            return Err(Error::NotInvertible);
        }
        let m = BigInt::from(self.modulus.clone());
        let mut x = x % &m;
        if x.is_negative() {
            x += &m;
        }
        Ok(x.to_biguint().expect("reduced modulo a positive modulus"))
    }

    /// `a / b mod p`, i.e. `a * inv(b) mod p`.
    pub fn div(&self, a: &BigUint, b: &BigUint) -> Result<BigUint> {
        Ok(self.mul(a, &self.inv(b)?))
    }
}

/// Extended Euclidean algorithm: returns `(gcd, x, y)` such that
/// `a*x + b*y == gcd`.
fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let quotient = &old_r / &r;
        let new_r = &old_r - &quotient * &r;
        old_r = r;
        r = new_r;
        let new_s = &old_s - &quotient * &s;
        old_s = s;
        s = new_s;
        let new_t = &old_t - &quotient * &t;
        old_t = t;
        t = new_t;
    }
    (old_r, old_s, old_t)
}
