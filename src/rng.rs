/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
//! Randomness is an injected capability: deterministic for reproducible
//! tests, a CSPRNG otherwise. Production callers must not reuse a single
//! instance across threads.

use num_bigint::{BigUint, RandBigInt};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// A source of uniform field elements, either a seeded deterministic stream
/// or a cryptographically secure one.
pub enum ShareRng {
    /// Deterministic; byte-identical output across runs for a fixed seed.
    Seeded(ChaCha20Rng),
    /// Seeded from the OS entropy source. Never use for tests expecting
    /// reproducible output.
    Secure(ChaCha20Rng),
}

impl ShareRng {
    /// A deterministic RNG for reproducible splits, e.g. in tests.
    pub fn seeded(seed: u64) -> Self {
        ShareRng::Seeded(ChaCha20Rng::seed_from_u64(seed))
    }

    /// A cryptographically secure RNG drawing from OS entropy.
    pub fn secure() -> Self {
        ShareRng::Secure(ChaCha20Rng::from_entropy())
    }

    /// Draw a value uniformly from `[0, modulus)`.
    pub fn uniform(&mut self, modulus: &BigUint) -> BigUint {
        let rng = match self {
            ShareRng::Seeded(r) | ShareRng::Secure(r) => r,
        };
        rng.gen_biguint_range(&BigUint::from(0u8), modulus)
    }
}
