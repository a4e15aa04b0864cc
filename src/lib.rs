/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
//! Secret sharing over general monotone access structures.
//!
//! A secret is distributed according to an access formula built from named
//! participants and three combinators: AND (every child must be satisfied),
//! OR (any child suffices), and THRESHOLD (at least `k` of the children
//! suffice, via Shamir's scheme). [`Configuration`] binds a formula and a
//! modulus together and exposes [`Configuration::split`],
//! [`Configuration::restore`], and [`Configuration::modify`] as the crate's
//! primary entry points.
//!
//! ```
//! use monoshare::Configuration;
//! use num_bigint::BigUint;
//!
//! let config = Configuration::new(BigUint::from(101u32), "T2(alice, bob, carol)");
//! let parts = config.split(&BigUint::from(42u32), Some(0), None).unwrap();
//! let restored = config.restore(&parts[..2]).unwrap();
//! assert_eq!(restored.into_value(), Some(BigUint::from(42u32)));
//! ```

mod ast;
mod bigint_text;
mod config;
mod error;
mod field;
mod indexer;
mod parser;
mod part;
mod restorer;
mod rng;
mod splitter;

pub use ast::Formula;
pub use config::Configuration;
pub use error::{Error, Result};
pub use indexer::VarKey;
pub use part::Part;
pub use restorer::Restored;
pub use rng::ShareRng;
pub use splitter::ShareValue;
