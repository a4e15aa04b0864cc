/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
use core::fmt::{self, Display, Formatter};

/// Errors produced while parsing, splitting, restoring, or modifying shares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The formula text could not be parsed.
    ParseError {
        /// What the parser expected to find.
        expected: String,
        /// Byte offset into the input where the failure occurred.
        position: usize,
        /// A caret-annotated excerpt of the input around `position`.
        context: String,
    },
    /// Modular inverse was requested for a value that shares a factor with the modulus.
    NotInvertible,
    /// The splitter detected contradictory pre-assigned values.
    Inconsistent(&'static str),
    /// `modify` was given parts that do not restore under the old formula.
    CannotRestore,
    /// The formula AST would violate a structural invariant (child counts, threshold `k`, ...).
    InvalidFormula(&'static str),
    /// A part's values vector length disagreed with the occurrence count during grouping.
    ShapeMismatch,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::ParseError {
                expected,
                position,
                context,
            } => write!(
                f,
                "expected {} at byte {}\n{}",
                expected, position, context
            ),
            Error::NotInvertible => write!(f, "value has no modular inverse under this modulus"),
            Error::Inconsistent(reason) => write!(f, "inconsistent pre-assigned shares: {}", reason),
            Error::CannotRestore => write!(f, "unable to restore secret from the given parts"),
            Error::InvalidFormula(reason) => write!(f, "invalid access formula: {}", reason),
            Error::ShapeMismatch => write!(f, "part values length disagreed with occurrence count"),
        }
    }
}

impl std::error::Error for Error {}

/// Results returned by this crate.
pub type Result<T> = core::result::Result<T, Error>;
