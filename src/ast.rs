/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
//! Access formula AST: an immutable tree of VAR/AND/OR/THRESHOLD nodes.
//!
//! `Formula<V>` is generic over the leaf payload `V` so the same tree shape
//! serves both the raw parser output (`V = String`) and the indexed formula
//! produced by [`crate::indexer`] (`V = `[`crate::indexer::VarKey`]`). Keeping
//! the AST a plain tree (no sharing, no DAG) is what lets the indexer turn
//! repeated variable names into independently-addressable leaves.

use crate::error::{Error, Result};

/// A node in an access formula.
///
/// Constructed only through the smart constructors below, which enforce the
/// structural invariants: VAR has no children; AND/OR/THRESHOLD have at
/// least one child; a single-child AND/OR collapses to that child; THRESHOLD
/// always stores `1 <= k <= children.len()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Formula<V> {
    /// A named participant leaf.
    Var(V),
    /// Satisfied iff every child is satisfied.
    And(Vec<Formula<V>>),
    /// Satisfied iff any child is satisfied.
    Or(Vec<Formula<V>>),
    /// Satisfied iff at least `k` (the first field) of the children are satisfied.
    Threshold(usize, Vec<Formula<V>>),
}

impl<V> Formula<V> {
    /// Build a VAR leaf.
    pub fn var(name: V) -> Self {
        Formula::Var(name)
    }

    /// Build an AND node, flattening nested ANDs and collapsing to the sole
    /// child when only one is given.
    pub fn and(children: Vec<Formula<V>>) -> Result<Self> {
        Self::flatten_associative(children, Error::InvalidFormula("AND requires at least one child"), |f| {
            matches!(f, Formula::And(_))
        })
        .map(|flat| Self::and_or(flat, true))
    }

    /// Build an OR node, flattening nested ORs and collapsing to the sole
    /// child when only one is given.
    pub fn or(children: Vec<Formula<V>>) -> Result<Self> {
        Self::flatten_associative(children, Error::InvalidFormula("OR requires at least one child"), |f| {
            matches!(f, Formula::Or(_))
        })
        .map(|flat| Self::and_or(flat, false))
    }

    /// Build a THRESHOLD node. THRESHOLD is never flattened.
    pub fn threshold(k: usize, children: Vec<Formula<V>>) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidFormula("threshold k must be at least 1"));
        }
        if children.is_empty() {
            return Err(Error::InvalidFormula("threshold requires at least one child"));
        }
        if k > children.len() {
            return Err(Error::InvalidFormula("threshold k exceeds the number of children"));
        }
        Ok(Formula::Threshold(k, children))
    }

    fn flatten_associative(
        children: Vec<Formula<V>>,
        empty_err: Error,
        is_same_kind: impl Fn(&Formula<V>) -> bool,
    ) -> Result<Vec<Formula<V>>> {
        if children.is_empty() {
            return Err(empty_err);
        }
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            if is_same_kind(&child) {
                match child {
                    Formula::And(grandchildren) | Formula::Or(grandchildren) => flat.extend(grandchildren),
                    other => flat.push(other),
                }
            } else {
                flat.push(child);
            }
        }
        Ok(flat)
    }

    fn and_or(mut flat: Vec<Formula<V>>, is_and: bool) -> Self {
        if flat.len() == 1 {
            return flat.pop().expect("checked len == 1");
        }
        if is_and {
            Formula::And(flat)
        } else {
            Formula::Or(flat)
        }
    }

    /// Top-down rewrite: apply `f` to a node, then recurse into whatever
    /// children the rewritten node has. `f` must preserve the non-VAR
    /// structural invariants (child counts, threshold bounds) of whatever
    /// node it returns.
    pub fn rewrite(self, f: &mut impl FnMut(Formula<V>) -> Formula<V>) -> Formula<V> {
        match f(self) {
            Formula::Var(v) => Formula::Var(v),
            Formula::And(children) => {
                Formula::And(children.into_iter().map(|c| c.rewrite(f)).collect())
            }
            Formula::Or(children) => {
                Formula::Or(children.into_iter().map(|c| c.rewrite(f)).collect())
            }
            Formula::Threshold(k, children) => {
                Formula::Threshold(k, children.into_iter().map(|c| c.rewrite(f)).collect())
            }
        }
    }

    /// Collect every VAR payload in left-to-right pre-order.
    pub fn leaves(&self) -> Vec<&V> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a V>) {
        match self {
            Formula::Var(v) => out.push(v),
            Formula::And(children) | Formula::Or(children) | Formula::Threshold(_, children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Formula<String> {
        Formula::var(s.to_string())
    }

    #[test]
    fn and_flattens_nested_ands() {
        let nested = Formula::and(vec![v("a"), v("b")]).unwrap();
        let flat = Formula::and(vec![nested, v("c")]).unwrap();
        assert_eq!(flat, Formula::And(vec![v("a"), v("b"), v("c")]));
    }

    #[test]
    fn single_child_and_collapses() {
        let f = Formula::and(vec![v("a")]).unwrap();
        assert_eq!(f, v("a"));
    }

    #[test]
    fn threshold_is_never_flattened() {
        let inner = Formula::threshold(1, vec![v("a"), v("b")]).unwrap();
        let outer = Formula::threshold(1, vec![inner.clone(), v("c")]).unwrap();
        match outer {
            Formula::Threshold(_, children) => assert_eq!(children[0], inner),
            _ => panic!("expected threshold"),
        }
    }

    #[test]
    fn threshold_rejects_k_greater_than_children() {
        assert!(Formula::threshold(3, vec![v("a"), v("b")]).is_err());
    }

    #[test]
    fn threshold_rejects_zero_k() {
        assert!(Formula::threshold(0, vec![v("a")]).is_err());
    }

    #[test]
    fn rewrite_preserves_shape_for_identity() {
        let f = Formula::and(vec![v("a"), Formula::or(vec![v("b"), v("c")]).unwrap()]).unwrap();
        let rewritten = f.clone().rewrite(&mut |n| n);
        assert_eq!(f, rewritten);
    }

    #[test]
    fn leaves_collects_in_pre_order() {
        let f = Formula::and(vec![v("a"), Formula::or(vec![v("b"), v("a")]).unwrap()]).unwrap();
        let names: Vec<&String> = f.leaves();
        assert_eq!(names, vec!["a", "b", "a"]);
    }
}
