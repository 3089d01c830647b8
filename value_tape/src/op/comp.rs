// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Comparison operator.
//!
//! A recorded comparison asserts that a relation between two values held at
//! recording time. Re-evaluating the tape checks the relation against the
//! current buffer and counts violations in the mismatch counter; downstream
//! consumers use the count to decide whether the recording's control-flow
//! assumptions are still valid for the new inputs. The operator writes no
//! results.

use core::fmt;

use crate::atomic::AtomicRegistry;
use crate::op::{OpKind, ValOp};
use crate::value::Scalar;

/// The relation a comparison invocation asserts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Compare {
    /// `left < right`.
    Lt = 0,
    /// `left <= right`.
    Le = 1,
    /// `left == right`.
    Eq = 2,
    /// `left >= right`.
    Ge = 3,
    /// `left > right`.
    Gt = 4,
    /// `left != right`.
    Ne = 5,
    /// No relation; never counted, always removed by dead-code elimination.
    No = 6,
}

impl Compare {
    /// Returns the stable tag word stored in the operand array.
    #[must_use]
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Parses a tag word back into a relation.
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Lt),
            1 => Some(Self::Le),
            2 => Some(Self::Eq),
            3 => Some(Self::Ge),
            4 => Some(Self::Gt),
            5 => Some(Self::Ne),
            6 => Some(Self::No),
            _ => None,
        }
    }

    fn holds<V: Scalar>(self, left: V, right: V) -> bool {
        match self {
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Eq => left == right,
            Self::Ge => left >= right,
            Self::Gt => left > right,
            Self::Ne => left != right,
            Self::No => true,
        }
    }
}

/// Comparison: operand run is `[tag, left, right]`, zero results.
#[derive(Copy, Clone, Debug, Default)]
pub struct CompOp;

impl<V: Scalar> ValOp<V> for CompOp {
    fn kind(&self) -> OpKind {
        OpKind::Comp
    }

    fn n_arg(&self, _arg_index: usize, _arg_all: &[u32]) -> usize {
        3
    }

    fn n_res(&self, _arg_index: usize, _arg_all: &[u32]) -> usize {
        0
    }

    fn n_before(&self) -> usize {
        1
    }

    fn eval(
        &self,
        _registry: &AtomicRegistry<V>,
        arg_index: usize,
        arg_all: &[u32],
        _con_all: &[V],
        _res_index: usize,
        compare_mismatch: &mut usize,
        val: &mut [V],
    ) {
        let tag = arg_all[arg_index];
        let Some(compare) = Compare::from_tag(tag) else {
            panic!("unknown comparison tag {tag}");
        };
        let left = val[arg_all[arg_index + 1] as usize];
        let right = val[arg_all[arg_index + 2] as usize];
        if !compare.holds(left, right) {
            *compare_mismatch += 1;
        }
    }

    fn print(
        &self,
        _out: &mut dyn fmt::Write,
        _name: &str,
        _arg_index: usize,
        _arg_all: &[u32],
        _res_index: usize,
        _val: &[V],
    ) -> fmt::Result {
        // No results, no lines.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatches(compare: Compare, left: f64, right: f64) -> usize {
        let registry = AtomicRegistry::new();
        let mut count = 0;
        let mut val = [left, right];
        let args = [compare.tag(), 0, 1];
        CompOp.eval(&registry, 0, &args, &[], 0, &mut count, &mut val);
        count
    }

    #[test]
    fn counts_only_violated_relations() {
        assert_eq!(mismatches(Compare::Lt, 1.0, 2.0), 0);
        assert_eq!(mismatches(Compare::Lt, 2.0, 1.0), 1);
        assert_eq!(mismatches(Compare::Eq, 3.0, 3.0), 0);
        assert_eq!(mismatches(Compare::Ne, 3.0, 3.0), 1);
        assert_eq!(mismatches(Compare::Ge, 3.0, 3.0), 0);
        assert_eq!(mismatches(Compare::Gt, 3.0, 3.0), 1);
    }

    #[test]
    fn no_relation_never_counts() {
        assert_eq!(mismatches(Compare::No, 2.0, 1.0), 0);
        assert_eq!(mismatches(Compare::No, 1.0, 2.0), 0);
    }

    #[test]
    fn tag_round_trip() {
        for compare in [
            Compare::Lt,
            Compare::Le,
            Compare::Eq,
            Compare::Ge,
            Compare::Gt,
            Compare::Ne,
            Compare::No,
        ] {
            assert_eq!(Compare::from_tag(compare.tag()), Some(compare), "stable tags");
        }
        assert_eq!(Compare::from_tag(7), None);
    }
}
