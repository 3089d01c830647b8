// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reverse-dependency analysis: classifies every value index by how many
//! live consumers reference it.
//!
//! The classification drives dead-code elimination and tells downstream
//! derivative passes which intermediate values must be retained.
//!
//! Call invocations need one extra ingredient: an external function may
//! ignore some inputs for some outputs, so the analysis first classifies
//! every call input as constant or variable and then asks the bridge's
//! [`crate::atomic::AtomicFun::rev_depend`] which inputs are actually live.
//! Constant classification uses NaN poisoning: one full forward evaluation
//! with every independent slot poisoned; any slot that comes out non-NaN is
//! derivable from the constant pool alone. This costs exactly one extra
//! `O(n_op)` evaluation per analysis and is sound because [`Scalar`]
//! guarantees poison propagation through arithmetic.

use alloc::vec;
use alloc::vec::Vec;

use crate::atomic::{AtomicRegistry, InputKind};
use crate::op::{CallOp, Compare, OpKind, ValOp as _};
use crate::tape::Tape;
use crate::value::Scalar;

/// How many live consumers reference a value index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Usage {
    /// Not needed to compute any dependent output.
    Unused = 0,
    /// Needed, consumed by exactly one later invocation.
    Once = 1,
    /// Needed by more than one later invocation, or itself a dependent
    /// output.
    Many = 2,
}

impl Usage {
    /// Returns `true` for any class other than [`Usage::Unused`].
    #[must_use]
    pub fn is_needed(self) -> bool {
        self != Self::Unused
    }

    /// Records one more consumer.
    pub(crate) fn touch(&mut self) {
        *self = match *self {
            Self::Unused => Self::Once,
            Self::Once | Self::Many => Self::Many,
        };
    }
}

impl<V: Scalar> Tape<V> {
    /// Classifies every value index by its live consumers.
    ///
    /// Dependent indices start at [`Usage::Many`]; the invocation list is
    /// then scanned in reverse, and each invocation whose results are needed
    /// promotes its true operands. Marking only ever promotes, so the
    /// returned classes satisfy: class [`Usage::Unused`] iff the index
    /// contributes to no dependent output, directly or through a call
    /// dependency.
    ///
    /// # Panics
    ///
    /// Panics if the tape is unsealed (no dependent set).
    #[must_use]
    pub fn rev_depend(&self, registry: &AtomicRegistry<V>) -> Vec<Usage> {
        assert!(
            self.is_sealed(),
            "tape has no dependent set; call set_dep before analysis"
        );
        let snapshot = self.constant_snapshot(registry);
        let mut usage = self.seeded_usage();
        self.mark_needed(registry, &snapshot, &mut usage, false);
        usage
    }

    /// Evaluates the whole tape with poisoned independents.
    ///
    /// In the returned buffer, a non-NaN slot is a value derivable purely
    /// from the constant pool. Comparison mismatches against the poisoned
    /// inputs are meaningless and are discarded.
    pub(crate) fn constant_snapshot(&self, registry: &AtomicRegistry<V>) -> Vec<V> {
        let mut val = vec![V::nan(); self.n_val()];
        let mut discarded = 0;
        self.eval(registry, None, &mut discarded, &mut val);
        val
    }

    /// Fresh usage vector with the dependent set pre-seeded.
    pub(crate) fn seeded_usage(&self) -> Vec<Usage> {
        let mut usage = vec![Usage::Unused; self.n_val()];
        for &d in self.dep() {
            usage[d.0 as usize] = Usage::Many;
        }
        usage
    }

    /// Reverse need-marking sweep shared by [`Self::rev_depend`] and
    /// dead-code elimination.
    ///
    /// With `comp_live` set, comparisons other than [`Compare::No`] promote
    /// their operands; this is what keeps a retained comparison's operands
    /// alive when dead code is eliminated with comparisons kept.
    pub(crate) fn mark_needed(
        &self,
        registry: &AtomicRegistry<V>,
        snapshot: &[V],
        usage: &mut [Usage],
        comp_live: bool,
    ) {
        let arg_all = self.arg_all();
        let mut con_x: Vec<V> = Vec::new();
        let mut input_kind: Vec<InputKind> = Vec::new();
        let mut depend_y: Vec<bool> = Vec::new();
        let mut depend_x: Vec<bool> = Vec::new();

        for rec in self.ops().iter().rev() {
            let op = rec.kind.op::<V>();
            let arg_index = rec.arg_index as usize;
            let res_index = rec.res_index as usize;
            match rec.kind {
                OpKind::Call => {
                    let n_arg = op.n_arg(arg_index, arg_all);
                    let n_res = op.n_res(arg_index, arg_all);
                    let lo = arg_index + op.n_before();
                    let hi = arg_index + n_arg - op.n_after();
                    let operands = &arg_all[lo..hi];

                    depend_y.clear();
                    depend_y.extend((0..n_res).map(|k| usage[res_index + k].is_needed()));

                    con_x.clear();
                    input_kind.clear();
                    for &operand in operands {
                        let v = snapshot[operand as usize];
                        con_x.push(v);
                        input_kind.push(if v.is_nan() {
                            InputKind::Variable
                        } else {
                            InputKind::Constant
                        });
                    }
                    depend_x.clear();
                    depend_x.resize(operands.len(), false);
                    registry.get(CallOp::fun_id(arg_index, arg_all)).rev_depend(
                        CallOp::call_id(arg_index, arg_all),
                        &con_x,
                        &input_kind,
                        &depend_y,
                        &mut depend_x,
                    );

                    for (&operand, &lives) in operands.iter().zip(depend_x.iter()) {
                        if lives {
                            usage[operand as usize].touch();
                        }
                    }
                }
                OpKind::Comp => {
                    if comp_live && arg_all[arg_index] != Compare::No.tag() {
                        usage[arg_all[arg_index + 1] as usize].touch();
                        usage[arg_all[arg_index + 2] as usize].touch();
                    }
                }
                _ => {
                    if usage[res_index].is_needed() {
                        let n_arg = op.n_arg(arg_index, arg_all);
                        let lo = arg_index + op.n_before();
                        let hi = arg_index + n_arg - op.n_after();
                        for &operand in &arg_all[lo..hi] {
                            usage[operand as usize].touch();
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::ValueId;

    #[test]
    fn classes_for_the_basic_recording() {
        // f(x) = (x + 3) - 3 with an unused constant 5.
        let mut tape = Tape::new();
        tape.set_ind(1);
        let three = tape.record_con_op(3.0);
        let sum = tape.record_op(OpKind::Add, &[ValueId(0), three]);
        let unused = tape.record_con_op(5.0);
        let out = tape.record_op(OpKind::Sub, &[sum, three]);
        tape.set_dep(&[out]);

        let registry = AtomicRegistry::new();
        let usage = tape.rev_depend(&registry);
        assert_eq!(usage[0], Usage::Once, "x feeds the add only");
        assert_eq!(usage[1], Usage::Unused, "nothing consumes the sentinel");
        assert_eq!(usage[three.0 as usize], Usage::Many, "3 feeds add and sub");
        assert_eq!(usage[sum.0 as usize], Usage::Once);
        assert_eq!(usage[unused.0 as usize], Usage::Unused);
        assert_eq!(usage[out.0 as usize], Usage::Many, "dependents are class two");
    }

    #[test]
    fn comparisons_contribute_no_liveness() {
        let mut tape = Tape::new();
        tape.set_ind(1);
        let c = tape.record_con_op(2.0);
        tape.record_comp_op(Compare::Lt, ValueId(0), c);
        let out = tape.record_op(OpKind::Neg, &[ValueId(0)]);
        tape.set_dep(&[out]);

        let registry = AtomicRegistry::new();
        let usage = tape.rev_depend(&registry);
        assert_eq!(usage[c.0 as usize], Usage::Unused, "only the comparison saw it");
    }

    #[test]
    #[should_panic(expected = "tape has no dependent set")]
    fn analysis_requires_a_sealed_tape() {
        let mut tape = Tape::<f64>::new();
        tape.set_ind(1);
        let registry = AtomicRegistry::new();
        let _ = tape.rev_depend(&registry);
    }
}
