// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dead-code elimination.
//!
//! Rebuilds a minimal equivalent tape: a reverse need-marking sweep decides
//! which invocations are kept, then a forward pass re-records the kept ones
//! into a fresh tape while a translation table maps old value indices to
//! their renumbered counterparts. No arithmetic is re-associated, so the
//! rebuilt tape reproduces the dependent outputs bit for bit.

use alloc::vec;
use alloc::vec::Vec;
use core::mem;

use crate::analysis::usage::Usage;
use crate::atomic::AtomicRegistry;
use crate::op::{CALL_HEADER_WORDS, CallOp, Compare, OpKind, ValOp as _};
use crate::tape::{Tape, ValueId};
use crate::value::Scalar;

/// Translation-table entry for values with no counterpart in the new tape.
const UNMAPPED: u32 = u32::MAX;

impl<V: Scalar> Tape<V> {
    /// Replaces this tape with a minimal equivalent rebuild.
    ///
    /// An invocation survives iff some of its results are needed for a
    /// dependent output; comparisons (which have no results) survive iff
    /// `keep_compare` is set and their relation is not [`Compare::No`]. A
    /// kept call may reference inputs the bridge proved irrelevant for
    /// every needed output; those are re-recorded as the sentinel index
    /// rather than keeping their producers alive. Dependent indices are
    /// translated along with everything else, and the rebuilt tape is
    /// swapped in wholesale.
    ///
    /// # Panics
    ///
    /// Panics if the tape is unsealed or was never initialized with
    /// [`Self::set_ind`].
    pub fn dead_code(&mut self, registry: &AtomicRegistry<V>, keep_compare: bool) {
        assert!(
            self.is_sealed(),
            "tape has no dependent set; call set_dep before analysis"
        );
        assert!(
            self.n_op() > 0,
            "tape has not been initialized; call set_ind first"
        );

        let snapshot = self.constant_snapshot(registry);
        let mut usage = self.seeded_usage();
        self.mark_needed(registry, &snapshot, &mut usage, keep_compare);

        let mut new_tape = Self::new();
        let sentinel = new_tape.set_ind(self.n_ind());

        // Independents and the sentinel keep their indices; everything else
        // is unmapped until (and unless) its producer is re-recorded.
        let mut new_index = vec![UNMAPPED; self.n_val()];
        for (i, slot) in new_index.iter_mut().enumerate().take(self.n_ind() + 1) {
            *slot = u32::try_from(i).expect("value buffer exceeds u32 index space");
        }

        let arg_all = self.arg_all();
        let mut operands: Vec<ValueId> = Vec::new();

        // ops[0] is the sentinel constant, already present in the new tape.
        for rec in self.ops().iter().skip(1) {
            let op = rec.kind.op::<V>();
            let arg_index = rec.arg_index as usize;
            let res_index = rec.res_index as usize;
            match rec.kind {
                OpKind::Add | OpKind::Sub | OpKind::Neg => {
                    if !usage[res_index].is_needed() {
                        continue;
                    }
                    let n_arg = op.n_arg(arg_index, arg_all);
                    operands.clear();
                    for &old in &arg_all[arg_index..arg_index + n_arg] {
                        operands.push(translate(&new_index, old));
                    }
                    new_index[res_index] = new_tape.record_op(rec.kind, &operands).0;
                }
                OpKind::Con => {
                    if !usage[res_index].is_needed() {
                        continue;
                    }
                    let value = self.con_all()[arg_all[arg_index] as usize];
                    new_index[res_index] = new_tape.record_con_op(value).0;
                }
                OpKind::Comp => {
                    let tag = arg_all[arg_index];
                    if !keep_compare || tag == Compare::No.tag() {
                        continue;
                    }
                    let Some(compare) = Compare::from_tag(tag) else {
                        panic!("unknown comparison tag {tag}");
                    };
                    let left = translate(&new_index, arg_all[arg_index + 1]);
                    let right = translate(&new_index, arg_all[arg_index + 2]);
                    new_tape.record_comp_op(compare, left, right);
                }
                OpKind::Call => {
                    let n_arg = op.n_arg(arg_index, arg_all);
                    let n_res = op.n_res(arg_index, arg_all);
                    if !(0..n_res).any(|k| usage[res_index + k].is_needed()) {
                        continue;
                    }
                    operands.clear();
                    for &old in &arg_all[arg_index + CALL_HEADER_WORDS..arg_index + n_arg] {
                        if usage[old as usize].is_needed() {
                            operands.push(translate(&new_index, old));
                        } else {
                            // The bridge proved every needed output ignores
                            // this input; the sentinel stands in.
                            operands.push(sentinel);
                        }
                    }
                    let first = new_tape.record_call_op(
                        CallOp::fun_id(arg_index, arg_all),
                        CallOp::call_id(arg_index, arg_all),
                        n_res,
                        &operands,
                    );
                    for (offset, slot) in new_index[res_index..res_index + n_res]
                        .iter_mut()
                        .enumerate()
                    {
                        *slot = first.0
                            + u32::try_from(offset).expect("call result count exceeds u32 space");
                    }
                }
            }
        }

        let new_dep: Vec<ValueId> = self
            .dep()
            .iter()
            .map(|d| translate(&new_index, d.0))
            .collect();
        new_tape.set_dep(&new_dep);

        mem::swap(self, &mut new_tape);
    }
}

fn translate(new_index: &[u32], old: u32) -> ValueId {
    let mapped = new_index[old as usize];
    assert_ne!(
        mapped, UNMAPPED,
        "kept invocation references a value with no counterpart in the rebuilt tape"
    );
    ValueId(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use core::fmt::Write as _;

    #[test]
    fn removes_the_unused_constant() {
        let mut tape = Tape::new();
        tape.set_ind(1);
        let three = tape.record_con_op(3.0);
        let sum = tape.record_op(OpKind::Add, &[ValueId(0), three]);
        let _unused = tape.record_con_op(5.0);
        let out = tape.record_op(OpKind::Sub, &[sum, three]);
        tape.set_dep(&[out]);

        let registry = AtomicRegistry::new();
        tape.dead_code(&registry, false);

        // Sentinel, 3.0, add, sub.
        assert_eq!(tape.n_op(), 4);
        assert_eq!(tape.n_val(), 5);
        assert_eq!(tape.dep(), &[ValueId(4)]);

        let mut val = vec![0.0; tape.n_val()];
        val[0] = 10.0;
        let mut mismatch = 0;
        tape.eval(&registry, None, &mut mismatch, &mut val);
        assert_eq!(val[4], 10.0, "pruned tape reproduces the output");
    }

    #[test]
    fn kept_comparison_operands_stay_live() {
        // The constant 2 is consumed only by the comparison; keeping
        // comparisons must keep it.
        let mut tape = Tape::new();
        tape.set_ind(1);
        let two = tape.record_con_op(2.0);
        tape.record_comp_op(Compare::Lt, ValueId(0), two);
        let out = tape.record_op(OpKind::Neg, &[ValueId(0)]);
        tape.set_dep(&[out]);

        let registry = AtomicRegistry::new();
        let mut kept = tape.clone();
        kept.dead_code(&registry, true);
        assert_eq!(kept.n_op(), 4, "sentinel, constant, comparison, neg");

        let mut mismatch = 0;
        let mut val = vec![0.0; kept.n_val()];
        val[0] = 5.0;
        kept.eval(&registry, None, &mut mismatch, &mut val);
        assert_eq!(mismatch, 1, "5 < 2 no longer holds");

        let mut dropped = tape.clone();
        dropped.dead_code(&registry, false);
        assert_eq!(dropped.n_op(), 2, "comparison and its constant are gone");
    }

    #[test]
    fn no_relation_comparisons_are_always_removed() {
        let mut tape: Tape<f64> = Tape::new();
        tape.set_ind(1);
        tape.record_comp_op(Compare::No, ValueId(0), ValueId(0));
        let out = tape.record_op(OpKind::Neg, &[ValueId(0)]);
        tape.set_dep(&[out]);

        let registry = AtomicRegistry::new();
        tape.dead_code(&registry, true);
        assert_eq!(tape.n_op(), 2, "only the sentinel and the neg remain");
    }

    #[test]
    fn trace_still_prints_after_rebuild() {
        let mut tape = Tape::new();
        tape.set_ind(1);
        let c = tape.record_con_op(1.5);
        let out = tape.record_op(OpKind::Add, &[ValueId(0), c]);
        tape.set_dep(&[out]);

        let registry = AtomicRegistry::new();
        tape.dead_code(&registry, false);

        let mut text = String::new();
        let mut val = vec![0.0; tape.n_val()];
        val[0] = 1.0;
        let mut mismatch = 0;
        tape.eval(&registry, Some(&mut text), &mut mismatch, &mut val);
        let mut expected = String::new();
        writeln!(expected, "    1         nan").unwrap();
        writeln!(expected, "    2         1.5").unwrap();
        writeln!(expected, "    3         2.5").unwrap();
        assert_eq!(text, expected);
    }
}
