// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tape storage and the append-only recording API.
//!
//! A tape owns growable arenas — the flat operand word array, the constant
//! pool, and the invocation list — and every cross-reference is a plain
//! index into one of them, never a pointer, so a tape is trivially clonable
//! and can be rebuilt wholesale (as dead-code elimination does).
//!
//! Recording is strictly append-only. Value indices are assigned in
//! increasing order, and an invocation may only reference indices that
//! already exist; a forward reference is a programming error and fails a
//! fatal assertion, because every later pass (single forward-pass
//! evaluation, reverse analyses) is only correct under that invariant.

use alloc::vec::Vec;

use crate::atomic::{CallId, FunId};
use crate::op::{CALL_HEADER_WORDS, Compare, OpKind, ValOp as _};
use crate::value::Scalar;

/// Index of one slot in a tape's value buffer.
///
/// Indices `[0, n_ind)` are the independent values, index `n_ind` is the
/// sentinel NaN constant, and every recorded result follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(pub u32);

/// One recorded operator invocation.
///
/// `arg_index` is the start of the invocation's operand run in
/// [`Tape::arg_all`]; `res_index` is the start of its result run in the
/// value buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpRecord {
    /// Start of the operand run.
    pub arg_index: u32,
    /// Start of the result run.
    pub res_index: u32,
    /// Operator kind tag.
    pub kind: OpKind,
}

/// An append-only recording of a computation over scalars of type `V`.
#[derive(Clone, Debug)]
pub struct Tape<V> {
    /// Number of independent (input) values.
    n_ind: usize,
    /// Index the next recorded result will receive.
    n_val: usize,
    /// Flat operand word array shared by all invocations.
    arg_all: Vec<u32>,
    /// Invocations in recording order.
    ops: Vec<OpRecord>,
    /// Constant pool.
    con_all: Vec<V>,
    /// Dependent (output) value indices; `None` until the tape is sealed.
    dep: Option<Vec<ValueId>>,
}

impl<V: Scalar> Tape<V> {
    /// Creates an empty tape. Call [`Self::set_ind`] before recording.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_ind: 0,
            n_val: 0,
            arg_all: Vec::new(),
            ops: Vec::new(),
            con_all: Vec::new(),
            dep: None,
        }
    }

    /// Resets all storage and fixes the number of independent values.
    ///
    /// The sentinel NaN constant is recorded immediately at index `n_ind`;
    /// its id is returned so callers can reference "intentionally unused".
    /// This is the first step of every recording.
    pub fn set_ind(&mut self, n_ind: usize) -> ValueId {
        self.n_ind = n_ind;
        self.n_val = n_ind;
        self.arg_all.clear();
        self.ops.clear();
        self.con_all.clear();
        self.dep = None;
        let sentinel = self.record_con_op(V::nan());
        debug_assert_eq!(
            sentinel.0 as usize,
            n_ind,
            "sentinel must land directly after the independents"
        );
        sentinel
    }

    /// Records one fixed-arity arithmetic invocation and returns its result
    /// index.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not an arithmetic kind (constants, comparisons,
    /// and calls have dedicated record methods), if `operands` has the wrong
    /// length, or if any operand index is not yet defined.
    pub fn record_op(&mut self, kind: OpKind, operands: &[ValueId]) -> ValueId {
        assert!(
            matches!(kind, OpKind::Add | OpKind::Sub | OpKind::Neg),
            "record_op only accepts fixed-arity arithmetic kinds"
        );
        let res_index = self.next_res_index();
        let arg_index = self.next_arg_index();
        let op = kind.op::<V>();
        assert_eq!(
            operands.len(),
            op.n_arg(arg_index as usize, &self.arg_all),
            "operand count must match the operator's arity"
        );
        self.ops.push(OpRecord {
            arg_index,
            res_index,
            kind,
        });
        for &operand in operands {
            self.push_operand(operand);
        }
        self.n_val += op.n_res(arg_index as usize, &self.arg_all);
        ValueId(res_index)
    }

    /// Appends `constant` to the pool, records a constant-load invocation,
    /// and returns its result index.
    pub fn record_con_op(&mut self, constant: V) -> ValueId {
        let con_index =
            u32::try_from(self.con_all.len()).expect("constant pool exceeds u32 index space");
        self.con_all.push(constant);
        let res_index = self.next_res_index();
        let arg_index = self.next_arg_index();
        self.ops.push(OpRecord {
            arg_index,
            res_index,
            kind: OpKind::Con,
        });
        self.arg_all.push(con_index);
        self.n_val += 1;
        ValueId(res_index)
    }

    /// Records a comparison invocation asserting `left <compare> right`
    /// held at recording time. Comparisons produce no result values.
    ///
    /// # Panics
    ///
    /// Panics if either operand index is not yet defined.
    pub fn record_comp_op(&mut self, compare: Compare, left: ValueId, right: ValueId) {
        let res_index = self.next_res_index();
        let arg_index = self.next_arg_index();
        self.ops.push(OpRecord {
            arg_index,
            res_index,
            kind: OpKind::Comp,
        });
        self.arg_all.push(compare.tag());
        self.push_operand(left);
        self.push_operand(right);
    }

    /// Records a call invocation bound to `(fun_id, call_id)` producing
    /// `n_res` results, and returns the first result's index.
    ///
    /// # Panics
    ///
    /// Panics if any operand index is not yet defined.
    pub fn record_call_op(
        &mut self,
        fun_id: FunId,
        call_id: CallId,
        n_res: usize,
        operands: &[ValueId],
    ) -> ValueId {
        let res_index = self.next_res_index();
        let arg_index = self.next_arg_index();
        self.ops.push(OpRecord {
            arg_index,
            res_index,
            kind: OpKind::Call,
        });
        let n_arg = u32::try_from(CALL_HEADER_WORDS + operands.len())
            .expect("call operand run exceeds u32 index space");
        self.arg_all.push(n_arg);
        self.arg_all
            .push(u32::try_from(n_res).expect("call result count exceeds u32 index space"));
        self.arg_all.push(fun_id.0);
        self.arg_all.push(call_id.0);
        for &operand in operands {
            self.push_operand(operand);
        }
        self.n_val += n_res;
        ValueId(res_index)
    }

    /// Seals the recording by designating its output indices.
    ///
    /// Calling again overwrites the previous dependent set; this is
    /// intentional and allows re-targeting outputs without re-recording.
    ///
    /// # Panics
    ///
    /// Panics if any index is not yet defined.
    pub fn set_dep(&mut self, dep: &[ValueId]) {
        for &d in dep {
            assert!(
                (d.0 as usize) < self.n_val,
                "dependent index references a value that has not been recorded"
            );
        }
        self.dep = Some(dep.to_vec());
    }

    /// Number of independent values.
    #[must_use]
    pub fn n_ind(&self) -> usize {
        self.n_ind
    }

    /// Number of values defined so far (the required evaluation buffer
    /// length).
    #[must_use]
    pub fn n_val(&self) -> usize {
        self.n_val
    }

    /// Number of recorded invocations, including the sentinel constant.
    #[must_use]
    pub fn n_op(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` once [`Self::set_dep`] has been called.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.dep.is_some()
    }

    /// The dependent set, empty if the tape is unsealed.
    #[must_use]
    pub fn dep(&self) -> &[ValueId] {
        self.dep.as_deref().unwrap_or(&[])
    }

    /// The recorded invocations in recording order.
    #[must_use]
    pub fn ops(&self) -> &[OpRecord] {
        &self.ops
    }

    /// The flat operand word array.
    #[must_use]
    pub fn arg_all(&self) -> &[u32] {
        &self.arg_all
    }

    /// The constant pool.
    #[must_use]
    pub fn con_all(&self) -> &[V] {
        &self.con_all
    }

    fn next_res_index(&self) -> u32 {
        u32::try_from(self.n_val).expect("value buffer exceeds u32 index space")
    }

    fn next_arg_index(&self) -> u32 {
        u32::try_from(self.arg_all.len()).expect("operand array exceeds u32 index space")
    }

    fn push_operand(&mut self, operand: ValueId) {
        assert!(
            (operand.0 as usize) < self.n_val,
            "operand references a value that has not been recorded yet"
        );
        self.arg_all.push(operand.0);
    }
}

impl<V: Scalar> Default for Tape<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_ind_records_the_sentinel() {
        let mut tape = Tape::<f64>::new();
        let sentinel = tape.set_ind(2);
        assert_eq!(sentinel, ValueId(2));
        assert_eq!(tape.n_ind(), 2);
        assert_eq!(tape.n_val(), 3);
        assert_eq!(tape.n_op(), 1);
        assert_eq!(tape.ops()[0].kind, OpKind::Con);
        assert_eq!(tape.arg_all(), &[0]);
        assert!(tape.con_all()[0].is_nan(), "sentinel constant is NaN");
        assert!(!tape.is_sealed());
    }

    #[test]
    fn set_ind_clears_previous_storage() {
        let mut tape = Tape::<f64>::new();
        tape.set_ind(1);
        let c = tape.record_con_op(3.0);
        tape.set_dep(&[c]);

        tape.set_ind(4);
        assert_eq!(tape.n_val(), 5);
        assert_eq!(tape.n_op(), 1);
        assert_eq!(tape.con_all().len(), 1);
        assert!(!tape.is_sealed(), "re-initialization unseals the tape");
    }

    #[test]
    fn record_assigns_increasing_indices() {
        let mut tape = Tape::<f64>::new();
        tape.set_ind(1);
        let c = tape.record_con_op(3.0);
        let s = tape.record_op(OpKind::Add, &[ValueId(0), c]);
        let n = tape.record_op(OpKind::Neg, &[s]);
        assert_eq!((c, s, n), (ValueId(2), ValueId(3), ValueId(4)));
        assert_eq!(tape.n_val(), 5);
    }

    #[test]
    fn call_operand_run_layout() {
        let mut tape = Tape::<f64>::new();
        tape.set_ind(2);
        let first = tape.record_call_op(FunId(7), CallId(9), 2, &[ValueId(0), ValueId(1)]);
        assert_eq!(first, ValueId(3));
        assert_eq!(tape.n_val(), 5, "both call results are allocated");
        // Sentinel pool word, then [n_arg, n_res, fun, call, operands...].
        assert_eq!(tape.arg_all(), &[0, 6, 2, 7, 9, 0, 1]);
    }

    #[test]
    fn comparison_produces_no_values() {
        let mut tape = Tape::<f64>::new();
        tape.set_ind(2);
        let before = tape.n_val();
        tape.record_comp_op(Compare::Lt, ValueId(0), ValueId(1));
        assert_eq!(tape.n_val(), before);
        assert_eq!(tape.ops()[1].kind, OpKind::Comp);
    }

    #[test]
    #[should_panic(expected = "operand references a value that has not been recorded yet")]
    fn forward_reference_is_fatal() {
        let mut tape = Tape::<f64>::new();
        tape.set_ind(1);
        tape.record_op(OpKind::Add, &[ValueId(0), ValueId(9)]);
    }

    #[test]
    #[should_panic(expected = "record_op only accepts fixed-arity arithmetic kinds")]
    fn record_op_rejects_special_kinds() {
        let mut tape = Tape::<f64>::new();
        tape.set_ind(1);
        tape.record_op(OpKind::Con, &[ValueId(0)]);
    }

    #[test]
    fn set_dep_overwrites() {
        let mut tape = Tape::<f64>::new();
        tape.set_ind(1);
        let c = tape.record_con_op(3.0);
        tape.set_dep(&[c]);
        tape.set_dep(&[c, c]);
        assert_eq!(tape.dep(), &[c, c]);
    }
}
