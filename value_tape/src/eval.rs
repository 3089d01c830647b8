// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Forward evaluation of a recorded tape.

use core::fmt;

use crate::atomic::AtomicRegistry;
use crate::op::{CallOp, OpKind, ValOp as _};
use crate::tape::Tape;
use crate::value::Scalar;

impl<V: Scalar> Tape<V> {
    /// Executes every recorded invocation, in recording order, against
    /// `val`.
    ///
    /// `val` must have length [`Self::n_val`]. Its first `n_ind` slots are
    /// the caller-supplied inputs; every other slot is written by the pass
    /// (slot `n_ind` receives the sentinel NaN). Recording order plus the
    /// no-forward-reference invariant make a single forward pass sufficient.
    ///
    /// `compare_mismatch` is incremented once per comparison whose recorded
    /// relation does not hold for the current buffer; the count is a signal
    /// for downstream consumers and is not interpreted here.
    ///
    /// When `trace` is supplied, every invocation writes one diagnostic
    /// block to the sink; call invocations are headed by their registered
    /// function name. Sink errors are swallowed — tracing never affects
    /// evaluation.
    ///
    /// # Panics
    ///
    /// Panics if `val` has the wrong length or if a call invocation is bound
    /// to an unregistered function id.
    pub fn eval(
        &self,
        registry: &AtomicRegistry<V>,
        mut trace: Option<&mut dyn fmt::Write>,
        compare_mismatch: &mut usize,
        val: &mut [V],
    ) {
        assert_eq!(
            val.len(),
            self.n_val(),
            "value buffer must have length n_val"
        );
        let arg_all = self.arg_all();
        let con_all = self.con_all();
        for rec in self.ops() {
            let op = rec.kind.op::<V>();
            let arg_index = rec.arg_index as usize;
            let res_index = rec.res_index as usize;
            op.eval(
                registry,
                arg_index,
                arg_all,
                con_all,
                res_index,
                compare_mismatch,
                val,
            );
            if let Some(out) = trace.as_deref_mut() {
                let name = match rec.kind {
                    OpKind::Call => registry.name(CallOp::fun_id(arg_index, arg_all)),
                    _ => "",
                };
                let _ = op.print(out, name, arg_index, arg_all, res_index, val);
            }
        }
    }
}
