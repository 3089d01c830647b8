// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atomic-function call operator.
//!
//! The operand run is self-describing:
//!
//! ```text
//! [n_arg, n_res, fun_id, call_id, operand_0, ..., operand_{n_arg - 5}]
//! ```
//!
//! where `n_arg` counts the whole run including the four header words. The
//! header lets generic analyses size the run without consulting the
//! registry.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::atomic::{AtomicRegistry, CallId, FunId};
use crate::op::{OpKind, ValOp};
use crate::trace;
use crate::value::Scalar;

/// Number of header words preceding a call's true operands.
pub const CALL_HEADER_WORDS: usize = 4;

/// External call: marshals its operands, invokes the bridge, copies the
/// outputs into its result run.
#[derive(Copy, Clone, Debug, Default)]
pub struct CallOp;

impl CallOp {
    /// Returns the bound function id from a call operand run.
    #[must_use]
    pub fn fun_id(arg_index: usize, arg_all: &[u32]) -> FunId {
        FunId(arg_all[arg_index + 2])
    }

    /// Returns the bound call id from a call operand run.
    #[must_use]
    pub fn call_id(arg_index: usize, arg_all: &[u32]) -> CallId {
        CallId(arg_all[arg_index + 3])
    }
}

impl<V: Scalar> ValOp<V> for CallOp {
    fn kind(&self) -> OpKind {
        OpKind::Call
    }

    fn n_arg(&self, arg_index: usize, arg_all: &[u32]) -> usize {
        arg_all[arg_index] as usize
    }

    fn n_res(&self, arg_index: usize, arg_all: &[u32]) -> usize {
        arg_all[arg_index + 1] as usize
    }

    fn n_before(&self) -> usize {
        CALL_HEADER_WORDS
    }

    fn eval(
        &self,
        registry: &AtomicRegistry<V>,
        arg_index: usize,
        arg_all: &[u32],
        _con_all: &[V],
        res_index: usize,
        _compare_mismatch: &mut usize,
        val: &mut [V],
    ) {
        let n_arg = arg_all[arg_index] as usize;
        let n_res = arg_all[arg_index + 1] as usize;
        let fun_id = Self::fun_id(arg_index, arg_all);
        let call_id = Self::call_id(arg_index, arg_all);

        let x: Vec<V> = arg_all[arg_index + CALL_HEADER_WORDS..arg_index + n_arg]
            .iter()
            .map(|&operand| val[operand as usize])
            .collect();
        let mut y = vec![V::nan(); n_res];
        registry.get(fun_id).forward(call_id, &x, &mut y);
        val[res_index..res_index + n_res].copy_from_slice(&y);
    }

    fn print(
        &self,
        out: &mut dyn fmt::Write,
        name: &str,
        arg_index: usize,
        arg_all: &[u32],
        res_index: usize,
        val: &[V],
    ) -> fmt::Result {
        let n_arg = arg_all[arg_index] as usize;
        let n_res = arg_all[arg_index + 1] as usize;

        write!(out, "    {name}(")?;
        for (i, operand) in arg_all[arg_index + CALL_HEADER_WORDS..arg_index + n_arg]
            .iter()
            .enumerate()
        {
            if i != 0 {
                write!(out, ", ")?;
            }
            write!(out, "{operand}")?;
        }
        writeln!(out, ")")?;
        for k in 0..n_res {
            trace::write_result_line(out, res_index + k, val[res_index + k])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::string::String;
    use crate::atomic::AtomicFun;

    struct Swap;

    impl AtomicFun<f64> for Swap {
        fn name(&self) -> &str {
            "swap"
        }

        fn forward(&self, _call_id: CallId, x: &[f64], y: &mut [f64]) {
            y[0] = x[1];
            y[1] = x[0];
        }
    }

    #[test]
    fn eval_marshals_and_copies_back() {
        let mut registry = AtomicRegistry::new();
        let fun = registry.register(Box::new(Swap));

        // Call run: n_arg=6, n_res=2, fun, call_id=9, operands 0 and 1.
        let args = [6, 2, fun.0, 9, 0, 1];
        let mut val = [10.0, 20.0, 0.0, 0.0];
        let mut mismatch = 0;
        CallOp.eval(&registry, 0, &args, &[], 2, &mut mismatch, &mut val);
        assert_eq!(&val[2..], &[20.0, 10.0], "outputs land in the result run");
    }

    #[test]
    fn print_emits_name_line_then_results() {
        let mut registry = AtomicRegistry::new();
        let fun = registry.register(Box::new(Swap));

        let args = [6, 2, fun.0, 0, 0, 1];
        let mut val = [10.0, 20.0, 0.0, 0.0];
        let mut mismatch = 0;
        CallOp.eval(&registry, 0, &args, &[], 2, &mut mismatch, &mut val);

        let mut text = String::new();
        ValOp::<f64>::print(&CallOp, &mut text, "swap", 0, &args, 2, &val).unwrap();
        assert_eq!(text, "    swap(0, 1)\n    2          20\n    3          10\n");
    }
}
