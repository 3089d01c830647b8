// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Constant-load operator.

use core::fmt;

use crate::atomic::AtomicRegistry;
use crate::op::{OpKind, ValOp};
use crate::trace;
use crate::value::Scalar;

/// Constant load: `val[res] = con_all[arg0]`.
///
/// The single operand word is an index into the constant pool, not the value
/// buffer, so it is declared as a header word (`n_before = 1`) and generic
/// operand scans see an empty true-operand range.
#[derive(Copy, Clone, Debug, Default)]
pub struct ConOp;

impl<V: Scalar> ValOp<V> for ConOp {
    fn kind(&self) -> OpKind {
        OpKind::Con
    }

    fn n_arg(&self, _arg_index: usize, _arg_all: &[u32]) -> usize {
        1
    }

    fn n_res(&self, _arg_index: usize, _arg_all: &[u32]) -> usize {
        1
    }

    fn n_before(&self) -> usize {
        1
    }

    fn eval(
        &self,
        _registry: &AtomicRegistry<V>,
        arg_index: usize,
        arg_all: &[u32],
        con_all: &[V],
        res_index: usize,
        _compare_mismatch: &mut usize,
        val: &mut [V],
    ) {
        val[res_index] = con_all[arg_all[arg_index] as usize];
    }

    fn print(
        &self,
        out: &mut dyn fmt::Write,
        _name: &str,
        _arg_index: usize,
        _arg_all: &[u32],
        res_index: usize,
        val: &[V],
    ) -> fmt::Result {
        trace::write_result_line(out, res_index, val[res_index])
    }
}
