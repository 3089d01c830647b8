// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-arity arithmetic operators: add, sub, neg.

use core::fmt;

use crate::atomic::AtomicRegistry;
use crate::op::{OpKind, ValOp};
use crate::trace;
use crate::value::Scalar;

/// Binary addition: `val[res] = val[arg0] + val[arg1]`.
#[derive(Copy, Clone, Debug, Default)]
pub struct AddOp;

/// Binary subtraction: `val[res] = val[arg0] - val[arg1]`.
#[derive(Copy, Clone, Debug, Default)]
pub struct SubOp;

/// Unary negation: `val[res] = -val[arg0]`.
#[derive(Copy, Clone, Debug, Default)]
pub struct NegOp;

impl<V: Scalar> ValOp<V> for AddOp {
    fn kind(&self) -> OpKind {
        OpKind::Add
    }

    fn n_arg(&self, _arg_index: usize, _arg_all: &[u32]) -> usize {
        2
    }

    fn n_res(&self, _arg_index: usize, _arg_all: &[u32]) -> usize {
        1
    }

    fn eval(
        &self,
        _registry: &AtomicRegistry<V>,
        arg_index: usize,
        arg_all: &[u32],
        _con_all: &[V],
        res_index: usize,
        _compare_mismatch: &mut usize,
        val: &mut [V],
    ) {
        let lhs = val[arg_all[arg_index] as usize];
        let rhs = val[arg_all[arg_index + 1] as usize];
        val[res_index] = lhs + rhs;
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

impl<V: Scalar> ValOp<V> for SubOp {
    fn kind(&self) -> OpKind {
        OpKind::Sub
    }

    fn n_arg(&self, _arg_index: usize, _arg_all: &[u32]) -> usize {
        2
    }

    fn n_res(&self, _arg_index: usize, _arg_all: &[u32]) -> usize {
        1
    }

    fn eval(
        &self,
        _registry: &AtomicRegistry<V>,
        arg_index: usize,
        arg_all: &[u32],
        _con_all: &[V],
        res_index: usize,
        _compare_mismatch: &mut usize,
        val: &mut [V],
    ) {
        let lhs = val[arg_all[arg_index] as usize];
        let rhs = val[arg_all[arg_index + 1] as usize];
        val[res_index] = lhs - rhs;
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

impl<V: Scalar> ValOp<V> for NegOp {
    fn kind(&self) -> OpKind {
        OpKind::Neg
    }

    fn n_arg(&self, _arg_index: usize, _arg_all: &[u32]) -> usize {
        1
    }

    fn n_res(&self, _arg_index: usize, _arg_all: &[u32]) -> usize {
        1
    }

    fn eval(
        &self,
        _registry: &AtomicRegistry<V>,
        arg_index: usize,
        arg_all: &[u32],
        _con_all: &[V],
        res_index: usize,
        _compare_mismatch: &mut usize,
        val: &mut [V],
    ) {
        val[res_index] = -val[arg_all[arg_index] as usize];
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
