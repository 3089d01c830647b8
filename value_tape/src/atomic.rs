// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atomic-function bridge for the call operator.
//!
//! A tape delegates call invocations to embedder-provided [`AtomicFun`]
//! implementations looked up through an [`AtomicRegistry`]. The registry is
//! populate-then-share: it is built once, single-threaded, and afterwards
//! only ever borrowed immutably by evaluation and the analyses, so sharing
//! it across threads is safe by construction.
//!
//! The bridge is zero-order only: [`AtomicFun::forward`] evaluates the
//! function itself, never derivative coefficients.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::value::Scalar;

/// Identifier of a registered atomic function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunId(pub u32);

/// Identifier of one configuration (dimensions, options) of an atomic
/// function, chosen per call site by the recorder's caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallId(pub u32);

/// Classification of one call input for reverse dependency analysis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// The input is derivable from the constant pool alone; its value is
    /// available in `con_x`.
    Constant,
    /// The input depends on the independent values.
    Variable,
}

/// An externally implemented multi-input / multi-output function invoked by
/// the call operator.
///
/// Implementations are registered once in an [`AtomicRegistry`] and shared
/// immutably afterwards, hence the `Send + Sync` bound.
pub trait AtomicFun<V: Scalar>: Send + Sync {
    /// Returns the function name, surfaced only in trace output.
    fn name(&self) -> &str;

    /// Zero-order evaluation: computes all outputs for `x`.
    ///
    /// `y` is pre-sized to the result count recorded at the call site.
    fn forward(&self, call_id: CallId, x: &[V], y: &mut [V]);

    /// Reports which inputs each needed output actually depends on.
    ///
    /// `con_x[i]` holds input `i`'s value when `input_kind[i]` is
    /// [`InputKind::Constant`] (and the poison value otherwise);
    /// `depend_y[j]` is `true` for outputs that are needed. On return
    /// `depend_x[i]` must be `true` iff some needed output depends on input
    /// `i`.
    ///
    /// The default is the conservative answer: every input feeds every
    /// output.
    fn rev_depend(
        &self,
        call_id: CallId,
        con_x: &[V],
        input_kind: &[InputKind],
        depend_y: &[bool],
        depend_x: &mut [bool],
    ) {
        let _ = (call_id, con_x, input_kind);
        let any = depend_y.iter().any(|&needed| needed);
        for d in depend_x {
            *d = any;
        }
    }
}

/// Registry of atomic functions, indexed by [`FunId`].
pub struct AtomicRegistry<V> {
    funs: Vec<Box<dyn AtomicFun<V>>>,
}

impl<V: Scalar> AtomicRegistry<V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { funs: Vec::new() }
    }

    /// Registers `fun` and returns its id.
    ///
    /// Ids are assigned densely in registration order; they are what
    /// [`crate::tape::Tape::record_call_op`] stores in the operand run.
    pub fn register(&mut self, fun: Box<dyn AtomicFun<V>>) -> FunId {
        let id = u32::try_from(self.funs.len()).expect("atomic registry exceeds u32 id space");
        self.funs.push(fun);
        FunId(id)
    }

    /// Looks up a registered function.
    ///
    /// # Panics
    ///
    /// Panics if `id` was never returned by [`Self::register`]; a call
    /// operator bound to an unknown function is a recording contract
    /// violation.
    #[must_use]
    pub fn get(&self, id: FunId) -> &dyn AtomicFun<V> {
        self.funs
            .get(id.0 as usize)
            .unwrap_or_else(|| panic!("unknown atomic function id {}", id.0))
            .as_ref()
    }

    /// Returns the registered name for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown, as [`Self::get`] does.
    #[must_use]
    pub fn name(&self, id: FunId) -> &str {
        self.get(id).name()
    }

    /// Returns the number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.funs.len()
    }

    /// Returns `true` if no function has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.funs.is_empty()
    }
}

impl<V: Scalar> Default for AtomicRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for AtomicRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicRegistry")
            .field("len", &self.funs.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;

    struct Sum;

    impl AtomicFun<f64> for Sum {
        fn name(&self) -> &str {
            "sum"
        }

        fn forward(&self, _call_id: CallId, x: &[f64], y: &mut [f64]) {
            y[0] = x.iter().fold(0.0, |acc, &v| acc + v);
        }
    }

    #[test]
    fn register_assigns_dense_ids() {
        let mut reg = AtomicRegistry::new();
        let a = reg.register(Box::new(Sum));
        let b = reg.register(Box::new(Sum));
        assert_eq!((a, b), (FunId(0), FunId(1)), "ids follow registration order");
        assert_eq!(reg.name(b), "sum");
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn default_rev_depend_is_conservative() {
        let reg = {
            let mut reg = AtomicRegistry::new();
            reg.register(Box::new(Sum));
            reg
        };
        let mut depend_x = [false, false];
        reg.get(FunId(0)).rev_depend(
            CallId(0),
            &[0.0, 0.0],
            &[InputKind::Variable, InputKind::Variable],
            &[true],
            &mut depend_x,
        );
        assert_eq!(depend_x, [true, true], "every input feeds the needed output");

        let mut depend_x = [true, true];
        reg.get(FunId(0)).rev_depend(
            CallId(0),
            &[0.0, 0.0],
            &[InputKind::Variable, InputKind::Variable],
            &[false],
            &mut depend_x,
        );
        assert_eq!(depend_x, [false, false], "no needed output, no needed input");
    }
}
