// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `value_tape`: an append-only value-operation tape IR with evaluation,
//! liveness analysis, and dead-code elimination.
//!
//! A [`tape::Tape`] records a sequence of elementary scalar operations in
//! SSA-like form: values are numbered in recording order, an operation may
//! only reference earlier values, and designated dependent indices are the
//! recording's outputs. The tape can then be re-evaluated on fresh inputs,
//! classified by value liveness, and pruned to a minimal equivalent
//! recording before downstream derivative or code-generation passes consume
//! it. External multi-input/multi-output functions participate through the
//! [`atomic`] bridge.
//!
//! ## Example
//!
//! ```
//! extern crate alloc;
//!
//! use alloc::vec;
//!
//! use value_tape::atomic::AtomicRegistry;
//! use value_tape::op::OpKind;
//! use value_tape::tape::{Tape, ValueId};
//!
//! // Record f(x) = (x + 3) - 3, plus an unused constant.
//! let mut tape = Tape::new();
//! tape.set_ind(1);
//! let x = ValueId(0);
//! let three = tape.record_con_op(3.0);
//! let sum = tape.record_op(OpKind::Add, &[x, three]);
//! let _unused = tape.record_con_op(5.0);
//! let out = tape.record_op(OpKind::Sub, &[sum, three]);
//! tape.set_dep(&[out]);
//!
//! // Evaluate with x = 10.
//! let registry = AtomicRegistry::new();
//! let mut val = vec![0.0; tape.n_val()];
//! val[0] = 10.0;
//! let mut mismatch = 0;
//! tape.eval(&registry, None, &mut mismatch, &mut val);
//! assert_eq!(val[out.0 as usize], 10.0);
//!
//! // Prune: the unused constant's invocation disappears.
//! let before = tape.n_op();
//! tape.dead_code(&registry, false);
//! assert_eq!(tape.n_op(), before - 1);
//! ```

#![no_std]

extern crate alloc;

pub mod analysis;
pub mod atomic;
mod eval;
pub mod op;
pub mod tape;
pub(crate) mod trace;
pub mod value;
