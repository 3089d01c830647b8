// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Whole-tape analyses: usage classification and dead-code elimination.
//!
//! Both are plain sequential passes over the invocation list; they share the
//! reverse need-marking sweep and the poisoned constant snapshot.

mod dead_code;
pub mod usage;
