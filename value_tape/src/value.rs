// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scalar value contract for tape recording and evaluation.
//!
//! The tape is generic over the scalar it records. Besides ordinary
//! arithmetic, analyses rely on one extra capability: a quiet not-a-number
//! value whose *propagation* through every arithmetic operator is
//! guaranteed. The constant-detection pass poisons all independent slots
//! with [`Scalar::nan`] and re-evaluates the whole tape; a slot that comes
//! out non-NaN is provably independent of the inputs. A type with
//! saturating or clamped arithmetic cannot make that guarantee and must not
//! implement this trait.

use core::fmt;
use core::ops::{Add, Neg, Sub};

/// A scalar value a tape can record and evaluate.
///
/// Implementations must uphold the poisoning contract: any arithmetic
/// operation (`+`, `-`, unary `-`) with a NaN operand yields NaN. The IEEE
/// 754 float types satisfy this; implementations are provided for `f64` and
/// `f32`.
pub trait Scalar:
    Copy
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::LowerExp
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Returns the quiet not-a-number value used for the sentinel constant
    /// and for poisoning.
    fn nan() -> Self;

    /// Returns `true` if `self` is the poison value.
    fn is_nan(self) -> bool;
}

impl Scalar for f64 {
    fn nan() -> Self {
        Self::NAN
    }

    fn is_nan(self) -> bool {
        // The inherent `f64::is_nan`, not a recursive call.
        f64::is_nan(self)
    }
}

impl Scalar for f32 {
    fn nan() -> Self {
        Self::NAN
    }

    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poison_propagates<V: Scalar>(one: V) {
        let nan = V::nan();
        assert!(nan.is_nan(), "nan() must report is_nan");
        assert!((nan + one).is_nan(), "addition must propagate NaN");
        assert!((one - nan).is_nan(), "subtraction must propagate NaN");
        assert!((-nan).is_nan(), "negation must propagate NaN");
        assert!(!one.is_nan(), "ordinary values are not poison");
    }

    #[test]
    fn f64_poison_contract() {
        poison_propagates(1.0_f64);
    }

    #[test]
    fn f32_poison_contract() {
        poison_propagates(1.0_f32);
    }
}
