// Copyright 2026 the Value Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text formatting helpers for evaluation traces.
//!
//! Trace output is written through a caller-supplied [`core::fmt::Write`]
//! sink, so the crate stays `no_std`. The value field uses a C `%g`-style
//! general format with three significant digits: fixed notation for decimal
//! exponents in `[-4, 3)`, exponential notation otherwise, trailing zeros
//! trimmed either way.

use alloc::format;
use alloc::string::String;
use core::fmt;
use core::fmt::Write as _;

/// Number of significant digits in a trace value field.
const SIG_DIGITS: usize = 3;

/// Formats `value` in `%.3g` style.
///
/// Non-finite values have no exponent form and are passed through lowercase
/// (`nan`, `inf`, `-inf`).
pub(crate) fn g3<V: fmt::LowerExp>(value: V) -> String {
    // Round to the requested significance first; everything below is string
    // surgery on the exact digits `{:e}` produced, so the value is never
    // rounded twice.
    let exp_form = format!("{value:.prec$e}", prec = SIG_DIGITS - 1);
    let Some((mantissa, exp)) = exp_form.split_once('e') else {
        return exp_form.to_ascii_lowercase();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return exp_form;
    };

    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    // Exactly SIG_DIGITS digits: one integer digit plus SIG_DIGITS - 1
    // fractional digits.
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let fixed_limit = i32::try_from(SIG_DIGITS).unwrap_or(i32::MAX);

    let mut out = String::from(sign);
    if (-4..fixed_limit).contains(&exp) {
        if exp < 0 {
            out.push_str("0.");
            for _ in 0..(-exp - 1) {
                out.push('0');
            }
            out.push_str(&digits);
        } else {
            let point = usize::try_from(exp).unwrap_or(0) + 1;
            out.push_str(&digits[..point]);
            if point < digits.len() {
                out.push('.');
                out.push_str(&digits[point..]);
            }
        }
        if out.contains('.') {
            let trimmed = out.trim_end_matches('0').trim_end_matches('.').len();
            out.truncate(trimmed);
        }
    } else {
        out.push_str(mantissa.trim_end_matches('0').trim_end_matches('.'));
        let (exp_sign, exp_abs) = if exp < 0 { ('-', -exp) } else { ('+', exp) };
        let _ = write!(out, "e{exp_sign}{exp_abs:02}");
    }
    out
}

/// Writes one result line of a trace block: the result index right-justified
/// in 5 columns, two spaces, then the value right-justified in 10 columns.
pub(crate) fn write_result_line<V: fmt::LowerExp>(
    out: &mut dyn fmt::Write,
    index: usize,
    value: V,
) -> fmt::Result {
    writeln!(out, "{index:>5}  {:>10}", g3(value))
}
