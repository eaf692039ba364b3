// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Float helpers that work without `std`.

/// Rounding helpers for the quantities the atlas quantizes.
///
/// `core` does not provide `round` or `ceil` on floats, and the atlas only
/// ever needs them for finite, modestly sized values.
pub(crate) trait FloatExt: Sized {
    /// Rounds to the nearest integer, halfway cases away from zero.
    ///
    /// NaN maps to 0 and out-of-range values saturate.
    fn round_to_i64(self) -> i64;

    /// Rounds up to the next whole pixel.
    ///
    /// Non-positive values and NaN map to 0.
    fn ceil_to_u32(self) -> u32;
}

impl FloatExt for f64 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "float to int casts saturate, which is the behavior we want"
    )]
    #[inline]
    fn round_to_i64(self) -> i64 {
        if self >= 0.0 {
            (self + 0.5) as i64
        } else {
            (self - 0.5) as i64
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "float to int casts saturate, which is the behavior we want"
    )]
    #[inline]
    fn ceil_to_u32(self) -> u32 {
        let whole = self as u32;
        if f64::from(whole) < self {
            whole.saturating_add(1)
        } else {
            whole
        }
    }
}
