// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `bytemuck` trait impls for pixel types.

#![allow(
    unsafe_code,
    reason = "The `bytemuck` marker traits are `unsafe` and require `unsafe impl`."
)]

use crate::storage::Rgba8;
use bytemuck::{Pod, Zeroable};

// Safety: The struct is `repr(C)` with four `u8` fields, and all zeroes is
// transparent black.
unsafe impl Zeroable for Rgba8 {}

// Safety: The struct is `repr(C)`, `Copy`, has no padding and every bit
// pattern of its `u8` fields is valid.
unsafe impl Pod for Rgba8 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_cast_to_bytes_in_channel_order() {
        let pixels = [Rgba8::new(1, 2, 3, 4), Rgba8::new(5, 6, 7, 8)];
        let bytes: &[u8] = bytemuck::cast_slice(&pixels);
        assert_eq!(bytes, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(Rgba8::zeroed(), Rgba8::TRANSPARENT);
    }
}
