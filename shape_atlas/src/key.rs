// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape cache key.

use core::hash::BuildHasher;
use foldhash::fast::FixedState;

use crate::math::FloatExt;
use crate::region::Size;

/// Scale is quantized to thousandths before hashing.
const SCALE_STEPS: f64 = 1000.0;

/// The auxiliary transform parameter is quantized to hundredths before hashing.
const TRANSFORM_STEPS: f64 = 100.0;

/// Seed for hashing fingerprint bytes. Fixed so keys survive restarts.
const FINGERPRINT_SEED: u64 = 0x5348_4150_4541_544c;

/// Unique identifier for a cached shape rasterization.
///
/// Two requests with the same key are visually identical and share a slot.
/// The key covers everything that changes the rasterized pixels: the
/// content fingerprint, the scale, and the auxiliary transform parameter.
/// Floats are quantized first, so requests that differ only by numerical
/// noise land in the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeKey(u64);

impl ShapeKey {
    /// Derives a key from a content fingerprint, a scale and a transform parameter.
    ///
    /// `scale` is rounded to the nearest thousandth and `transform` to the
    /// nearest hundredth. The result is reproducible across runs.
    pub fn new(fingerprint: &[u8], scale: f32, transform: f32) -> Self {
        let scale = quantize(scale, SCALE_STEPS);
        let transform = quantize(transform, TRANSFORM_STEPS);

        let mut hash = 0;
        hash = combine_hash(hash, scale as u64);
        hash = combine_hash(hash, transform as u64);
        hash = combine_hash(hash, fingerprint_hash(fingerprint));
        Self(hash)
    }

    /// Wraps a precomputed key.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit key.
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

/// What the scene supplies when it wants a shape drawn from the atlas.
#[derive(Clone, Copy, Debug)]
pub struct ShapeRequest<'a> {
    /// Content hash identifying the shape independently of scale.
    pub fingerprint: &'a [u8],
    /// Rasterization scale.
    pub scale: f32,
    /// Auxiliary transform parameter that changes the rasterized output.
    pub transform: f32,
    /// Width and height of the shape's bounding box in shape units.
    pub bounds: [f32; 2],
}

impl ShapeRequest<'_> {
    /// The cache key for this request.
    #[inline]
    pub fn key(&self) -> ShapeKey {
        ShapeKey::new(self.fingerprint, self.scale, self.transform)
    }

    /// The pixel size the shape occupies once rasterized at its scale.
    ///
    /// Returns `None` for degenerate shapes whose scaled bounds are not
    /// positive; those are never cached.
    pub fn pixel_size(&self) -> Option<Size> {
        let scale = f64::from(self.scale);
        let width = f64::from(self.bounds[0]) * scale;
        let height = f64::from(self.bounds[1]) * scale;
        if !(width > 0.0 && height > 0.0) {
            return None;
        }
        Some(Size::new(width.ceil_to_u32(), height.ceil_to_u32()))
    }

    /// The size, in scene units, at which the rasterized shape is drawn.
    ///
    /// The cached pixels are rendered at `scale`; drawing them back at the
    /// unscaled bounds keeps the shape's on-screen size independent of the
    /// resolution it was rasterized at.
    #[inline]
    pub fn draw_size(&self) -> [f32; 2] {
        self.bounds
    }
}

#[inline]
fn quantize(value: f32, steps: f64) -> i64 {
    (f64::from(value) * steps).round_to_i64()
}

#[inline]
fn fingerprint_hash(fingerprint: &[u8]) -> u64 {
    FixedState::with_seed(FINGERPRINT_SEED).hash_one(fingerprint)
}

/// Order-sensitive 64-bit hash combination.
#[inline]
fn combine_hash(seed: u64, value: u64) -> u64 {
    seed ^ value
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}
