// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterization dispatch.

use alloc::vec;
use alloc::vec::Vec;

use crate::key::ShapeKey;
use crate::region::{Offset, Region, Size};
use crate::storage::Rgba8;

/// Whether rasterization must finish before the atlas call returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dispatch {
    /// Rasterize on the calling thread. The slot holds valid pixels as soon
    /// as the call returns, which is what frame-exact export needs.
    Blocking,
    /// Hand the work to a background rasterizer. Until it finishes, the slot
    /// shows cleared or stale pixels.
    #[default]
    Deferred,
}

impl Dispatch {
    /// Picks the dispatch mode for a frame: exported frames must be exact.
    #[inline]
    pub fn for_export(exporting: bool) -> Self {
        if exporting {
            Self::Blocking
        } else {
            Self::Deferred
        }
    }
}

/// The slot a rasterizer should draw a shape into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RasterTarget {
    /// The shape being rasterized.
    pub key: ShapeKey,
    /// Page index.
    pub page: u32,
    /// Top-left corner of the slot in page pixels.
    pub offset: Offset,
    /// Pixel size of the content to draw.
    pub size: Size,
    /// Pixel size of the whole slot, at least `size`.
    pub allotted: Size,
}

impl RasterTarget {
    /// The pixels the content covers.
    #[inline]
    pub fn region(&self) -> Region {
        Region::new(self.offset, self.size)
    }
}

/// A rasterized shape waiting to be written into a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major pixels, `width * height` of them.
    pub pixels: Vec<Rgba8>,
}

impl RasterImage {
    /// Wraps row-major pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// An image of `size` where every pixel is `color`.
    pub fn filled(size: Size, color: Rgba8) -> Self {
        let len = size.width as usize * size.height as usize;
        Self::new(size.width, size.height, vec![color; len])
    }

    /// Width and height.
    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Pixels produced off-thread for a particular slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterUpload {
    /// The slot the pixels were produced for.
    pub target: RasterTarget,
    /// The pixels.
    pub image: RasterImage,
}

/// Produces pixels for a reserved slot.
///
/// A rasterizer must only write inside `target.region()` and leave every
/// other pixel of the atlas untouched.
pub trait ShapeRasterizer<S: ?Sized> {
    /// Draws the shape into `pages` before returning.
    fn rasterize_blocking(&mut self, pages: &mut S, target: RasterTarget);

    /// Starts drawing the shape and returns without waiting for it.
    ///
    /// The default implementation has no background path and draws
    /// immediately.
    fn rasterize_deferred(&mut self, pages: &mut S, target: RasterTarget) {
        self.rasterize_blocking(pages, target);
    }
}
