// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement records and the geometry they are made of.

use crate::config::UvOrigin;

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    /// Horizontal extent in pixels.
    pub width: u32,
    /// Vertical extent in pixels.
    pub height: u32,
}

impl Size {
    /// Creates a new size.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `other` fits inside `self` in both dimensions.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

/// Pixel position of the top-left corner of a region on a page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offset {
    /// X position in pixels.
    pub x: u32,
    /// Y position in pixels, growing downwards.
    pub y: u32,
}

impl Offset {
    /// The page origin.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Creates a new offset.
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A rectangle of pixels on a page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    /// Top-left corner.
    pub offset: Offset,
    /// Extent.
    pub size: Size,
}

impl Region {
    /// Creates a new region.
    #[inline]
    pub const fn new(offset: Offset, size: Size) -> Self {
        Self { offset, size }
    }

    /// Whether the region lies entirely inside a square page of the given edge length.
    #[inline]
    pub fn fits_in(self, page_size: u32) -> bool {
        let right = u64::from(self.offset.x) + u64::from(self.size.width);
        let bottom = u64::from(self.offset.y) + u64::from(self.size.height);
        right <= u64::from(page_size) && bottom <= u64::from(page_size)
    }
}

/// Where a cached shape lives, as stored in the LRU store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementRecord {
    /// Index of the atlas page holding the shape.
    pub page: u32,
    /// Normalized texture coordinates of one corner of the content.
    pub uv_min: [f32; 2],
    /// Normalized texture coordinates of the opposite corner of the content.
    pub uv_max: [f32; 2],
    /// Size actually covered by the rasterized content.
    pub content_size: Size,
    /// Size of the slot reserved for the content.
    ///
    /// Always at least `content_size`. A reused slot keeps the size it was
    /// first reserved with, even when the new content is smaller.
    pub allotted_size: Size,
    /// Top-left corner of the reserved slot in page pixels.
    pub offset: Offset,
}

impl PlacementRecord {
    pub(crate) fn new(
        page: u32,
        offset: Offset,
        content_size: Size,
        allotted_size: Size,
        texture_size: u32,
        origin: UvOrigin,
    ) -> Self {
        debug_assert!(
            allotted_size.contains(content_size),
            "content must fit inside its slot"
        );
        debug_assert!(
            Region::new(offset, allotted_size).fits_in(texture_size),
            "slot must lie inside the page"
        );
        let (uv_min, uv_max) = uv_rect(offset, content_size, texture_size, origin);
        Self {
            page,
            uv_min,
            uv_max,
            content_size,
            allotted_size,
            offset,
        }
    }

    /// The reserved slot as a pixel region.
    #[inline]
    pub fn allotted_region(&self) -> Region {
        Region::new(self.offset, self.allotted_size)
    }

    /// A renderable view of this record.
    #[inline]
    pub fn view(&self) -> AtlasView {
        AtlasView {
            uv_min: self.uv_min,
            uv_max: self.uv_max,
            page: PageHandle::Page(self.page),
        }
    }
}

/// The texture a renderer should sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageHandle {
    /// An atlas page, by index.
    Page(u32),
    /// The 1x1 placeholder used while a shape is not cached.
    Placeholder,
}

/// A value copy of what a renderer needs to draw a cached shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasView {
    /// Normalized texture coordinates of one corner.
    pub uv_min: [f32; 2],
    /// Normalized texture coordinates of the opposite corner.
    pub uv_max: [f32; 2],
    /// The texture to sample.
    pub page: PageHandle,
}

impl AtlasView {
    /// Covers the whole placeholder texture.
    pub const PLACEHOLDER: Self = Self {
        uv_min: [0.0, 0.0],
        uv_max: [1.0, 1.0],
        page: PageHandle::Placeholder,
    };

    /// Whether this view points at the placeholder rather than a page.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.page == PageHandle::Placeholder
    }
}

fn uv_rect(offset: Offset, size: Size, edge: u32, origin: UvOrigin) -> ([f32; 2], [f32; 2]) {
    let edge = edge as f32;
    let u0 = offset.x as f32 / edge;
    let u1 = (offset.x + size.width) as f32 / edge;
    let top = offset.y as f32 / edge;
    let bottom = (offset.y + size.height) as f32 / edge;
    match origin {
        UvOrigin::TopLeft => ([u0, top], [u1, bottom]),
        UvOrigin::BottomLeft => ([u0, 1.0 - bottom], [u1, 1.0 - top]),
    }
}
