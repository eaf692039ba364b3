// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas configuration.

use crate::region::Size;

/// Hard upper bound on the edge length of an atlas page, in pixels.
pub const MAX_PAGE_SIZE: u32 = 4096;

/// Default number of pages the atlas rotates through.
pub const DEFAULT_PAGE_COUNT: u32 = 4;

/// Default margin added after every placed shape to prevent texture bleeding.
pub const DEFAULT_PADDING: Size = Size::new(10, 10);

/// Default share of the oldest entries considered for slot reuse.
pub const DEFAULT_EVICTION_FRACTION: f32 = 0.1;

/// Which corner of a page texture coordinate `(0, 0)` refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UvOrigin {
    /// `v` grows downwards, matching page pixel rows.
    #[default]
    TopLeft,
    /// `v` grows upwards, as OpenGL samples framebuffer attachments.
    BottomLeft,
}

/// Geometry and policy knobs for a [`ShapeAtlas`](crate::ShapeAtlas).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasConfig {
    /// Edge length of each square page in pixels.
    ///
    /// Capped at [`MAX_PAGE_SIZE`].
    pub page_size: u32,
    /// Number of pre-allocated pages.
    pub page_count: u32,
    /// Margin kept to the right of and below every placed shape.
    pub padding: Size,
    /// Share of the store, oldest first, scanned for a reusable slot before
    /// rotating to the next page.
    pub eviction_fraction: f32,
    /// Orientation of the texture coordinates handed to renderers.
    pub uv_origin: UvOrigin,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            page_count: DEFAULT_PAGE_COUNT,
            padding: DEFAULT_PADDING,
            eviction_fraction: DEFAULT_EVICTION_FRACTION,
            uv_origin: UvOrigin::TopLeft,
        }
    }
}

impl AtlasConfig {
    /// Sets the page edge length.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the number of pages.
    #[must_use]
    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = page_count;
        self
    }

    /// Sets the padding between neighbouring shapes.
    #[must_use]
    pub fn with_padding(mut self, padding: Size) -> Self {
        self.padding = padding;
        self
    }

    /// Sets the share of entries scanned for slot reuse.
    #[must_use]
    pub fn with_eviction_fraction(mut self, eviction_fraction: f32) -> Self {
        self.eviction_fraction = eviction_fraction;
        self
    }

    /// Sets the texture coordinate orientation.
    #[must_use]
    pub fn with_uv_origin(mut self, uv_origin: UvOrigin) -> Self {
        self.uv_origin = uv_origin;
        self
    }

    /// Returns a copy with every field clamped into its valid range.
    ///
    /// Each adjustment is reported with a warning; none of them is fatal.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let mut config = self;
        if config.page_size > MAX_PAGE_SIZE {
            log::warn!(
                "atlas page size {} exceeds {MAX_PAGE_SIZE}px, clamping",
                config.page_size
            );
            config.page_size = MAX_PAGE_SIZE;
        } else if config.page_size == 0 {
            log::warn!("atlas page size of 0 requested, using 1");
            config.page_size = 1;
        }
        if config.page_count == 0 {
            log::warn!("atlas needs at least one page, using 1");
            config.page_count = 1;
        }
        if !(0.0..=1.0).contains(&config.eviction_fraction) {
            let clamped = if config.eviction_fraction > 1.0 {
                1.0
            } else {
                0.0
            };
            log::warn!(
                "eviction fraction {} is outside 0..=1, using {clamped}",
                config.eviction_fraction
            );
            config.eviction_fraction = clamped;
        }
        config
    }
}
