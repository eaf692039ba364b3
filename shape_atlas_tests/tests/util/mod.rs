// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions and types shared across tests.

use shape_atlas::{
    AtlasConfig, Error, PageStorage, RasterTarget, Region, ShapeAtlas, ShapeKey, ShapeRasterizer,
    Size,
};

/// Page storage that owns no pixels and only records what it was asked to clear.
///
/// Lets tests drive full-size 4096px pages without allocating them.
#[derive(Debug, Default)]
pub(crate) struct RecordingPages {
    pub(crate) size: u32,
    pub(crate) count: u32,
    pub(crate) cleared_pages: Vec<u32>,
    pub(crate) cleared_regions: Vec<(u32, Region)>,
}

impl RecordingPages {
    pub(crate) fn new(config: &AtlasConfig) -> Self {
        let config = config.sanitized();
        Self {
            size: config.page_size,
            count: config.page_count,
            ..Self::default()
        }
    }
}

impl PageStorage for RecordingPages {
    fn page_count(&self) -> u32 {
        self.count
    }

    fn page_size(&self) -> u32 {
        self.size
    }

    fn clear_page(&mut self, page: u32) -> Result<(), Error> {
        self.cleared_pages.push(page);
        Ok(())
    }

    fn clear_region(&mut self, page: u32, region: Region) -> Result<(), Error> {
        self.cleared_regions.push((page, region));
        Ok(())
    }
}

/// Counts the slots it is asked to fill, by dispatch mode.
#[derive(Debug, Default)]
pub(crate) struct CountingRasterizer {
    pub(crate) blocking: Vec<RasterTarget>,
    pub(crate) deferred: Vec<RasterTarget>,
}

impl CountingRasterizer {
    pub(crate) fn calls(&self) -> usize {
        self.blocking.len() + self.deferred.len()
    }
}

impl<S: ?Sized> ShapeRasterizer<S> for CountingRasterizer {
    fn rasterize_blocking(&mut self, _: &mut S, target: RasterTarget) {
        self.blocking.push(target);
    }

    fn rasterize_deferred(&mut self, _: &mut S, target: RasterTarget) {
        self.deferred.push(target);
    }
}

/// An atlas over recording pages shaped by `config`.
pub(crate) fn recording_atlas(config: AtlasConfig) -> ShapeAtlas<RecordingPages> {
    let pages = RecordingPages::new(&config);
    ShapeAtlas::new(config, pages)
}

pub(crate) fn key(n: u64) -> ShapeKey {
    ShapeKey::from_raw(n)
}

/// Inserts `key` without rasterizing anything.
pub(crate) fn reserve<S: PageStorage>(atlas: &mut ShapeAtlas<S>, key: ShapeKey, size: Size) {
    atlas.get_or_insert_with(key, size, |_, _| {});
}
