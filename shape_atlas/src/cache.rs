// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shape atlas.

use smallvec::SmallVec;

use crate::config::{AtlasConfig, MAX_PAGE_SIZE};
use crate::key::{ShapeKey, ShapeRequest};
use crate::lru::LruStore;
use crate::policy::{Reclaim, evict_page, find_reusable_slot};
use crate::raster::{Dispatch, RasterTarget, RasterUpload, ShapeRasterizer};
use crate::region::{AtlasView, Offset, PlacementRecord, Size};
use crate::shelf::ShelfPacker;
use crate::storage::{PageStorage, PixelSink};

/// Counters describing how an atlas has been used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AtlasStats {
    /// Shapes currently resident.
    pub entries: usize,
    /// Requests answered from the cache.
    pub hits: u64,
    /// Requests for shapes that were not resident.
    pub misses: u64,
    /// Shapes given a slot.
    pub inserts: u64,
    /// Inserts that took over the slot of an old entry.
    pub reused_slots: u64,
    /// Times the atlas moved on to the next page, evicting everything on it.
    pub page_rotations: u64,
    /// Requests that were empty or too big to ever fit a page.
    pub rejected: u64,
    /// Finished uploads dropped because their slot was lost in the meantime.
    pub discarded_uploads: u64,
}

/// A texture atlas caching rasterized vector shapes.
///
/// Shapes are packed onto a fixed set of square pages in shelves. When the
/// current page is full, the atlas first tries to take over the slot of one
/// of its least recently used entries, and otherwise moves on to the next
/// page, evicting everything that lived there. Memory use is therefore
/// bounded by the page storage, no matter how many shapes are requested.
///
/// The atlas is not thread-safe and is meant to be driven from the frame
/// update thread. Rasterization can still happen elsewhere; see
/// [`Dispatch`] and [`apply_uploads`](Self::apply_uploads).
pub struct ShapeAtlas<S> {
    config: AtlasConfig,
    /// Edge length of the page textures, which UVs are relative to.
    texture_size: u32,
    store: LruStore<ShapeKey, PlacementRecord>,
    packer: ShelfPacker,
    storage: S,
    /// Number of resident entries per page.
    resident: SmallVec<[usize; 4]>,
    stats: AtlasStats,
}

impl<S: PageStorage> ShapeAtlas<S> {
    /// Creates an empty atlas placing shapes on `storage`.
    ///
    /// The config is [sanitized](AtlasConfig::sanitized). Page geometry is
    /// taken from the storage; a config that disagrees with it is overridden
    /// with a warning. Pages larger than [`MAX_PAGE_SIZE`] are only packed up
    /// to that size, while texture coordinates stay relative to the whole
    /// page texture.
    pub fn new(config: AtlasConfig, storage: S) -> Self {
        let mut config = config.sanitized();
        let texture_size = storage.page_size();
        let page_count = storage.page_count();
        let page_size = texture_size.min(MAX_PAGE_SIZE);
        if page_size != texture_size {
            log::warn!(
                "storage pages are {texture_size}px, packing only the first {page_size}px of each"
            );
        }
        if config.page_size != page_size || config.page_count != page_count {
            log::warn!(
                "using storage geometry {page_count}x{page_size}px over configured {}x{}px",
                config.page_count, config.page_size
            );
            config.page_size = page_size;
            config.page_count = page_count;
        }
        Self {
            config,
            texture_size,
            store: LruStore::new(),
            packer: ShelfPacker::new(page_size, config.padding),
            storage,
            resident: SmallVec::from_elem(0, page_count as usize),
            stats: AtlasStats::default(),
        }
    }

    /// The effective configuration.
    #[inline]
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// The pages, for renderers to sample from.
    #[inline]
    pub fn pages(&self) -> &S {
        &self.storage
    }

    /// Number of resident shapes.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no shape is resident.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Whether `key` is resident. Does not count as a use.
    #[inline]
    pub fn exists(&self, key: ShapeKey) -> bool {
        self.store.contains(&key)
    }

    /// Where `key` lives, without counting as a use.
    pub fn placement(&self, key: ShapeKey) -> Option<PlacementRecord> {
        self.store.peek(&key).copied()
    }

    /// Returns a view of `key` and marks it recently used.
    pub fn lookup(&mut self, key: ShapeKey) -> Option<AtlasView> {
        self.store.get(&key).map(PlacementRecord::view)
    }

    /// Like [`lookup`](Self::lookup), but falls back to the placeholder
    /// texture so renderers always have something bound.
    pub fn lookup_or_placeholder(&mut self, key: ShapeKey) -> AtlasView {
        self.lookup(key).unwrap_or(AtlasView::PLACEHOLDER)
    }

    /// Returns the view of `key`, reserving a slot of `size` pixels and
    /// calling `rasterize` to fill it if the shape is not resident yet.
    ///
    /// The record is inserted before `rasterize` runs, so a repeated request
    /// while the pixels are still being produced is a hit and does not
    /// reserve a second slot.
    ///
    /// Returns `None` for empty sizes and for shapes too big to ever fit a
    /// page. Neither is an error.
    pub fn get_or_insert_with<F>(
        &mut self,
        key: ShapeKey,
        size: Size,
        rasterize: F,
    ) -> Option<AtlasView>
    where
        F: FnOnce(&mut S, RasterTarget),
    {
        if let Some(record) = self.store.get(&key) {
            self.stats.hits += 1;
            return Some(record.view());
        }
        self.stats.misses += 1;

        let record = self.reserve(key, size)?;
        self.store.insert(key, record);
        self.resident[record.page as usize] += 1;
        self.stats.inserts += 1;

        let target = RasterTarget {
            key,
            page: record.page,
            offset: record.offset,
            size,
            allotted: record.allotted_size,
        };
        rasterize(&mut self.storage, target);
        Some(record.view())
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with), handing the
    /// work to `rasterizer` in the requested `dispatch` mode.
    pub fn get_or_insert<R>(
        &mut self,
        key: ShapeKey,
        size: Size,
        dispatch: Dispatch,
        rasterizer: &mut R,
    ) -> Option<AtlasView>
    where
        R: ShapeRasterizer<S> + ?Sized,
    {
        self.get_or_insert_with(key, size, |pages, target| match dispatch {
            Dispatch::Blocking => rasterizer.rasterize_blocking(pages, target),
            Dispatch::Deferred => rasterizer.rasterize_deferred(pages, target),
        })
    }

    /// Caches a shape described by the scene.
    pub fn get_or_insert_shape<R>(
        &mut self,
        request: &ShapeRequest<'_>,
        dispatch: Dispatch,
        rasterizer: &mut R,
    ) -> Option<AtlasView>
    where
        R: ShapeRasterizer<S> + ?Sized,
    {
        let size = request.pixel_size().unwrap_or_default();
        self.get_or_insert(request.key(), size, dispatch, rasterizer)
    }

    /// Drops every resident shape, clears every page and rewinds to the
    /// origin of the first page. Statistics are reset too.
    pub fn reset(&mut self) {
        self.store.clear();
        self.packer.reset();
        self.resident.fill(0);
        self.stats = AtlasStats::default();
        for page in 0..self.config.page_count {
            if let Err(err) = self.storage.clear_page(page) {
                log::error!("failed to clear atlas page {page}: {err}");
            }
        }
    }

    /// Usage counters.
    pub fn stats(&self) -> AtlasStats {
        AtlasStats {
            entries: self.store.len(),
            ..self.stats
        }
    }

    /// Resets the usage counters.
    pub fn clear_stats(&mut self) {
        self.stats = AtlasStats::default();
    }

    /// Finds a slot for a shape that is not resident.
    fn reserve(&mut self, key: ShapeKey, size: Size) -> Option<PlacementRecord> {
        if size.is_empty() {
            self.stats.rejected += 1;
            return None;
        }
        if self.config.page_count == 0 || !self.packer.fits_empty_page(size) {
            log::warn!(
                "{key:?} needs {}x{} pixels and can never fit a {}px atlas page",
                size.width, size.height, self.config.page_size
            );
            self.stats.rejected += 1;
            return None;
        }

        if self.packer.needs_wrap(size) {
            self.packer.wrap();
        }
        if !self.packer.fits_vertically(size) {
            return Some(self.make_room(size));
        }
        let offset = self.packer.place(size);
        Some(self.record(self.packer.page(), offset, size, size))
    }

    /// Reuses an old slot or rotates to the next page when the current page is full.
    fn make_room(&mut self, size: Size) -> PlacementRecord {
        match find_reusable_slot(&self.store, size, self.config.eviction_fraction) {
            Reclaim::Reuse {
                key,
                record,
                inspected,
            } => {
                log::trace!(
                    "reusing slot of {key:?} on page {} after inspecting {inspected} entries",
                    record.page
                );
                if self.store.evict(&key) {
                    self.forget_resident(record.page);
                } else {
                    log::error!("failed to evict {key:?} from the atlas");
                }
                let region = record.allotted_region();
                if let Err(err) = self.storage.clear_region(record.page, region) {
                    log::error!("failed to clear reused atlas slot: {err}");
                }
                self.stats.reused_slots += 1;
                self.record(record.page, record.offset, size, record.allotted_size)
            }
            Reclaim::Exhausted { inspected } => {
                log::debug!("no reusable slot among {inspected} oldest entries");
                let page = self.rotate_page();
                let offset = self.packer.place(size);
                self.record(page, offset, size, size)
            }
        }
    }

    /// Moves to the next page and wipes it.
    fn rotate_page(&mut self) -> u32 {
        let page = self.packer.rotate(self.config.page_count);
        let expected = self.resident[page as usize];
        let evicted = if expected == 0 {
            0
        } else {
            evict_page(&mut self.store, page)
        };
        debug_assert_eq!(
            evicted, expected,
            "resident count of page {page} out of sync with the store"
        );
        self.resident[page as usize] = 0;
        if let Err(err) = self.storage.clear_page(page) {
            log::error!("failed to clear atlas page {page}: {err}");
        }
        self.stats.page_rotations += 1;
        log::debug!("rotated to atlas page {page}, evicting {evicted} shapes");
        page
    }

    fn forget_resident(&mut self, page: u32) {
        if let Some(count) = self.resident.get_mut(page as usize) {
            *count = count.saturating_sub(1);
        }
    }

    fn record(
        &self,
        page: u32,
        offset: Offset,
        content_size: Size,
        allotted_size: Size,
    ) -> PlacementRecord {
        PlacementRecord::new(
            page,
            offset,
            content_size,
            allotted_size,
            self.texture_size,
            self.config.uv_origin,
        )
    }
}

impl<S: PixelSink> ShapeAtlas<S> {
    /// Writes finished background rasterizations into their slots.
    ///
    /// An upload is only written if its shape is still resident in the slot
    /// it was rasterized for. Otherwise the slot has been handed to someone
    /// else in the meantime and the upload is dropped; requesting the shape
    /// again will rasterize it anew.
    ///
    /// Returns the number of uploads written.
    pub fn apply_uploads<I>(&mut self, uploads: I) -> usize
    where
        I: IntoIterator<Item = RasterUpload>,
    {
        let mut applied = 0;
        for upload in uploads {
            let target = upload.target;
            if !self.holds_slot(&target) {
                log::debug!(
                    "discarding upload for {:?}, its slot on page {} was reclaimed",
                    target.key, target.page
                );
                self.stats.discarded_uploads += 1;
                continue;
            }
            if !target.allotted.contains(upload.image.size()) {
                let (image, slot) = (upload.image.size(), target.allotted);
                log::error!(
                    "upload for {:?} is {}x{} pixels, larger than its {}x{} slot",
                    target.key, image.width, image.height, slot.width, slot.height
                );
                self.stats.discarded_uploads += 1;
                continue;
            }
            match self
                .storage
                .write_pixels(target.page, target.offset, &upload.image)
            {
                Ok(()) => applied += 1,
                Err(err) => log::error!("failed to upload {:?}: {err}", target.key),
            }
        }
        applied
    }

    /// Whether the shape of `target` is still resident in that slot.
    fn holds_slot(&self, target: &RasterTarget) -> bool {
        let Some(record) = self.store.peek(&target.key) else {
            return false;
        };
        record.page == target.page && record.offset == target.offset
    }
}

impl<S> core::fmt::Debug for ShapeAtlas<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShapeAtlas")
            .field("config", &self.config)
            .field("entries", &self.store.len())
            .field("page", &self.packer.page())
            .field("cursor", &self.packer.cursor())
            .field("shelf_height", &self.packer.shelf_height())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UvOrigin;
    use crate::raster::RasterImage;
    use crate::region::PageHandle;
    use crate::storage::{CpuPages, Rgba8};
    use alloc::vec::Vec;

    const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);
    const SQUARE: Size = Size::new(20, 20);

    /// Two pages of 64px with 2px padding: four 20x20 squares per page.
    fn config() -> AtlasConfig {
        AtlasConfig::default()
            .with_page_size(64)
            .with_page_count(2)
            .with_padding(Size::new(2, 2))
    }

    fn atlas(config: AtlasConfig) -> ShapeAtlas<CpuPages> {
        let pages = CpuPages::new(&config);
        ShapeAtlas::new(config, pages)
    }

    fn key(n: u64) -> ShapeKey {
        ShapeKey::from_raw(n)
    }

    fn paint(pages: &mut CpuPages, target: RasterTarget) {
        let image = RasterImage::filled(target.size, RED);
        pages.write_pixels(target.page, target.offset, &image).unwrap();
    }

    /// Rasterizes blocking requests in place and queues deferred ones.
    #[derive(Default)]
    struct Recorder {
        blocking: usize,
        deferred: Vec<RasterTarget>,
    }

    impl ShapeRasterizer<CpuPages> for Recorder {
        fn rasterize_blocking(&mut self, pages: &mut CpuPages, target: RasterTarget) {
            self.blocking += 1;
            paint(pages, target);
        }

        fn rasterize_deferred(&mut self, _: &mut CpuPages, target: RasterTarget) {
            self.deferred.push(target);
        }
    }

    impl Recorder {
        fn finish(&mut self) -> Vec<RasterUpload> {
            self.deferred
                .drain(..)
                .map(|target| RasterUpload {
                    target,
                    image: RasterImage::filled(target.size, RED),
                })
                .collect()
        }
    }

    #[test]
    fn hit_does_not_rasterize_again() {
        let mut atlas = atlas(config());
        let mut calls = 0;
        let first = atlas.get_or_insert_with(key(1), SQUARE, |pages, target| {
            calls += 1;
            paint(pages, target);
        });
        let second = atlas.get_or_insert_with(key(1), SQUARE, |_, _| calls += 1);
        assert_eq!(calls, 1);
        assert_eq!(first, second);
        assert_eq!(atlas.pages().pixel(0, 0, 0), Some(RED));

        let stats = atlas.stats();
        assert_eq!((stats.hits, stats.misses, stats.inserts), (1, 1, 1));
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn deferred_insert_is_visible_immediately() {
        let mut atlas = atlas(config());
        let mut recorder = Recorder::default();
        atlas.get_or_insert(key(1), SQUARE, Dispatch::Deferred, &mut recorder);
        assert!(atlas.exists(key(1)));
        assert_eq!(atlas.pages().pixel(0, 0, 0), Some(Rgba8::TRANSPARENT));

        atlas.get_or_insert(key(1), SQUARE, Dispatch::Deferred, &mut recorder);
        assert_eq!(recorder.deferred.len(), 1, "queued twice");

        let uploads = recorder.finish();
        assert_eq!(atlas.apply_uploads(uploads), 1);
        assert_eq!(atlas.pages().pixel(0, 19, 19), Some(RED));
        assert_eq!(atlas.pages().pixel(0, 20, 20), Some(Rgba8::TRANSPARENT));
    }

    #[test]
    fn blocking_dispatch_writes_before_returning() {
        let mut atlas = atlas(config());
        let mut recorder = Recorder::default();
        atlas.get_or_insert(key(1), SQUARE, Dispatch::for_export(true), &mut recorder);
        assert_eq!(recorder.blocking, 1);
        assert!(recorder.deferred.is_empty());
        assert_eq!(atlas.pages().pixel(0, 0, 0), Some(RED));
    }

    #[test]
    fn degenerate_and_oversized_requests_are_skipped() {
        let mut atlas = atlas(config());
        let mut calls = 0;
        let empty = atlas.get_or_insert_with(key(1), Size::new(0, 10), |_, _| calls += 1);
        assert!(empty.is_none());
        let wide = atlas.get_or_insert_with(key(2), Size::new(62, 10), |_, _| calls += 1);
        assert!(wide.is_none());
        assert_eq!(calls, 0);
        assert!(atlas.is_empty());
        assert_eq!(atlas.stats().rejected, 2);
    }

    #[test]
    fn full_page_reuses_oldest_slot() {
        let mut atlas = atlas(config().with_eviction_fraction(1.0));
        for n in 0..4 {
            atlas.get_or_insert_with(key(n), SQUARE, paint);
        }
        assert_eq!(atlas.stats().reused_slots, 0);

        let mut painted_over = None;
        let view = atlas
            .get_or_insert_with(key(4), SQUARE, |pages, target| {
                painted_over = pages.pixel(target.page, target.offset.x, target.offset.y);
            })
            .unwrap();
        assert_eq!(painted_over, Some(Rgba8::TRANSPARENT), "slot not cleared");
        assert!(!atlas.exists(key(0)));
        assert_eq!(view.page, PageHandle::Page(0));
        assert_eq!(atlas.placement(key(4)).unwrap().offset, Offset::ORIGIN);
        assert_eq!(atlas.stats().reused_slots, 1);
        assert_eq!(atlas.stats().page_rotations, 0);

        // Smaller content keeps the bigger slot.
        atlas.get_or_insert_with(key(5), Size::new(19, 19), paint);
        let record = atlas.placement(key(5)).unwrap();
        assert!(!atlas.exists(key(1)));
        assert_eq!(record.offset, Offset::new(22, 0));
        assert_eq!(record.allotted_size, SQUARE);
        assert_eq!(record.content_size, Size::new(19, 19));
        assert_eq!(record.uv_max[0], 41.0 / 64.0);
    }

    #[test]
    fn rotation_evicts_the_whole_page() {
        let mut atlas = atlas(config().with_eviction_fraction(0.0));
        for n in 0..8 {
            atlas.get_or_insert_with(key(n), SQUARE, paint);
        }
        assert!((0..4).all(|n| atlas.placement(key(n)).unwrap().page == 0));
        assert!((4..8).all(|n| atlas.placement(key(n)).unwrap().page == 1));
        assert_eq!(atlas.stats().page_rotations, 1);

        atlas.get_or_insert_with(key(8), SQUARE, |_, _| {});
        assert!((0..4).all(|n| !atlas.exists(key(n))));
        assert!((4..8).all(|n| atlas.exists(key(n))));
        assert_eq!(atlas.placement(key(8)).unwrap().page, 0);
        assert_eq!(atlas.stats().page_rotations, 2);
        assert_eq!(atlas.len(), 5);
        assert_eq!(
            atlas.pages().pixel(0, 30, 30),
            Some(Rgba8::TRANSPARENT),
            "rotated page must be cleared"
        );
    }

    #[test]
    fn stale_upload_is_discarded() {
        let mut atlas = atlas(config().with_page_count(1).with_eviction_fraction(0.0));
        let mut recorder = Recorder::default();
        atlas.get_or_insert(key(0), SQUARE, Dispatch::Deferred, &mut recorder);
        let stale = recorder.finish();

        for n in 1..5 {
            atlas.get_or_insert(key(n), SQUARE, Dispatch::Blocking, &mut recorder);
        }
        assert!(!atlas.exists(key(0)), "single page rotated onto itself");
        assert_eq!(atlas.placement(key(4)).unwrap().offset, Offset::ORIGIN);

        assert_eq!(atlas.apply_uploads(stale), 0);
        assert_eq!(atlas.stats().discarded_uploads, 1);
    }

    #[test]
    fn lookup_falls_back_to_placeholder() {
        let mut atlas = atlas(config());
        assert_eq!(atlas.lookup(key(1)), None);
        assert!(atlas.lookup_or_placeholder(key(1)).is_placeholder());

        atlas.get_or_insert_with(key(1), SQUARE, paint);
        let view = atlas.lookup_or_placeholder(key(1));
        assert_eq!(view.page, PageHandle::Page(0));
        assert_eq!(view.uv_min, [0.0, 0.0]);
        assert_eq!(view.uv_max, [20.0 / 64.0, 20.0 / 64.0]);
    }

    #[test]
    fn lookup_promotes_exists_does_not() {
        let mut atlas = atlas(config().with_page_count(1).with_eviction_fraction(1.0));
        for n in 0..4 {
            atlas.get_or_insert_with(key(n), SQUARE, paint);
        }
        assert!(atlas.exists(key(0)));
        atlas.lookup(key(1));
        atlas.get_or_insert_with(key(4), SQUARE, paint);
        assert!(!atlas.exists(key(0)), "exists must not protect an entry");
        atlas.get_or_insert_with(key(5), SQUARE, paint);
        assert!(atlas.exists(key(1)), "lookup must protect an entry");
        assert!(!atlas.exists(key(2)));
    }

    #[test]
    fn bottom_left_origin_flips_views() {
        let mut atlas = atlas(config().with_uv_origin(UvOrigin::BottomLeft));
        let view = atlas.get_or_insert_with(key(1), SQUARE, paint).unwrap();
        assert_eq!(view.uv_min, [0.0, 44.0 / 64.0]);
        assert_eq!(view.uv_max, [20.0 / 64.0, 1.0]);
    }

    #[test]
    fn storage_geometry_wins() {
        let pages = CpuPages::with_geometry(32, 3);
        let atlas = ShapeAtlas::new(AtlasConfig::default(), pages);
        assert_eq!(atlas.config().page_size, 32);
        assert_eq!(atlas.config().page_count, 3);
    }

    #[test]
    fn reset_starts_over() {
        let mut atlas = atlas(config());
        for n in 0..6 {
            atlas.get_or_insert_with(key(n), SQUARE, paint);
        }
        atlas.reset();
        assert!(atlas.is_empty());
        assert_eq!(atlas.stats(), AtlasStats::default());
        let cleared = atlas.pages().pixels(1).unwrap();
        assert!(cleared.iter().all(|&p| p == Rgba8::TRANSPARENT));

        atlas.get_or_insert_with(key(9), SQUARE, paint);
        let record = atlas.placement(key(9)).unwrap();
        assert_eq!((record.page, record.offset), (0, Offset::ORIGIN));
    }
}
