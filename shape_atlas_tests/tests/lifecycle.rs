// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lookups, hits, statistics and reset.

use shape_atlas::{
    AtlasConfig, AtlasStats, AtlasView, Dispatch, Offset, PageHandle, ShapeAtlas, Size,
};

use crate::util::{CountingRasterizer, RecordingPages, key, recording_atlas, reserve};

#[test]
fn lifecycle_hit_is_idempotent() {
    let mut atlas = recording_atlas(AtlasConfig::default());
    let mut rasterizer = CountingRasterizer::default();
    let size = Size::new(64, 32);

    let first = atlas.get_or_insert(key(7), size, Dispatch::Blocking, &mut rasterizer);
    let record = atlas.placement(key(7));
    for _ in 0..3 {
        let again = atlas.get_or_insert(key(7), size, Dispatch::Blocking, &mut rasterizer);
        assert_eq!(again, first);
    }
    assert_eq!(rasterizer.calls(), 1);
    assert_eq!(atlas.placement(key(7)), record);

    let stats = atlas.stats();
    assert_eq!((stats.hits, stats.misses, stats.inserts), (3, 1, 1));
}

#[test]
fn lifecycle_missing_shape_gets_placeholder() {
    let mut atlas = recording_atlas(AtlasConfig::default());
    assert!(!atlas.exists(key(1)));
    assert_eq!(atlas.lookup(key(1)), None);
    assert_eq!(atlas.lookup_or_placeholder(key(1)), AtlasView::PLACEHOLDER);

    reserve(&mut atlas, key(1), Size::new(8, 8));
    let view = atlas.lookup_or_placeholder(key(1));
    assert!(!view.is_placeholder());
    assert_eq!(view.page, PageHandle::Page(0));
}

#[test]
fn lifecycle_reset_starts_from_scratch() {
    let mut atlas = recording_atlas(AtlasConfig::default().with_eviction_fraction(0.0));
    for n in 0..2000 {
        reserve(&mut atlas, key(n), Size::new(100, 100));
    }
    assert_eq!(atlas.stats().page_rotations, 1);

    atlas.reset();
    assert!(atlas.is_empty());
    assert!((0..2000).all(|n| !atlas.exists(key(n))));
    assert_eq!(atlas.stats(), AtlasStats::default());
    assert_eq!(atlas.pages().cleared_pages, [1, 0, 1, 2, 3]);

    reserve(&mut atlas, key(5000), Size::new(100, 100));
    let record = atlas.placement(key(5000)).unwrap();
    assert_eq!((record.page, record.offset), (0, Offset::ORIGIN));
}

#[test]
fn lifecycle_clear_stats_keeps_entries() {
    let mut atlas = recording_atlas(AtlasConfig::default());
    reserve(&mut atlas, key(1), Size::new(8, 8));
    reserve(&mut atlas, key(1), Size::new(8, 8));
    atlas.clear_stats();
    let stats = atlas.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!((stats.hits, stats.misses), (0, 0));
    assert!(atlas.exists(key(1)));
}

#[test]
fn lifecycle_oversized_storage_pages_are_capped() {
    let pages = RecordingPages {
        size: 8192,
        count: 2,
        ..RecordingPages::default()
    };
    let mut atlas = ShapeAtlas::new(AtlasConfig::default(), pages);
    assert_eq!(atlas.config().page_size, 4096);
    assert_eq!(atlas.config().page_count, 2);

    reserve(&mut atlas, key(1), Size::new(6000, 6000));
    assert!(!atlas.exists(key(1)), "beyond the packed area");
    assert_eq!(atlas.stats().rejected, 1);

    reserve(&mut atlas, key(2), Size::new(4000, 4000));
    let view = atlas.lookup(key(2)).unwrap();
    assert_eq!(view.uv_min, [0.0, 0.0]);
    assert_eq!(view.uv_max, [4000.0 / 8192.0, 4000.0 / 8192.0]);
}
