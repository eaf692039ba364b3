// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shelf packing on full-size pages.

use shape_atlas::{AtlasConfig, Offset, PageHandle, Size};

use crate::util::{key, recording_atlas, reserve};

const ITEM: Size = Size::new(100, 100);

#[test]
fn shelf_wraps_near_right_edge() {
    let mut atlas = recording_atlas(AtlasConfig::default());
    for n in 0..37 {
        reserve(&mut atlas, key(n), ITEM);
    }
    let last = atlas.placement(key(36)).unwrap();
    assert_eq!(last.offset, Offset::new(36 * 110, 0));

    // The next item would end at 4070 + 100 + 10 >= 4096.
    reserve(&mut atlas, key(37), ITEM);
    let wrapped = atlas.placement(key(37)).unwrap();
    assert_eq!(wrapped.offset, Offset::new(0, 110));
    assert_eq!(wrapped.page, 0);

    reserve(&mut atlas, key(38), ITEM);
    let next = atlas.placement(key(38)).unwrap();
    assert_eq!(next.offset, Offset::new(110, 110));
}

#[test]
fn shelf_height_follows_tallest_item() {
    let mut atlas = recording_atlas(AtlasConfig::default());
    reserve(&mut atlas, key(0), Size::new(100, 40));
    reserve(&mut atlas, key(1), Size::new(100, 300));
    reserve(&mut atlas, key(2), Size::new(100, 80));
    // Too wide for what is left of the shelf.
    reserve(&mut atlas, key(3), Size::new(3800, 10));
    let wide = atlas.placement(key(3)).unwrap();
    assert_eq!(wide.offset, Offset::new(0, 310));
}

#[test]
fn shelf_records_stay_inside_the_page() {
    let mut atlas = recording_atlas(AtlasConfig::default().with_eviction_fraction(0.0));
    let sizes = [
        Size::new(100, 100),
        Size::new(731, 97),
        Size::new(13, 1200),
        Size::new(2048, 512),
        Size::new(4000, 4000),
        Size::new(1, 1),
    ];
    for n in 0..600_u64 {
        let size = sizes[n as usize % sizes.len()];
        let view = atlas.get_or_insert_with(key(n), size, |_, _| {}).unwrap();
        let record = atlas.placement(key(n)).unwrap();
        let slot = record.allotted_region();
        assert!(slot.fits_in(4096), "{record:?} leaves the page");
        assert_eq!(view.page, PageHandle::Page(record.page));
        for uv in [view.uv_min, view.uv_max] {
            assert!(
                uv.iter().all(|c| (0.0..=1.0).contains(c)),
                "{view:?} leaves the unit square"
            );
        }
    }
}
