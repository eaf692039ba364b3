// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape Atlas caches rasterized vector shapes in a fixed set of texture pages.
//!
//! A shape is identified by a [`ShapeKey`] derived from a content fingerprint,
//! the scale it is rasterized at and an auxiliary transform parameter. The
//! [`ShapeAtlas`] packs shapes onto square pages in shelves and hands out
//! texture coordinates. When a page is full it takes over the slot of a
//! least recently used shape, or rotates to the next page and evicts
//! everything on it, so memory stays bounded by the page storage.
//!
//! Pixels are produced by a [`ShapeRasterizer`], either before the atlas call
//! returns ([`Dispatch::Blocking`]) or in the background
//! ([`Dispatch::Deferred`]), for example on a [`RasterWorker`].
//!
//! ```
//! use shape_atlas::{AtlasConfig, CpuPages, RasterImage, Rgba8, ShapeAtlas, ShapeRequest};
//! use shape_atlas::PixelSink;
//!
//! let config = AtlasConfig::default().with_page_size(256).with_page_count(2);
//! let mut atlas = ShapeAtlas::new(config, CpuPages::new(&config));
//!
//! let request = ShapeRequest {
//!     fingerprint: b"circle",
//!     scale: 2.0,
//!     transform: 0.0,
//!     bounds: [16.0, 16.0],
//! };
//! let size = request.pixel_size().unwrap();
//! let view = atlas
//!     .get_or_insert_with(request.key(), size, |pages, target| {
//!         let image = RasterImage::filled(target.size, Rgba8::WHITE);
//!         pages.write_pixels(target.page, target.offset, &image).unwrap();
//!     })
//!     .unwrap();
//! assert_eq!(view.uv_max, [32.0 / 256.0, 32.0 / 256.0]);
//! assert!(atlas.exists(request.key()));
//! ```
//!
//! ## Features
//!
//! - `std` (enabled by default): Enables [`RasterWorker`], a thread pool for
//!   deferred rasterization.
//! - `png`: Enables [`CpuPages::save_png`] for inspecting pages.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod cache;
mod config;
mod error;
mod impl_bytemuck;
mod key;
mod lru;
mod math;
mod policy;
mod raster;
mod region;
mod shelf;
mod storage;
#[cfg(feature = "std")]
mod worker;

pub use cache::{AtlasStats, ShapeAtlas};
pub use config::{
    AtlasConfig, DEFAULT_EVICTION_FRACTION, DEFAULT_PADDING, DEFAULT_PAGE_COUNT, MAX_PAGE_SIZE,
    UvOrigin,
};
pub use error::{Error, ErrorKind};
pub use key::{ShapeKey, ShapeRequest};
pub use lru::{LruCursor, LruIter, LruStore};
pub use policy::{Reclaim, find_reusable_slot, scan_budget};
pub use raster::{Dispatch, RasterImage, RasterTarget, RasterUpload, ShapeRasterizer};
pub use region::{AtlasView, Offset, PageHandle, PlacementRecord, Region, Size};
pub use storage::{CpuPages, PageStorage, PixelSink, Rgba8};
#[cfg(feature = "std")]
pub use worker::RasterWorker;
