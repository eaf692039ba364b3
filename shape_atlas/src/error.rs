// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::region::Region;

/// Error reported by page storage operations.
///
/// Carries a non-exhaustive [`ErrorKind`] plus the page and, when relevant,
/// the pixel region the failed operation targeted.
///
/// The atlas never propagates these: it logs them and carries on, since a
/// failed clear or write only costs one frame of stale pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The non-exhaustive category describing this error.
    kind: ErrorKind,

    /// The page the operation targeted.
    page: u32,

    /// The region the operation targeted, if any.
    region: Option<Region>,

    /// Number of pages or pixels expected, depending on `kind`.
    expected: usize,

    /// Number of pages or pixels found, depending on `kind`.
    found: usize,
}

impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The page the failed operation targeted.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// The pixel region the failed operation targeted, if any.
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub(crate) fn page_out_of_range(page: u32, page_count: usize) -> Self {
        Self {
            kind: ErrorKind::PageOutOfRange,
            page,
            region: None,
            expected: page_count,
            found: page as usize,
        }
    }

    pub(crate) fn region_out_of_bounds(page: u32, region: Region, page_size: u32) -> Self {
        Self {
            kind: ErrorKind::RegionOutOfBounds,
            page,
            region: Some(region),
            expected: page_size as usize,
            found: 0,
        }
    }

    pub(crate) fn pixel_count_mismatch(
        page: u32,
        region: Region,
        expected: usize,
        found: usize,
    ) -> Self {
        Self {
            kind: ErrorKind::PixelCountMismatch,
            page,
            region: Some(region),
            expected,
            found,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::PageOutOfRange => write!(
                f,
                "page {} out of range for an atlas with {} pages",
                self.page, self.expected
            ),
            ErrorKind::RegionOutOfBounds => {
                let Region { offset, size } = self.region.unwrap_or_default();
                write!(
                    f,
                    "region {}x{} at ({}, {}) exceeds the {} pixel edge of page {}",
                    size.width, size.height, offset.x, offset.y, self.expected, self.page
                )
            }
            ErrorKind::PixelCountMismatch => write!(
                f,
                "expected {} pixels for page {} but got {}",
                self.expected, self.page, self.found
            ),
        }
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The page index is not below the number of pages.
    PageOutOfRange,

    /// The region does not lie entirely inside the page.
    RegionOutOfBounds,

    /// The pixel buffer length does not match the region it should fill.
    PixelCountMismatch,
}
