// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shelf packing cursor.

use crate::region::{Offset, Size};

/// Places rectangles left to right in rows ("shelves") on the current page.
///
/// The packer is only a cursor: it never remembers what it placed. When the
/// current page runs out of rows, the caller decides whether to reuse an old
/// slot or to [`rotate`](Self::rotate) to the next page.
#[derive(Clone, Debug)]
pub(crate) struct ShelfPacker {
    page_size: u32,
    padding: Size,
    page: u32,
    cursor: Offset,
    /// Tallest rectangle placed on the open shelf.
    shelf_height: u32,
}

impl ShelfPacker {
    pub(crate) fn new(page_size: u32, padding: Size) -> Self {
        Self {
            page_size,
            padding,
            page: 0,
            cursor: Offset::ORIGIN,
            shelf_height: 0,
        }
    }

    #[inline]
    pub(crate) fn page(&self) -> u32 {
        self.page
    }

    #[inline]
    pub(crate) fn cursor(&self) -> Offset {
        self.cursor
    }

    #[inline]
    pub(crate) fn shelf_height(&self) -> u32 {
        self.shelf_height
    }

    /// Whether `size` would fit on a freshly cleared page.
    pub(crate) fn fits_empty_page(&self, size: Size) -> bool {
        u64::from(size.width) + u64::from(self.padding.width) < u64::from(self.page_size)
            && u64::from(size.height) + u64::from(self.padding.height) < u64::from(self.page_size)
    }

    /// Whether the open shelf has no horizontal room left for `size`.
    pub(crate) fn needs_wrap(&self, size: Size) -> bool {
        u64::from(self.cursor.x) + u64::from(size.width) + u64::from(self.padding.width)
            >= u64::from(self.page_size)
    }

    /// Closes the open shelf and starts a new one below it.
    pub(crate) fn wrap(&mut self) {
        self.cursor.y = self
            .cursor
            .y
            .saturating_add(self.shelf_height)
            .saturating_add(self.padding.height);
        self.cursor.x = 0;
        self.shelf_height = 0;
    }

    /// Whether the page has vertical room for `size` at the cursor.
    pub(crate) fn fits_vertically(&self, size: Size) -> bool {
        u64::from(self.cursor.y) + u64::from(size.height) + u64::from(self.padding.height)
            < u64::from(self.page_size)
    }

    /// Places `size` at the cursor and advances past it.
    pub(crate) fn place(&mut self, size: Size) -> Offset {
        let offset = self.cursor;
        self.cursor.x += size.width + self.padding.width;
        self.shelf_height = self.shelf_height.max(size.height);
        offset
    }

    /// Moves to the next page, wrapping around, and rewinds to its origin.
    ///
    /// Returns the new page index.
    pub(crate) fn rotate(&mut self, page_count: u32) -> u32 {
        self.page = (self.page + 1) % page_count.max(1);
        self.cursor = Offset::ORIGIN;
        self.shelf_height = 0;
        self.page
    }

    /// Rewinds to the origin of the first page.
    pub(crate) fn reset(&mut self) {
        self.page = 0;
        self.cursor = Offset::ORIGIN;
        self.shelf_height = 0;
    }
}
