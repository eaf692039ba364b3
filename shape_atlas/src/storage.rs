// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page storage.
//!
//! The atlas does not own any pixels itself. It talks to a [`PageStorage`],
//! which is usually a set of GPU textures or framebuffer attachments, and
//! only ever asks it to clear things. Rasterizers that write pixels need a
//! [`PixelSink`]. [`CpuPages`] implements both in memory.

use alloc::vec;
use alloc::vec::Vec;

use crate::config::{AtlasConfig, MAX_PAGE_SIZE};
use crate::error::Error;
use crate::raster::RasterImage;
use crate::region::{Offset, Region};

/// An 8-bit RGBA pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent black, the color of a cleared page.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Creates a pixel from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// The pages an atlas places shapes on.
///
/// Pages are square and pre-allocated; their number and size never change
/// for the lifetime of the storage.
pub trait PageStorage {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Edge length of every page in pixels.
    fn page_size(&self) -> u32;

    /// Clears every pixel of `page`.
    fn clear_page(&mut self, page: u32) -> Result<(), Error>;

    /// Clears the pixels of `region` on `page`, leaving the rest untouched.
    fn clear_region(&mut self, page: u32, region: Region) -> Result<(), Error>;
}

/// Page storage that accepts pixels produced on the CPU.
pub trait PixelSink: PageStorage {
    /// Copies `image` into `page` with its top-left corner at `offset`.
    fn write_pixels(&mut self, page: u32, offset: Offset, image: &RasterImage) -> Result<(), Error>;
}

/// In-memory RGBA pages.
#[derive(Clone, PartialEq, Eq)]
pub struct CpuPages {
    size: u32,
    pages: Vec<Vec<Rgba8>>,
}

impl CpuPages {
    /// Allocates transparent pages matching `config`.
    ///
    /// The config is [sanitized](AtlasConfig::sanitized) first.
    pub fn new(config: &AtlasConfig) -> Self {
        let config = config.sanitized();
        Self::alloc(config.page_size, config.page_count)
    }

    /// Allocates `page_count` transparent pages of `page_size` squared pixels.
    ///
    /// Sizes above [`MAX_PAGE_SIZE`] are clamped with a warning.
    pub fn with_geometry(page_size: u32, page_count: u32) -> Self {
        let page_size = if page_size > MAX_PAGE_SIZE {
            log::warn!("clamping atlas page size {page_size} to {MAX_PAGE_SIZE}");
            MAX_PAGE_SIZE
        } else {
            page_size
        };
        Self::alloc(page_size, page_count)
    }

    fn alloc(page_size: u32, page_count: u32) -> Self {
        let len = page_size as usize * page_size as usize;
        Self {
            size: page_size,
            pages: (0..page_count)
                .map(|_| vec![Rgba8::TRANSPARENT; len])
                .collect(),
        }
    }

    /// Row-major pixels of `page`.
    pub fn pixels(&self, page: u32) -> Option<&[Rgba8]> {
        self.pages.get(page as usize).map(Vec::as_slice)
    }

    /// The pixel at `(x, y)` on `page`.
    pub fn pixel(&self, page: u32, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let pixels = self.pixels(page)?;
        pixels
            .get(y as usize * self.size as usize + x as usize)
            .copied()
    }

    /// Raw RGBA bytes of `page`, ready for a texture upload.
    pub fn as_bytes(&self, page: u32) -> Option<&[u8]> {
        self.pixels(page).map(bytemuck::cast_slice)
    }

    /// Writes `page` to a PNG file, creating parent directories as needed.
    #[cfg(feature = "png")]
    pub fn save_png(&self, page: u32, path: &std::path::Path) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::BufWriter;

        let bytes = self.as_bytes(page).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                Error::page_out_of_range(page, self.pages.len()),
            )
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let w = BufWriter::new(file);

        let mut encoder = png::Encoder::new(w, self.size, self.size);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(std::io::Error::other)?;
        writer
            .write_image_data(bytes)
            .map_err(std::io::Error::other)?;

        Ok(())
    }

    fn page_mut(&mut self, page: u32) -> Result<&mut [Rgba8], Error> {
        let count = self.pages.len();
        self.pages
            .get_mut(page as usize)
            .map(Vec::as_mut_slice)
            .ok_or_else(|| Error::page_out_of_range(page, count))
    }

    fn check_region(&self, page: u32, region: Region) -> Result<(), Error> {
        if region.fits_in(self.size) {
            Ok(())
        } else {
            Err(Error::region_out_of_bounds(page, region, self.size))
        }
    }
}

impl PageStorage for CpuPages {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "pages are only ever allocated from a u32 count"
    )]
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self) -> u32 {
        self.size
    }

    fn clear_page(&mut self, page: u32) -> Result<(), Error> {
        self.page_mut(page)?.fill(Rgba8::TRANSPARENT);
        Ok(())
    }

    fn clear_region(&mut self, page: u32, region: Region) -> Result<(), Error> {
        self.check_region(page, region)?;
        let stride = self.size as usize;
        let pixels = self.page_mut(page)?;
        let x = region.offset.x as usize;
        let width = region.size.width as usize;
        for row in 0..region.size.height as usize {
            let start = (region.offset.y as usize + row) * stride + x;
            pixels[start..start + width].fill(Rgba8::TRANSPARENT);
        }
        Ok(())
    }
}

impl PixelSink for CpuPages {
    fn write_pixels(
        &mut self,
        page: u32,
        offset: Offset,
        image: &RasterImage,
    ) -> Result<(), Error> {
        let region = Region::new(offset, image.size());
        let expected = image.width as usize * image.height as usize;
        let found = image.pixels.len();
        if found != expected {
            return Err(Error::pixel_count_mismatch(page, region, expected, found));
        }
        self.check_region(page, region)?;
        let stride = self.size as usize;
        let pixels = self.page_mut(page)?;
        let width = image.width as usize;
        if width == 0 {
            return Ok(());
        }
        for (row, src) in image.pixels.chunks_exact(width).enumerate() {
            let start = (offset.y as usize + row) * stride + offset.x as usize;
            pixels[start..start + width].copy_from_slice(src);
        }
        Ok(())
    }
}

impl core::fmt::Debug for CpuPages {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CpuPages")
            .field("size", &self.size)
            .field("pages", &self.pages.len())
            .finish()
    }
}
