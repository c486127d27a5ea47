// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

//! Transfer of pixels between decoded bitmaps and a raster surface.

use crate::bmp::BitmapImage;
use crate::pixel::{Rgb24, abgr32_to_24, adjust_brightness, bgr16_to_24, rgb24_to_16, rgb24_to_32};

use fbbmp_device::{BitDepth, RasterSurface};
use log::debug;

/// Draws bitmaps onto and captures bitmaps from surfaces of one bit depth.
#[derive(Debug, Copy, Clone)]
pub struct Compositor {
    bit_depth: BitDepth,
}

impl Compositor {
    pub fn new(bit_depth: BitDepth) -> Self {
        Self { bit_depth }
    }

    fn pack(&self, pixel: Rgb24) -> u32 {
        match self.bit_depth {
            BitDepth::Bpp16 => rgb24_to_16(pixel) as u32,
            BitDepth::Bpp32 => rgb24_to_32(pixel),
        }
    }

    fn unpack(&self, cell: u32) -> Rgb24 {
        match self.bit_depth {
            BitDepth::Bpp16 => bgr16_to_24(cell as u16),
            BitDepth::Bpp32 => abgr32_to_24(cell),
        }
    }

    /// Draw `image` at the top-left corner of `surface` with the given brightness delta.
    ///
    /// The drawn area is clipped to the visible resolution, cells outside of it are not touched.
    pub fn blit<S>(&self, image: &BitmapImage, surface: &mut S, brightness: i32)
    where
        S: RasterSurface + ?Sized,
    {
        let geometry = surface.geometry();
        let height = image.height().min(geometry.yres);
        let width = image.width().min(geometry.xres);
        debug!("Drawing {width}x{height} pixels with brightness {brightness}");

        for row in 0..height {
            for col in 0..width {
                let pixel = adjust_brightness(image.pixel(row, col), brightness);
                surface.write_cell(row, col, self.pack(pixel));
            }
        }
    }

    /// Read the complete addressable area of `surface` into a new 24 bit image.
    pub fn capture<S>(&self, surface: &S) -> BitmapImage
    where
        S: RasterSurface + ?Sized,
    {
        let geometry = surface.geometry();
        let height = geometry.yres_virtual;
        let width = geometry.xres_virtual;
        debug!("Capturing {width}x{height} pixels");

        let mut image = BitmapImage::new(width, height);
        for row in (0..height).rev() {
            for col in 0..width {
                image.set_pixel(row, col, self.unpack(surface.read_cell(row, col)));
            }
        }

        image
    }
}
