// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

//! Uncompressed 24 bit bitmap file decoding and encoding.
//!
//! The file starts with a fixed 54 byte header (14 byte file header followed by the 40 byte info
//! header), all fields little endian. Pixel rows are stored bottom row first, 3 bytes per pixel in
//! blue, green, red order, each row padded to a multiple of 4 bytes.

use crate::error::{Error, Result};
use crate::pixel::Rgb24;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use image::{Rgb, RgbImage};
use log::debug;
use std::fs;
use std::path::Path;

pub const BITMAP_HEADER_SIZE: usize = 54;
/// The only supported pixel format.
pub const BITMAP_BPP: u16 = 24;

const INFO_HEADER_SIZE: u32 = 40;
const BITMAP_MAGIC: u16 = u16::from_le_bytes(*b"BM");
const BYTES_PER_PIXEL: usize = 3;

/// Bitmap file and info header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapHeader {
    pub magic: u16,
    pub file_size: u32,
    pub reserved: u32,
    /// Offset of the pixel data from the start of the file.
    pub data_offset: u32,
    pub header_size: u32,
    pub width: i32,
    /// Positive: bottom-up row order.
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

impl BitmapHeader {
    /// Create a header for an uncompressed 24 bit bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        let mut header = Self {
            magic: BITMAP_MAGIC,
            file_size: 0,
            reserved: 0,
            data_offset: BITMAP_HEADER_SIZE as u32,
            header_size: INFO_HEADER_SIZE,
            width: 0,
            height: 0,
            planes: 1,
            bit_count: BITMAP_BPP,
            compression: 0,
            image_size: 0,
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            colors_used: 0,
            colors_important: 0,
        };
        header.set_dimensions(width, height);
        header
    }

    /// Parse the 54 byte header. Fails if fewer bytes are available.
    pub fn parse(data: &mut impl Buf) -> Result<Self> {
        if data.remaining() < BITMAP_HEADER_SIZE {
            return Err(Error::truncated(format!(
                "bitmap header has {} of {BITMAP_HEADER_SIZE} bytes",
                data.remaining()
            )));
        }

        Ok(Self {
            magic: data.get_u16_le(),
            file_size: data.get_u32_le(),
            reserved: data.get_u32_le(),
            data_offset: data.get_u32_le(),
            header_size: data.get_u32_le(),
            width: data.get_i32_le(),
            height: data.get_i32_le(),
            planes: data.get_u16_le(),
            bit_count: data.get_u16_le(),
            compression: data.get_u32_le(),
            image_size: data.get_u32_le(),
            x_pels_per_meter: data.get_i32_le(),
            y_pels_per_meter: data.get_i32_le(),
            colors_used: data.get_u32_le(),
            colors_important: data.get_u32_le(),
        })
    }

    pub fn write(&self, out: &mut impl BufMut) {
        out.put_u16_le(self.magic);
        out.put_u32_le(self.file_size);
        out.put_u32_le(self.reserved);
        out.put_u32_le(self.data_offset);
        out.put_u32_le(self.header_size);
        out.put_i32_le(self.width);
        out.put_i32_le(self.height);
        out.put_u16_le(self.planes);
        out.put_u16_le(self.bit_count);
        out.put_u32_le(self.compression);
        out.put_u32_le(self.image_size);
        out.put_i32_le(self.x_pels_per_meter);
        out.put_i32_le(self.y_pels_per_meter);
        out.put_u32_le(self.colors_used);
        out.put_u32_le(self.colors_important);
    }

    /// Check for a bottom-up, uncompressed 24 bit bitmap.
    pub fn validate(&self) -> Result<()> {
        if self.bit_count != BITMAP_BPP {
            return Err(Error::Format(format!(
                "unsupported bit depth {}, only {BITMAP_BPP} is supported",
                self.bit_count
            )));
        }
        if self.compression != 0 {
            return Err(Error::Format(format!(
                "unsupported compression {}, only uncompressed bitmaps are supported",
                self.compression
            )));
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(Error::Format(format!(
                "invalid dimensions {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Set width and height and recompute the 24 bit size fields.
    ///
    /// Size fields count 3 bytes per pixel without row padding.
    fn set_dimensions(&mut self, width: u32, height: u32) {
        let image_size = width as u64 * height as u64 * BYTES_PER_PIXEL as u64;
        self.width = width as i32;
        self.height = height as i32;
        self.image_size = u32::try_from(image_size).unwrap_or(u32::MAX);
        self.file_size = u32::try_from(image_size + BITMAP_HEADER_SIZE as u64).unwrap_or(u32::MAX);
        self.bit_count = BITMAP_BPP;
    }
}

/// Number of padding bytes after a pixel row to reach a multiple of 4 bytes.
pub fn row_padding(width: u32) -> usize {
    (4 - (width as usize * BYTES_PER_PIXEL) % 4) % 4
}

/// Decoded bitmap: header and a top-down 24 bit pixel grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapImage {
    header: BitmapHeader,
    pixels: RgbImage,
}

impl BitmapImage {
    /// Create a black image with a fresh 24 bit header.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            header: BitmapHeader::new(width, height),
            pixels: RgbImage::new(width, height),
        }
    }

    /// Decode a bitmap file.
    ///
    /// Fails with [`Error::Format`] for anything other than an uncompressed, bottom-up 24 bit
    /// bitmap and with [`Error::Io`] if the data ends within the header or pixel rows.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buf = data;
        let header = BitmapHeader::parse(&mut buf)?;
        header.validate()?;

        let gap = (header.data_offset as usize).saturating_sub(BITMAP_HEADER_SIZE);
        if gap > buf.remaining() {
            return Err(Error::truncated(format!(
                "pixel data offset {} beyond end of data",
                header.data_offset
            )));
        }
        buf.advance(gap);

        let width = header.width as u32;
        let height = header.height as u32;
        let row_len = width as usize * BYTES_PER_PIXEL;
        let padding = row_padding(width);

        // padding of the last row may be missing
        let complete_rows = (buf.remaining() + padding) / (row_len + padding);
        if complete_rows < height as usize {
            return Err(Error::truncated(format!(
                "pixel data ends in row {complete_rows} of {height}"
            )));
        }

        debug!("Decoding bitmap {width}x{height}, row padding {padding}");

        let mut pixels = RgbImage::new(width, height);
        for row in (0..height).rev() {
            for col in 0..width {
                let b = buf.get_u8();
                let g = buf.get_u8();
                let r = buf.get_u8();
                pixels.put_pixel(col, row, Rgb([r, g, b]));
            }
            buf.advance(padding.min(buf.remaining()));
        }

        Ok(Self { header, pixels })
    }

    /// Encode the top-left `crop_width` x `crop_height` region as a 24 bit bitmap file.
    ///
    /// The header is derived from the image header with dimensions and size fields replaced.
    /// Crop dimensions larger than the image are limited to the image size.
    pub fn encode(&self, crop_width: u32, crop_height: u32) -> Bytes {
        let width = crop_width.min(self.width());
        let height = crop_height.min(self.height());
        let padding = row_padding(width);

        let mut header = self.header.clone();
        header.set_dimensions(width, height);
        header.data_offset = BITMAP_HEADER_SIZE as u32;
        header.header_size = INFO_HEADER_SIZE;

        let row_len = width as usize * BYTES_PER_PIXEL + padding;
        let mut out = BytesMut::with_capacity(BITMAP_HEADER_SIZE + row_len * height as usize);
        header.write(&mut out);

        for row in (0..height).rev() {
            for col in 0..width {
                let Rgb([r, g, b]) = self.pixel(row, col);
                out.put_slice(&[b, g, r]);
            }
            out.put_bytes(0, padding);
        }

        out.freeze()
    }

    /// Read and decode a bitmap file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path)?;
        Self::decode(&data)
    }

    /// Encode the cropped image and write it to `path`, replacing an existing file.
    pub fn save(&self, path: impl AsRef<Path>, crop_width: u32, crop_height: u32) -> Result<()> {
        fs::write(path, self.encode(crop_width, crop_height))?;
        Ok(())
    }

    pub fn header(&self) -> &BitmapHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Pixel at `(row, col)`, row 0 is the top row.
    pub fn pixel(&self, row: u32, col: u32) -> Rgb24 {
        *self.pixels.get_pixel(col, row)
    }

    pub fn set_pixel(&mut self, row: u32, col: u32, pixel: Rgb24) {
        self.pixels.put_pixel(col, row, pixel);
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}
