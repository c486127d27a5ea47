// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

//! Raster surface abstraction and an in-memory implementation.

use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;
use std::io;
use std::str::FromStr;

/// Packed pixel format of a raster surface cell.
#[derive(Debug, Copy, Clone, Serialize_repr, Deserialize_repr, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum BitDepth {
    /// 16 bit packed pixel: 5 bit blue, 6 bit green, 5 bit red.
    Bpp16 = 16,
    /// 32 bit packed pixel: unused top byte, 8 bit blue, green and red.
    #[default]
    Bpp32 = 32,
}

impl BitDepth {
    pub fn bits(self) -> u32 {
        self as u32
    }

    pub fn bytes_per_pixel(self) -> usize {
        self as usize / 8
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl FromStr for BitDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16" => Ok(BitDepth::Bpp16),
            "32" => Ok(BitDepth::Bpp32),
            other => Err(format!("unsupported bit depth '{other}', expected 16 or 32")),
        }
    }
}

impl TryFrom<u32> for BitDepth {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            16 => Ok(BitDepth::Bpp16),
            32 => Ok(BitDepth::Bpp32),
            other => Err(format!("unsupported bit depth {other}, expected 16 or 32")),
        }
    }
}

/// Visible and addressable resolution of a raster surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SurfaceGeometry {
    /// Visible width in pixels.
    pub xres: u32,
    /// Visible height in pixels.
    pub yres: u32,
    /// Addressable width in pixels, also the row stride in cells.
    pub xres_virtual: u32,
    /// Addressable height in pixels.
    pub yres_virtual: u32,
    pub bit_depth: BitDepth,
}

impl SurfaceGeometry {
    /// Geometry without a virtual area beyond the visible resolution.
    pub fn new(xres: u32, yres: u32, bit_depth: BitDepth) -> Self {
        Self {
            xres,
            yres,
            xres_virtual: xres,
            yres_virtual: yres,
            bit_depth,
        }
    }

    /// Set the addressable resolution. Values below the visible resolution are raised to it.
    pub fn with_virtual(mut self, xres_virtual: u32, yres_virtual: u32) -> Self {
        self.xres_virtual = xres_virtual.max(self.xres);
        self.yres_virtual = yres_virtual.max(self.yres);
        self
    }

    /// Number of addressable cells.
    pub fn cell_count(&self) -> usize {
        self.xres_virtual as usize * self.yres_virtual as usize
    }

    /// Cell index of `(row, col)` using `xres_virtual` as stride.
    pub fn offset(&self, row: u32, col: u32) -> usize {
        self.xres_virtual as usize * row as usize + col as usize
    }
}

/// A writable grid of packed pixel cells owned by a display device.
///
/// Cells are addressed by `(row, col)`, row 0 being the visual top row. A cell value holds one
/// packed pixel of the surface bit depth; for 16 bit surfaces only the low 16 bits are used.
pub trait RasterSurface {
    fn geometry(&self) -> SurfaceGeometry;

    /// Read one cell. Panics if `(row, col)` is outside the addressable area.
    fn read_cell(&self, row: u32, col: u32) -> u32;

    /// Write one cell. Panics if `(row, col)` is outside the addressable area.
    fn write_cell(&mut self, row: u32, col: u32, value: u32);

    /// Set every cell to zero.
    fn clear(&mut self);

    /// Push pending cell writes to the device.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn cell_mask(bit_depth: BitDepth) -> u32 {
    match bit_depth {
        BitDepth::Bpp16 => 0xFFFF,
        BitDepth::Bpp32 => 0xFFFF_FFFF,
    }
}

/// Raster surface backed by process memory.
///
/// Used to simulate a frame buffer device and as the cell store of [`crate::FramebufferSurface`].
#[derive(Debug, Clone)]
pub struct MemorySurface {
    geometry: SurfaceGeometry,
    cells: Vec<u32>,
}

impl MemorySurface {
    pub fn new(geometry: SurfaceGeometry) -> Self {
        Self {
            geometry,
            cells: vec![0; geometry.cell_count()],
        }
    }

    /// All cells in row-major order, `xres_virtual` cells per row.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u32] {
        &mut self.cells
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }
}

impl RasterSurface for MemorySurface {
    fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    fn read_cell(&self, row: u32, col: u32) -> u32 {
        self.cells[self.geometry.offset(row, col)]
    }

    fn write_cell(&mut self, row: u32, col: u32, value: u32) {
        let offset = self.geometry.offset(row, col);
        self.cells[offset] = value & cell_mask(self.geometry.bit_depth);
    }

    fn clear(&mut self) {
        self.cells.fill(0);
    }
}

impl<S: RasterSurface + ?Sized> RasterSurface for Box<S> {
    fn geometry(&self) -> SurfaceGeometry {
        (**self).geometry()
    }

    fn read_cell(&self, row: u32, col: u32) -> u32 {
        (**self).read_cell(row, col)
    }

    fn write_cell(&mut self, row: u32, col: u32, value: u32) {
        (**self).write_cell(row, col, value)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
