// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

//! Linux frame buffer device.
//!
//! Geometry and pixel format are taken from the sysfs attributes of the device
//! (`/sys/class/graphics/fbN`). Pixel memory is accessed with positioned reads and writes on the
//! device node, cells are stored little endian.

use crate::surface::{BitDepth, MemorySurface, RasterSurface, SurfaceGeometry};

use anyhow::{Context, anyhow, bail};
use bytes::{Buf, BufMut, BytesMut};
use log::{debug, info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

pub const DEFAULT_FB_DEVICE: &str = "/dev/fb0";
pub const DEFAULT_SIMULATED_SIZE: (u32, u32) = (800, 480);

const SYSFS_GRAPHICS: &str = "/sys/class/graphics";

#[derive(Default)]
pub struct FramebufferBuilder {
    bit_depth: Option<BitDepth>,
    sysfs_dir: Option<PathBuf>,
}

impl FramebufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pixel format to switch the device to. Defaults to the current device setting.
    pub fn bit_depth(&mut self, bit_depth: BitDepth) -> &mut Self {
        self.bit_depth = Some(bit_depth);
        self
    }

    /// Directory containing the sysfs attributes of the device. Defaults to
    /// `/sys/class/graphics/<device name>`.
    pub fn sysfs_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.sysfs_dir = Some(dir.into());
        self
    }

    /// Open the default frame buffer device `/dev/fb0`.
    pub fn open_default(self) -> anyhow::Result<FramebufferSurface> {
        self.open_device(DEFAULT_FB_DEVICE)
    }

    /// Simulate the frame buffer in memory. No device is required.
    pub fn simulate(self, size: (u32, u32)) -> MemorySurface {
        let geometry = SurfaceGeometry::new(size.0, size.1, self.bit_depth.unwrap_or_default());
        info!(
            "Simulating frame buffer {}x{}, {} bpp",
            geometry.xres, geometry.yres, geometry.bit_depth
        );
        MemorySurface::new(geometry)
    }

    /// Open the specified frame buffer device node.
    pub fn open_device(self, device: impl AsRef<Path>) -> anyhow::Result<FramebufferSurface> {
        let device = device.as_ref();
        let sysfs_dir = match self.sysfs_dir {
            Some(dir) => dir,
            None => {
                let name = device
                    .file_name()
                    .ok_or_else(|| anyhow!("Invalid frame buffer device: {device:?}"))?;
                Path::new(SYSFS_GRAPHICS).join(name)
            }
        };

        let bit_depth = match self.bit_depth {
            Some(requested) => set_bits_per_pixel(&sysfs_dir, requested)?,
            None => read_bits_per_pixel(&sysfs_dir)?,
        };

        let virtual_size = read_attr(&sysfs_dir, "virtual_size")?;
        let (xres_virtual, yres_virtual) = parse_size(&virtual_size, ',')
            .with_context(|| format!("Invalid virtual_size attribute: {}", virtual_size.trim()))?;

        // the visible area never exceeds the device memory
        let (xres, yres) = match fs::read_to_string(sysfs_dir.join("mode")) {
            Ok(mode) => parse_mode(&mode)
                .map(|(x, y)| (x.min(xres_virtual), y.min(yres_virtual)))
                .unwrap_or((xres_virtual, yres_virtual)),
            Err(e) => {
                debug!("No video mode available, using virtual size: {e}");
                (xres_virtual, yres_virtual)
            }
        };

        let geometry = SurfaceGeometry::new(xres, yres, bit_depth)
            .with_virtual(xres_virtual, yres_virtual);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device)
            .with_context(|| format!("Error opening frame buffer: {device:?}"))?;

        info!(
            "Opened frame buffer {device:?}: {}x{} (virtual {}x{}), {} bpp",
            geometry.xres,
            geometry.yres,
            geometry.xres_virtual,
            geometry.yres_virtual,
            geometry.bit_depth
        );

        let mut surface = FramebufferSurface {
            file,
            shadow: MemorySurface::new(geometry),
            dirty: false,
        };
        if let Err(e) = surface.load() {
            warn!("Failed to read frame buffer content, starting blank: {e}");
        }

        Ok(surface)
    }
}

/// Frame buffer device with a shadow copy of its cells.
///
/// Cell reads and writes operate on the shadow copy, [`RasterSurface::flush`] writes it back to
/// the device.
pub struct FramebufferSurface {
    file: File,
    shadow: MemorySurface,
    dirty: bool,
}

impl FramebufferSurface {
    fn byte_len(&self) -> usize {
        let geometry = self.shadow.geometry();
        geometry.cell_count() * geometry.bit_depth.bytes_per_pixel()
    }

    fn load(&mut self) -> io::Result<()> {
        let mut buf = vec![0u8; self.byte_len()];
        self.file.read_exact_at(&mut buf, 0)?;

        let bit_depth = self.shadow.geometry().bit_depth;
        let mut data = buf.as_slice();
        for cell in self.shadow.cells_mut() {
            *cell = match bit_depth {
                BitDepth::Bpp16 => data.get_u16_le() as u32,
                BitDepth::Bpp32 => data.get_u32_le(),
            };
        }

        Ok(())
    }
}

impl RasterSurface for FramebufferSurface {
    fn geometry(&self) -> SurfaceGeometry {
        self.shadow.geometry()
    }

    fn read_cell(&self, row: u32, col: u32) -> u32 {
        self.shadow.read_cell(row, col)
    }

    fn write_cell(&mut self, row: u32, col: u32, value: u32) {
        self.shadow.write_cell(row, col, value);
        self.dirty = true;
    }

    fn clear(&mut self) {
        self.shadow.clear();
        self.dirty = true;
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let mut buf = BytesMut::with_capacity(self.byte_len());
        match self.shadow.geometry().bit_depth {
            BitDepth::Bpp16 => self
                .shadow
                .cells()
                .iter()
                .for_each(|&cell| buf.put_u16_le(cell as u16)),
            BitDepth::Bpp32 => self
                .shadow
                .cells()
                .iter()
                .for_each(|&cell| buf.put_u32_le(cell)),
        }

        self.file.write_all_at(&buf, 0)?;
        self.file.flush()?;
        self.dirty = false;

        Ok(())
    }
}

fn read_attr(dir: &Path, name: &str) -> anyhow::Result<String> {
    let path = dir.join(name);
    fs::read_to_string(&path).with_context(|| format!("Failed to read {path:?}"))
}

fn read_bits_per_pixel(dir: &Path) -> anyhow::Result<BitDepth> {
    let value = read_attr(dir, "bits_per_pixel")?;
    let bits: u32 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid bits_per_pixel attribute: {value}"))?;
    BitDepth::try_from(bits).map_err(|e| anyhow!("Frame buffer not supported: {e}"))
}

fn set_bits_per_pixel(dir: &Path, requested: BitDepth) -> anyhow::Result<BitDepth> {
    let current = read_attr(dir, "bits_per_pixel")?;
    if current.trim() == requested.to_string() {
        return Ok(requested);
    }

    debug!("Changing bits per pixel from {} to {requested}", current.trim());
    let path = dir.join("bits_per_pixel");
    fs::write(&path, format!("{requested}\n"))
        .with_context(|| format!("Failed to set bits per pixel in {path:?}"))?;

    let changed = read_attr(dir, "bits_per_pixel")?;
    if changed.trim() != requested.to_string() {
        bail!(
            "Bits per pixel is not changed: requested {requested}, device reports {}",
            changed.trim()
        );
    }

    Ok(requested)
}

/// Parse a `<width><sep><height>` pair.
fn parse_size(value: &str, sep: char) -> Option<(u32, u32)> {
    let (w, h) = value.trim().split_once(sep)?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// Parse the resolution of the current video mode, e.g. `U:800x480p-0`.
fn parse_mode(mode: &str) -> Option<(u32, u32)> {
    let mode = mode.lines().next()?;
    let (_, mode) = mode.split_once(':')?;
    let end = mode
        .find(|c: char| !(c.is_ascii_digit() || c == 'x'))
        .unwrap_or(mode.len());
    parse_size(&mode[..end], 'x')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fake_device(bpp: &str, virtual_size: &str, mode: Option<&str>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("bits_per_pixel"), bpp).unwrap();
        fs::write(dir.path().join("virtual_size"), virtual_size).unwrap();
        if let Some(mode) = mode {
            fs::write(dir.path().join("mode"), mode).unwrap();
        }
        fs::write(dir.path().join("fb0"), vec![0u8; 1024]).unwrap();
        dir
    }

    fn open(
        dir: &tempfile::TempDir,
        bit_depth: Option<BitDepth>,
    ) -> anyhow::Result<FramebufferSurface> {
        let mut builder = FramebufferBuilder::new();
        builder.sysfs_dir(dir.path());
        if let Some(bit_depth) = bit_depth {
            builder.bit_depth(bit_depth);
        }
        builder.open_device(dir.path().join("fb0"))
    }

    #[rstest]
    #[case("U:800x480p-0\n", Some((800, 480)))]
    #[case("V:320x240", Some((320, 240)))]
    #[case("", None)]
    #[case("garbage", None)]
    fn parse_video_mode(#[case] mode: &str, #[case] expected: Option<(u32, u32)>) {
        assert_eq!(expected, parse_mode(mode));
    }

    #[rstest]
    #[case("1024,768\n", Some((1024, 768)))]
    #[case("8, 4", Some((8, 4)))]
    #[case("1024", None)]
    #[case("a,b", None)]
    fn parse_virtual_size(#[case] value: &str, #[case] expected: Option<(u32, u32)>) {
        assert_eq!(expected, parse_size(value, ','));
    }

    #[test]
    fn open_reads_geometry_from_sysfs() {
        let dir = fake_device("32\n", "8,4\n", Some("U:6x3p-0\n"));
        let surface = open(&dir, None).expect("open");
        let geometry = surface.geometry();
        assert_eq!((6, 3), (geometry.xres, geometry.yres));
        assert_eq!((8, 4), (geometry.xres_virtual, geometry.yres_virtual));
        assert_eq!(BitDepth::Bpp32, geometry.bit_depth);
    }

    #[test]
    fn open_uses_current_mode_not_mode_list() {
        let dir = fake_device("32", "640,480\n", Some("U:640x480p-60\n"));
        fs::write(dir.path().join("modes"), "U:1920x1080p-60\nU:640x480p-60\n").unwrap();

        let surface = open(&dir, None).expect("open");

        assert_eq!(SurfaceGeometry::new(640, 480, BitDepth::Bpp32), surface.geometry());
    }

    #[test]
    fn open_limits_mode_to_virtual_size() {
        let dir = fake_device("16", "4,2", Some("U:1920x1080p-60\n"));
        let surface = open(&dir, None).expect("open");
        assert_eq!(SurfaceGeometry::new(4, 2, BitDepth::Bpp16), surface.geometry());
    }

    #[test]
    fn open_without_mode_uses_virtual_size() {
        let dir = fake_device("16", "4,2", None);
        let surface = open(&dir, None).expect("open");
        assert_eq!(SurfaceGeometry::new(4, 2, BitDepth::Bpp16), surface.geometry());
    }

    #[test]
    fn open_switches_bit_depth() {
        let dir = fake_device("32\n", "4,2", None);
        let surface = open(&dir, Some(BitDepth::Bpp16)).expect("open");
        assert_eq!(BitDepth::Bpp16, surface.geometry().bit_depth);
        let bpp = fs::read_to_string(dir.path().join("bits_per_pixel")).unwrap();
        assert_eq!("16", bpp.trim());
    }

    #[test]
    fn open_rejects_unsupported_bit_depth() {
        let dir = fake_device("24\n", "4,2", None);
        assert!(open(&dir, None).is_err());
    }

    #[test]
    fn flush_writes_cells_little_endian() {
        let dir = fake_device("16", "2,2", None);
        let mut surface = open(&dir, None).expect("open");
        surface.write_cell(0, 1, 0xF81F);
        surface.write_cell(1, 0, 0x07E0);
        surface.flush().expect("flush");

        let content = fs::read(dir.path().join("fb0")).unwrap();
        assert_eq!(&[0x00u8, 0x00, 0x1F, 0xF8, 0xE0, 0x07, 0x00, 0x00], &content[..8]);
    }

    #[test]
    fn open_loads_existing_content() {
        let dir = fake_device("32", "2,1", None);
        fs::write(dir.path().join("fb0"), [1u8, 2, 3, 0, 4, 5, 6, 0]).unwrap();
        let surface = open(&dir, None).expect("open");
        assert_eq!(0x0003_0201, surface.read_cell(0, 0));
        assert_eq!(0x0006_0504, surface.read_cell(0, 1));
    }
}
