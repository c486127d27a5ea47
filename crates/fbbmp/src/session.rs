// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

//! Viewer state and command execution.

use crate::bmp::BitmapImage;
use crate::compositor::Compositor;
use crate::error::{Error, Result};
use crate::files::ImageDirectory;

use fbbmp_device::{BitDepth, RasterSurface, StatusDisplay, StatusText};
use log::{info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

/// Brightness change of one brighten or darken command.
pub const BRIGHTNESS_STEP: i32 = 30;
/// Brightness range is `-BRIGHTNESS_LIMIT..=BRIGHTNESS_LIMIT`.
pub const BRIGHTNESS_LIMIT: i32 = 255;

/// Viewer command, identified by its button code.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    NextImage = 1,
    PreviousImage = 2,
    Clear = 3,
    Brighten = 4,
    Darken = 5,
    Capture = 6,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::NextImage,
        Command::PreviousImage,
        Command::Clear,
        Command::Brighten,
        Command::Darken,
        Command::Capture,
    ];

    /// Command for a button code, `None` for unassigned codes.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::NextImage => "Next image",
            Command::PreviousImage => "Previous image",
            Command::Clear => "Clear frame buffer",
            Command::Brighten => "Increase brightness",
            Command::Darken => "Decrease brightness",
            Command::Capture => "Capture frame buffer",
        };
        f.write_str(name)
    }
}

struct LoadedImage {
    name: String,
    image: BitmapImage,
}

/// State of the viewer between commands.
///
/// Owns the surface and the currently displayed image. The surface bit depth is fixed for the
/// lifetime of the session.
pub struct Session<S> {
    surface: S,
    compositor: Compositor,
    status: Box<dyn StatusDisplay>,
    files: ImageDirectory,
    output_file: PathBuf,
    selected: Option<usize>,
    current: Option<LoadedImage>,
    brightness: i32,
}

impl<S: RasterSurface> Session<S> {
    /// Create a session and clear the surface.
    ///
    /// A relative `output_file` is resolved against the image directory. Fails with
    /// [`Error::Resource`] if the surface does not use `bit_depth`.
    pub fn new(
        mut surface: S,
        bit_depth: BitDepth,
        status: Box<dyn StatusDisplay>,
        files: ImageDirectory,
        output_file: impl AsRef<Path>,
    ) -> Result<Self> {
        let surface_depth = surface.geometry().bit_depth;
        if surface_depth != bit_depth {
            return Err(Error::Resource(format!(
                "frame buffer uses {surface_depth} bpp instead of {bit_depth} bpp"
            )));
        }

        surface.clear();
        surface.flush()?;

        let output_file = files.dir().join(output_file);

        Ok(Self {
            surface,
            compositor: Compositor::new(bit_depth),
            status,
            files,
            output_file,
            selected: None,
            current: None,
            brightness: 0,
        })
    }

    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::NextImage => self.select(true),
            Command::PreviousImage => self.select(false),
            Command::Clear => self.clear(),
            Command::Brighten => self.change_brightness(BRIGHTNESS_STEP),
            Command::Darken => self.change_brightness(-BRIGHTNESS_STEP),
            Command::Capture => self.capture(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn brightness(&self) -> i32 {
        self.brightness
    }

    pub fn current_image(&self) -> Option<&BitmapImage> {
        self.current.as_ref().map(|c| &c.image)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.name.as_str())
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    fn select(&mut self, forward: bool) -> Result<()> {
        let index = match (self.selected, forward) {
            (None, true) => Some(0),
            (Some(idx), true) => Some(idx + 1),
            (Some(idx), false) => idx.checked_sub(1),
            (None, false) => None,
        };
        let Some((index, path)) = index.and_then(|idx| self.files.path(idx).map(|p| (idx, p)))
        else {
            warn!(
                "{} image does not exist",
                if forward { "Next" } else { "Previous" }
            );
            return Ok(());
        };
        let name = self.files.name(index).unwrap_or_default().to_string();

        // the selection moves on even if the file cannot be decoded
        self.selected = Some(index);

        info!("Loading image {name}...");
        let image = BitmapImage::load(&path)?;

        self.surface.clear();
        self.brightness = 0;
        let loaded = self.current.insert(LoadedImage { name, image });
        self.compositor
            .blit(&loaded.image, &mut self.surface, self.brightness);
        self.surface.flush()?;

        let header = loaded.image.header();
        let text = StatusText::new(
            &loaded.name,
            &format!("{}*{} BPP:{}", header.width, header.height, header.bit_count),
        );
        if let Err(e) = self.status.show(&text) {
            warn!("Failed to update status display: {e}");
        }

        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.current.take().is_none() {
            warn!("Image is not loaded");
            return Ok(());
        }

        self.brightness = 0;
        self.surface.clear();
        self.surface.flush()?;

        Ok(())
    }

    fn change_brightness(&mut self, delta: i32) -> Result<()> {
        let Some(current) = &self.current else {
            warn!("Image is not loaded");
            return Ok(());
        };

        self.brightness = (self.brightness + delta).clamp(-BRIGHTNESS_LIMIT, BRIGHTNESS_LIMIT);
        info!("Brightness: {}", self.brightness);

        self.compositor
            .blit(&current.image, &mut self.surface, self.brightness);
        self.surface.flush()?;

        Ok(())
    }

    fn capture(&mut self) -> Result<()> {
        let Some(current) = &self.current else {
            warn!("Image is not loaded");
            return Ok(());
        };

        let geometry = self.surface.geometry();
        let width = current.image.width().min(geometry.xres);
        let height = current.image.height().min(geometry.yres);

        let captured = self.compositor.capture(&self.surface);
        captured.save(&self.output_file, width, height)?;
        info!(
            "Saved {width}x{height} frame buffer capture to {:?}",
            self.output_file
        );

        // the capture may be a new file in the image directory
        self.files.rescan()?;
        self.selected = self.files.position(&current.name);

        Ok(())
    }
}
