// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

//! Two line status display: FPGA text LCD device and console stand-in.

use anyhow::Context;
use log::info;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

pub const DEFAULT_TEXT_LCD_DEVICE: &str = "/dev/fpga_text_lcd";

/// Characters per display line.
pub const TEXT_LCD_WIDTH: usize = 16;
/// Number of display lines.
pub const TEXT_LCD_HEIGHT: usize = 2;

/// Content of the status display: two lines of exactly 16 ASCII characters, space padded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusText {
    buf: [u8; TEXT_LCD_WIDTH * TEXT_LCD_HEIGHT],
}

impl Default for StatusText {
    fn default() -> Self {
        Self {
            buf: [b' '; TEXT_LCD_WIDTH * TEXT_LCD_HEIGHT],
        }
    }
}

impl StatusText {
    /// Create the display text. Lines are truncated to 16 characters, non-ASCII characters are
    /// replaced with `?`.
    pub fn new(first: &str, second: &str) -> Self {
        let mut text = Self::default();
        for (line, content) in [first, second].into_iter().enumerate() {
            let start = line * TEXT_LCD_WIDTH;
            for (dst, ch) in text.buf[start..start + TEXT_LCD_WIDTH]
                .iter_mut()
                .zip(content.chars())
            {
                *dst = if ch.is_ascii() && !ch.is_ascii_control() {
                    ch as u8
                } else {
                    b'?'
                };
            }
        }
        text
    }

    /// Content of display line `line`, `None` if the display has no such line.
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = line.checked_mul(TEXT_LCD_WIDTH)?;
        let cells = self.buf.get(start..start.checked_add(TEXT_LCD_WIDTH)?)?;
        // only printable ASCII is stored
        std::str::from_utf8(cells).ok()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

pub trait StatusDisplay {
    fn show(&mut self, text: &StatusText) -> io::Result<()>;
}

/// Text LCD device taking the full 32 character buffer in one write.
pub struct TextLcd<W = File> {
    port: W,
}

impl TextLcd<File> {
    /// Open the text LCD device and blank the display.
    pub fn open(device: impl AsRef<Path>) -> anyhow::Result<Self> {
        let device = device.as_ref();
        let port = OpenOptions::new()
            .write(true)
            .open(device)
            .with_context(|| format!("Error opening text LCD: {device:?}"))?;
        info!("Opened text LCD {device:?}");

        let mut lcd = Self { port };
        lcd.show(&StatusText::default())
            .with_context(|| "Error initializing text LCD")?;
        Ok(lcd)
    }
}

impl<W: Write + Seek> TextLcd<W> {
    pub fn from_writer(port: W) -> Self {
        Self { port }
    }

    pub fn into_inner(self) -> W {
        self.port
    }
}

impl<W: Write + Seek> StatusDisplay for TextLcd<W> {
    fn show(&mut self, text: &StatusText) -> io::Result<()> {
        self.port.seek(SeekFrom::Start(0))?;
        self.port.write_all(text.as_bytes())?;
        self.port.flush()
    }
}

/// Status display printing to the log.
#[derive(Default)]
pub struct ConsoleStatus;

impl StatusDisplay for ConsoleStatus {
    fn show(&mut self, text: &StatusText) -> io::Result<()> {
        info!(
            "Text LCD : [{}] / [{}]",
            text.line(0).unwrap_or_default(),
            text.line(1).unwrap_or_default()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    #[rstest]
    #[case("a.bmp", "a.bmp           ")]
    #[case("exactly16chars!!", "exactly16chars!!")]
    #[case("a_very_long_file_name.bmp", "a_very_long_file")]
    #[case("", "                ")]
    #[case("bäh.bmp", "b?h.bmp         ")]
    fn status_line_is_padded_and_truncated(#[case] input: &str, #[case] expected: &str) {
        let text = StatusText::new(input, "20*10 BPP:24");
        assert_eq!(Some(expected), text.line(0));
        assert_eq!(Some("20*10 BPP:24    "), text.line(1));
        assert_eq!(32, text.as_bytes().len());
    }

    #[rstest]
    #[case(2)]
    #[case(usize::MAX / TEXT_LCD_WIDTH)]
    #[case(usize::MAX)]
    fn status_line_out_of_range(#[case] line: usize) {
        let text = StatusText::new("a.bmp", "1*1 BPP:24");
        assert_eq!(None, text.line(line));
    }

    #[test]
    fn text_lcd_rewrites_from_start() {
        let mut lcd = TextLcd::from_writer(Cursor::new(Vec::new()));
        lcd.show(&StatusText::new("first.bmp", "1*1 BPP:24")).unwrap();
        lcd.show(&StatusText::new("second.bmp", "640*480 BPP:24")).unwrap();

        let content = lcd.into_inner().into_inner();
        assert_eq!(b"second.bmp      640*480 BPP:24  ", content.as_slice());
    }
}
