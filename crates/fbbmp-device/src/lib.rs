// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

//! Devices of the frame buffer image viewer appliance.

#[cfg(unix)]
mod framebuffer;
mod push_switch;
mod surface;
mod text_lcd;

#[cfg(unix)]
pub use framebuffer::{
    DEFAULT_FB_DEVICE, DEFAULT_SIMULATED_SIZE, FramebufferBuilder, FramebufferSurface,
};
pub use push_switch::{ButtonInput, ConsoleInput, DEFAULT_PUSH_SWITCH_DEVICE, PushSwitch};
pub use surface::{BitDepth, MemorySurface, RasterSurface, SurfaceGeometry};
pub use text_lcd::{
    ConsoleStatus, DEFAULT_TEXT_LCD_DEVICE, StatusDisplay, StatusText, TEXT_LCD_HEIGHT,
    TEXT_LCD_WIDTH, TextLcd,
};
