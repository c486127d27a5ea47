// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

pub mod bmp;
pub mod cfg;
pub mod compositor;
mod error;
pub mod files;
pub mod pixel;
pub mod session;

pub use error::{Error, Result};

/// File extension of viewable images.
pub const BITMAP_EXTENSION: &str = "bmp";
