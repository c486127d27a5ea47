// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

use std::io;

/// Errors of bitmap decoding and viewer commands.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unsupported or invalid bitmap content.
    #[error("invalid bitmap: {0}")]
    Format(String),

    /// Failed or truncated read or write of a file or device.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A device or surface is unavailable or unusable.
    #[error("resource error: {0}")]
    Resource(String),
}

impl Error {
    pub(crate) fn truncated(what: impl Into<String>) -> Self {
        Error::Io(io::Error::new(io::ErrorKind::UnexpectedEof, what.into()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
