// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

//! Image file discovery.

use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Sorted list of the files with a given extension in a directory.
#[derive(Debug)]
pub struct ImageDirectory {
    dir: PathBuf,
    extension: String,
    names: Vec<String>,
}

impl ImageDirectory {
    /// Collect all regular files in `dir` with the given extension, compared ASCII
    /// case-insensitive.
    pub fn scan(dir: impl Into<PathBuf>, extension: &str) -> io::Result<Self> {
        let mut files = Self {
            dir: dir.into(),
            extension: extension.to_string(),
            names: Vec::new(),
        };
        files.rescan()?;
        Ok(files)
    }

    /// Read the directory again.
    pub fn rescan(&mut self) -> io::Result<()> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
            {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();

        debug!(
            "Found {} .{} files in {:?}",
            names.len(),
            self.extension,
            self.dir
        );
        self.names = names;

        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// File name at `index`.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Full path of the file at `index`.
    pub fn path(&self, index: usize) -> Option<PathBuf> {
        self.names.get(index).map(|name| self.dir.join(name))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}
