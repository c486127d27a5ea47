// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

//! Viewer json configuration file.
//!
//! All fields are optional, missing fields use the built-in defaults.

use anyhow::Context;
use fbbmp_device::{
    BitDepth, DEFAULT_FB_DEVICE, DEFAULT_PUSH_SWITCH_DEVICE, DEFAULT_SIMULATED_SIZE,
    DEFAULT_TEXT_LCD_DEVICE,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_FILE: &str = "output.bmp";

pub fn load_cfg<P: AsRef<Path>>(path: P) -> anyhow::Result<ViewerConfig> {
    let path = path.as_ref();
    let file = fs::File::open(path).with_context(|| format!("Failed to load config {path:?}"))?;
    let reader = BufReader::new(file);
    let config: ViewerConfig = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse config {path:?}"))?;

    debug!("Loaded configuration {path:?}: {config:?}");

    Ok(config)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Frame buffer pixel format, serialized as 16 or 32.
    pub bit_depth: BitDepth,
    /// Directory scanned for bitmap files.
    pub image_dir: PathBuf,
    /// Capture file, relative paths are resolved against `image_dir`.
    pub output_file: PathBuf,
    pub devices: Devices,
    /// Width and height of the in-memory frame buffer in simulation mode.
    pub simulated_size: (u32, u32),
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            bit_depth: BitDepth::default(),
            image_dir: PathBuf::from("."),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            devices: Devices::default(),
            simulated_size: DEFAULT_SIMULATED_SIZE,
        }
    }
}

/// Device nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Devices {
    pub push_switch: PathBuf,
    pub text_lcd: PathBuf,
    pub frame_buffer: PathBuf,
}

impl Default for Devices {
    fn default() -> Self {
        Self {
            push_switch: DEFAULT_PUSH_SWITCH_DEVICE.into(),
            text_lcd: DEFAULT_TEXT_LCD_DEVICE.into(),
            frame_buffer: DEFAULT_FB_DEVICE.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: ViewerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(ViewerConfig::default(), cfg);
        assert_eq!(BitDepth::Bpp32, cfg.bit_depth);
        assert_eq!(Path::new("/dev/fb0"), cfg.devices.frame_buffer);
        assert_eq!(Path::new("output.bmp"), cfg.output_file);
    }

    #[test]
    fn partial_config_overrides_fields() {
        let json = r#"{
            "bit_depth": 16,
            "image_dir": "/srv/images",
            "devices": { "text_lcd": "/dev/lcd0" },
            "simulated_size": [320, 240]
        }"#;
        let cfg: ViewerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(BitDepth::Bpp16, cfg.bit_depth);
        assert_eq!(Path::new("/srv/images"), cfg.image_dir);
        assert_eq!(Path::new("/dev/lcd0"), cfg.devices.text_lcd);
        assert_eq!(Path::new("/dev/fpga_push_switch"), cfg.devices.push_switch);
        assert_eq!((320, 240), cfg.simulated_size);
    }

    #[test]
    fn invalid_bit_depth_is_rejected() {
        assert!(serde_json::from_str::<ViewerConfig>(r#"{"bit_depth": 24}"#).is_err());
    }

    #[test]
    fn load_cfg_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cfg(dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn load_cfg_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fbbmp.json");
        fs::write(&path, r#"{"output_file": "capture.bmp"}"#).unwrap();

        let cfg = load_cfg(&path).unwrap();
        assert_eq!(Path::new("capture.bmp"), cfg.output_file);
    }
}
