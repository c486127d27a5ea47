// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

//! Single pixel conversions between 24 bit RGB and the packed frame buffer formats.
//!
//! Packed layouts:
//! - 16 bit: blue in bits 11-15, green in bits 5-10, red in bits 0-4.
//! - 32 bit: top byte zero, blue in bits 16-23, green in bits 8-15, red in bits 0-7.

use image::Rgb;

/// 24 bit pixel with red, green and blue channels.
pub type Rgb24 = Rgb<u8>;

/// Add `delta` to every channel, clamped to `0..=255`.
pub fn adjust_brightness(pixel: Rgb24, delta: i32) -> Rgb24 {
    Rgb(pixel.0.map(|c| (c as i32).saturating_add(delta).clamp(0, 255) as u8))
}

/// Narrow to 16 bit, keeping the 5 high bits of red and blue and the 6 high bits of green.
pub fn rgb24_to_16(pixel: Rgb24) -> u16 {
    let [r, g, b] = pixel.0;
    ((b as u16) >> 3) << 11 | ((g as u16) >> 2) << 5 | (r as u16) >> 3
}

pub fn rgb24_to_32(pixel: Rgb24) -> u32 {
    let [r, g, b] = pixel.0;
    (b as u32) << 16 | (g as u32) << 8 | r as u32
}

/// Expand a 16 bit pixel. The bits dropped by [`rgb24_to_16`] are zero.
pub fn bgr16_to_24(pixel: u16) -> Rgb24 {
    let b = (pixel >> 11) & 0x1F;
    let g = (pixel >> 5) & 0x3F;
    let r = pixel & 0x1F;
    Rgb([(r << 3) as u8, (g << 2) as u8, (b << 3) as u8])
}

/// Extract the channels of a 32 bit pixel, the top byte is ignored.
pub fn abgr32_to_24(pixel: u32) -> Rgb24 {
    Rgb([pixel as u8, (pixel >> 8) as u8, (pixel >> 16) as u8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLES: [[u8; 3]; 8] = [
        [0, 0, 0],
        [255, 255, 255],
        [255, 0, 0],
        [0, 255, 0],
        [0, 0, 255],
        [1, 2, 3],
        [127, 128, 129],
        [7, 3, 250],
    ];

    #[test]
    fn zero_brightness_is_identity() {
        for sample in SAMPLES {
            assert_eq!(Rgb(sample), adjust_brightness(Rgb(sample), 0));
        }
    }

    #[rstest]
    #[case([10, 100, 250], 30, [40, 130, 255])]
    #[case([10, 100, 250], -30, [0, 70, 220])]
    #[case([10, 100, 250], 255, [255, 255, 255])]
    #[case([10, 100, 250], -255, [0, 0, 0])]
    #[case([10, 100, 250], 10_000, [255, 255, 255])]
    #[case([10, 100, 250], -10_000, [0, 0, 0])]
    #[case([10, 100, 250], i32::MAX, [255, 255, 255])]
    #[case([10, 100, 250], i32::MIN, [0, 0, 0])]
    fn brightness_is_clamped(#[case] input: [u8; 3], #[case] delta: i32, #[case] output: [u8; 3]) {
        assert_eq!(Rgb(output), adjust_brightness(Rgb(input), delta));
    }

    #[rstest]
    #[case([255, 0, 0], 0x001F)]
    #[case([0, 255, 0], 0x07E0)]
    #[case([0, 0, 255], 0xF800)]
    #[case([255, 255, 255], 0xFFFF)]
    #[case([7, 3, 7], 0x0000)]
    #[case([8, 4, 8], 0x0821)]
    fn pack_16bit(#[case] input: [u8; 3], #[case] packed: u16) {
        assert_eq!(packed, rgb24_to_16(Rgb(input)));
    }

    #[rstest]
    #[case([0x12, 0x34, 0x56], 0x0056_3412)]
    #[case([255, 255, 255], 0x00FF_FFFF)]
    #[case([0, 0, 0], 0)]
    fn pack_32bit(#[case] input: [u8; 3], #[case] packed: u32) {
        assert_eq!(packed, rgb24_to_32(Rgb(input)));
    }

    #[test]
    fn widening_to_32bit_is_lossless() {
        for sample in SAMPLES {
            let packed = rgb24_to_32(Rgb(sample));
            assert_eq!(0, packed >> 24);
            assert_eq!(Rgb(sample), abgr32_to_24(packed));
        }
    }

    #[test]
    fn abgr32_ignores_top_byte() {
        assert_eq!(Rgb([0x12, 0x34, 0x56]), abgr32_to_24(0xFF56_3412));
    }

    #[test]
    fn narrowing_to_16bit_loses_low_bits_only() {
        for r in (0..=255u8).step_by(3) {
            for g in (0..=255u8).step_by(5) {
                let pixel = Rgb([r, g, 255 - r]);
                let expanded = bgr16_to_24(rgb24_to_16(pixel));
                for (orig, exp) in pixel.0.iter().zip(expanded.0) {
                    assert!(orig.abs_diff(exp) < 8, "{pixel:?} expanded to {expanded:?}");
                    assert!(exp <= *orig);
                }
            }
        }
    }

    #[test]
    fn narrowing_is_not_reversible() {
        let pixel = Rgb([7, 3, 250]);
        assert_ne!(pixel, bgr16_to_24(rgb24_to_16(pixel)));
        assert_eq!(Rgb([0, 0, 248]), bgr16_to_24(rgb24_to_16(pixel)));
    }

    #[rstest]
    #[case(0x001F, [248, 0, 0])]
    #[case(0x07E0, [0, 252, 0])]
    #[case(0xF800, [0, 0, 248])]
    fn expand_16bit(#[case] packed: u16, #[case] output: [u8; 3]) {
        assert_eq!(Rgb(output), bgr16_to_24(packed));
    }
}
