// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive binarization — Gaussian-weighted local mean thresholding with an
// inverted output, so dark marks come out as white foreground.

use image::{GrayImage, Luma};
use punktwerk_core::config::BinarizeConfig;
use tracing::{debug, info, instrument};

use super::filters::gaussian_smooth;

/// Foreground sample value.
pub const FOREGROUND: u8 = 255;
/// Background sample value.
pub const BACKGROUND: u8 = 0;

/// Splits a contrast-enhanced scan into mark candidates and background.
#[derive(Debug, Clone, Default)]
pub struct Binarizer {
    config: BinarizeConfig,
}

impl Binarizer {
    pub fn new(config: BinarizeConfig) -> Self {
        Self { config }
    }

    /// Neighbourhood size for an image of the given size: a fraction of the
    /// shorter side, forced odd, never below 3.
    pub fn block_size(&self, width: u32, height: u32) -> u32 {
        let scaled = (width.min(height) as f64 * self.config.block_fraction).floor() as u32;
        (scaled / 2 * 2 + 1).max(3)
    }

    /// Mark every pixel at or below its local Gaussian mean minus the offset.
    ///
    /// Output holds only [`FOREGROUND`] and [`BACKGROUND`].
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn binarize(&self, gray: &GrayImage) -> GrayImage {
        let block = self.block_size(gray.width(), gray.height());
        let offset = self.config.offset;
        info!(block, offset, "Applying adaptive binarization");

        let means = gaussian_smooth(gray, block);
        let mut output = GrayImage::new(gray.width(), gray.height());
        let mut foreground = 0usize;
        for ((out, src), mean) in output
            .pixels_mut()
            .zip(gray.as_raw().iter())
            .zip(means.iter())
        {
            let local = mean.round() as i32;
            let value = if *src as i32 - local <= -offset {
                foreground += 1;
                FOREGROUND
            } else {
                BACKGROUND
            };
            *out = Luma([value]);
        }

        debug!(foreground, "Binarization complete");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_is_odd_and_at_least_three() {
        let b = Binarizer::default();
        for (w, h) in [(1, 1), (10, 10), (100, 100), (149, 400), (150, 150), (250, 900), (3000, 4000)] {
            let block = b.block_size(w, h);
            assert!(block >= 3, "{w}x{h} -> {block}");
            assert_eq!(block % 2, 1, "{w}x{h} -> {block}");
        }
    }

    #[test]
    fn block_size_scales_with_shorter_side() {
        let b = Binarizer::default();
        assert_eq!(b.block_size(100, 100), 3);
        assert_eq!(b.block_size(250, 900), 5);
        assert_eq!(b.block_size(500, 500), 11);
        assert_eq!(b.block_size(4000, 3000), 61);
    }

    #[test]
    fn uniform_image_has_no_foreground() {
        let img = GrayImage::from_pixel(100, 100, Luma([128]));
        let out = Binarizer::default().binarize(&img);
        assert!(out.pixels().all(|p| p.0[0] == BACKGROUND));
    }

    #[test]
    fn output_is_strictly_binary() {
        // Deterministic pseudo-random texture.
        let mut state = 0x2545_f491_u32;
        let img = GrayImage::from_fn(120, 90, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            Luma([(state & 0xff) as u8])
        });
        let out = Binarizer::default().binarize(&img);
        assert!(out
            .pixels()
            .all(|p| p.0[0] == FOREGROUND || p.0[0] == BACKGROUND));
    }

    #[test]
    fn dark_dot_becomes_foreground() {
        let mut img = GrayImage::from_pixel(500, 500, Luma([200]));
        for y in 247..=253u32 {
            for x in 247..=253u32 {
                let (dx, dy) = (x as i32 - 250, y as i32 - 250);
                if dx * dx + dy * dy <= 9 {
                    img.put_pixel(x, y, Luma([50]));
                }
            }
        }
        let out = Binarizer::default().binarize(&img);
        assert_eq!(out.get_pixel(250, 250).0[0], FOREGROUND);
        assert_eq!(out.get_pixel(50, 50).0[0], BACKGROUND);
        assert_eq!(out.get_pixel(270, 250).0[0], BACKGROUND);
    }

    #[test]
    fn threshold_is_illumination_invariant() {
        // Same dot on a dim and on a bright background.
        for background in [60u8, 220] {
            let mut img = GrayImage::from_pixel(200, 200, Luma([background]));
            img.put_pixel(100, 100, Luma([background - 40]));
            let out = Binarizer::default().binarize(&img);
            assert_eq!(out.get_pixel(100, 100).0[0], FOREGROUND, "background {background}");
        }
    }
}
