// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Morphological cleanup — opening to cut thin bridges between marks, closing
// to restore their rounded outline.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use punktwerk_core::config::MorphologyConfig;
use tracing::{info, instrument};

/// Opening followed by closing with a disk whose size tracks the resolution.
#[derive(Debug, Clone, Default)]
pub struct MorphologicalCleaner {
    config: MorphologyConfig,
}

impl MorphologicalCleaner {
    pub fn new(config: MorphologyConfig) -> Self {
        Self { config }
    }

    /// Structuring element diameter: a fraction of the shorter side, at
    /// least 1, bumped to the next odd value.
    pub fn kernel_size(&self, width: u32, height: u32) -> u32 {
        let scaled = (width.min(height) as f64 * self.config.kernel_fraction).floor() as u32;
        let size = scaled.max(1);
        if size % 2 == 0 { size + 1 } else { size }
    }

    #[instrument(skip_all, fields(width = binary.width(), height = binary.height()))]
    pub fn clean(&self, binary: &GrayImage) -> GrayImage {
        let size = self.kernel_size(binary.width(), binary.height());
        // Euclidean distance within `radius` is the disk inscribed in a
        // `size x size` box.
        let radius = u8::try_from(size / 2).unwrap_or(u8::MAX);
        info!(size, radius, "Applying opening + closing");
        if radius == 0 {
            return binary.clone();
        }
        let opened = open(binary, Norm::L2, radius);
        close(&opened, Norm::L2, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn disc(img: &mut GrayImage, cx: i32, cy: i32, r: i32) {
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                    img.put_pixel(x as u32, y as u32, Luma([255]));
                }
            }
        }
    }

    #[test]
    fn kernel_size_is_positive_and_odd() {
        let m = MorphologicalCleaner::default();
        for side in [1, 50, 199, 200, 399, 400, 600, 1000, 1200, 4000] {
            let k = m.kernel_size(side, side * 2);
            assert!(k >= 1 && k % 2 == 1, "{side} -> {k}");
        }
    }

    #[test]
    fn kernel_size_tracks_resolution() {
        let m = MorphologicalCleaner::default();
        assert_eq!(m.kernel_size(100, 100), 1);
        assert_eq!(m.kernel_size(400, 400), 3);
        assert_eq!(m.kernel_size(600, 800), 3);
        assert_eq!(m.kernel_size(1000, 1000), 5);
        assert_eq!(m.kernel_size(1200, 1500), 7);
    }

    #[test]
    fn unit_kernel_is_identity() {
        let mut img = GrayImage::new(100, 100);
        img.put_pixel(10, 10, Luma([255]));
        let out = MorphologicalCleaner::default().clean(&img);
        assert_eq!(out, img);
    }

    #[test]
    fn opening_removes_specks_and_bridges() {
        let mut img = GrayImage::new(600, 600);
        disc(&mut img, 200, 300, 8);
        disc(&mut img, 240, 300, 8);
        // One-pixel bridge between the two dots.
        for x in 208..=232 {
            img.put_pixel(x, 300, Luma([255]));
        }
        // Isolated speck.
        img.put_pixel(400, 100, Luma([255]));

        let out = MorphologicalCleaner::default().clean(&img);
        assert_eq!(out.dimensions(), (600, 600));
        assert_eq!(out.get_pixel(400, 100).0[0], 0);
        assert_eq!(out.get_pixel(220, 300).0[0], 0);
        assert_eq!(out.get_pixel(200, 300).0[0], 255);
        assert_eq!(out.get_pixel(240, 300).0[0], 255);
    }

    #[test]
    fn output_stays_binary() {
        let mut img = GrayImage::new(400, 400);
        disc(&mut img, 100, 100, 12);
        disc(&mut img, 300, 250, 5);
        let out = MorphologicalCleaner::default().clean(&img);
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }
}
