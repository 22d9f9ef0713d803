// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gamma correction — global brightness normalisation driven by the mean
// intensity of the scan.

use image::GrayImage;
use punktwerk_core::config::GammaConfig;
use tracing::{debug, info, instrument};

/// Normalises global brightness with a gamma derived from the image mean.
#[derive(Debug, Clone, Default)]
pub struct GammaCorrector {
    config: GammaConfig,
}

impl GammaCorrector {
    pub fn new(config: GammaConfig) -> Self {
        Self { config }
    }

    /// Gamma for an image whose mean intensity is `brightness`.
    ///
    /// Very dark and very bright images get the bounds directly; everything
    /// else gets `ln(target) / ln(brightness / 255)` clipped to the bounds.
    pub fn gamma_for(&self, brightness: f64) -> f64 {
        let c = &self.config;
        if brightness < c.dark_cutoff {
            return c.max_gamma;
        }
        if brightness > c.bright_cutoff {
            return c.min_gamma;
        }
        let gamma = c.target.ln() / (brightness / 255.0).ln();
        // brightness == 255 with a custom cutoff divides by ln(1) = 0.
        if gamma.is_finite() {
            gamma.clamp(c.min_gamma, c.max_gamma)
        } else {
            c.min_gamma
        }
    }

    /// Mean brightness and the gamma derived from it.
    pub fn estimate(&self, gray: &GrayImage) -> (f64, f64) {
        let brightness = mean_brightness(gray);
        (brightness, self.gamma_for(brightness))
    }

    /// Estimate the gamma for `gray` and apply it.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn correct(&self, gray: &GrayImage) -> GrayImage {
        let (brightness, gamma) = self.estimate(gray);
        info!(brightness, gamma, "Applying gamma correction");
        apply_gamma(gray, gamma)
    }
}

/// Mean sample intensity; zero for an empty grid.
pub fn mean_brightness(gray: &GrayImage) -> f64 {
    let count = gray.as_raw().len();
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = gray.as_raw().iter().map(|&v| v as u64).sum();
    sum as f64 / count as f64
}

/// `table[i] = round(255 * (i / 255) ^ (1 / gamma))`.
pub fn lookup_table(gamma: f64) -> [u8; 256] {
    let inv = 1.0 / gamma;
    let mut table = [0u8; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let v = 255.0 * (i as f64 / 255.0).powf(inv);
        *entry = v.round().clamp(0.0, 255.0) as u8;
    }
    table
}

/// Map every sample through the gamma lookup table.
pub fn apply_gamma(gray: &GrayImage, gamma: f64) -> GrayImage {
    let table = lookup_table(gamma);
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = table[pixel.0[0] as usize];
    }
    debug!(gamma, "Gamma lookup applied");
    out
}
