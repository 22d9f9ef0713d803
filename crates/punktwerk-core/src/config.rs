// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration. Every knob is a construction-time bound; the actual
// per-image parameters are derived from image statistics inside each stage.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PunktwerkError, Result};

/// Tunable bounds for the whole dot-scan pipeline.
///
/// Missing sections or fields in a JSON override fall back to the defaults,
/// so `{"noise": {"iqr_multiplier": 2.0}}` is a valid configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub gamma: GammaConfig,
    pub contrast: ContrastConfig,
    pub binarize: BinarizeConfig,
    pub morphology: MorphologyConfig,
    pub noise: NoiseFilterConfig,
}

/// Brightness normalisation bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GammaConfig {
    /// Smallest gamma ever applied (used as-is for very bright images).
    pub min_gamma: f64,
    /// Largest gamma ever applied (used as-is for very dark images).
    pub max_gamma: f64,
    /// Mean intensity below which the image counts as very dark.
    pub dark_cutoff: f64,
    /// Mean intensity above which the image counts as very bright.
    pub bright_cutoff: f64,
    /// Normalised brightness the mean is mapped towards.
    pub target: f64,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            min_gamma: 0.4,
            max_gamma: 3.0,
            dark_cutoff: 5.0,
            bright_cutoff: 250.0,
            target: 0.5,
        }
    }
}

/// Local contrast enhancement (tiled equalisation + denoise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastConfig {
    /// Histogram clip limit, relative to a flat histogram.
    pub clip_limit: f64,
    /// Images whose longer side reaches this many pixels use the large grid.
    pub large_image_threshold: u32,
    /// Tiles per axis for ordinary images.
    pub small_tile_grid: u32,
    /// Tiles per axis for large images.
    pub large_tile_grid: u32,
    /// Median filter radius (1 gives a 3x3 window).
    pub median_radius: u32,
    /// Gaussian smoothing kernel size (odd).
    pub gaussian_kernel: u32,
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            large_image_threshold: 2000,
            small_tile_grid: 8,
            large_tile_grid: 16,
            median_radius: 1,
            gaussian_kernel: 5,
        }
    }
}

/// Adaptive thresholding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizeConfig {
    /// Neighbourhood size as a fraction of the shorter image side.
    pub block_fraction: f64,
    /// Amount subtracted from the local mean before comparison.
    pub offset: i32,
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            block_fraction: 0.02,
            offset: 3,
        }
    }
}

/// Opening/closing structuring element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyConfig {
    /// Kernel size as a fraction of the shorter image side.
    pub kernel_fraction: f64,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            kernel_fraction: 0.005,
        }
    }
}

/// Connected-component acceptance rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseFilterConfig {
    /// Tukey fence multiplier applied to the area IQR.
    pub iqr_multiplier: f64,
    /// Lower fence never drops below this many pixels.
    pub min_area_floor: f64,
    /// Exclusive lower bound on bounding-box width / height.
    pub aspect_min: f64,
    /// Exclusive upper bound on bounding-box width / height.
    pub aspect_max: f64,
    /// Minimum fraction of the inscribed circle a component must fill.
    pub solidity: f64,
}

impl Default for NoiseFilterConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
            min_area_floor: 3.0,
            aspect_min: 0.7,
            aspect_max: 1.3,
            solidity: 0.6,
        }
    }
}

impl PipelineConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Pretty-printed JSON, suitable as a starting point for overrides.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject bounds that would make a stage meaningless.
    pub fn validate(&self) -> Result<()> {
        let g = &self.gamma;
        if !(g.min_gamma > 0.0 && g.min_gamma <= g.max_gamma) {
            return Err(invalid(format!(
                "gamma bounds must satisfy 0 < min <= max, got [{}, {}]",
                g.min_gamma, g.max_gamma
            )));
        }
        if !(0.0..=255.0).contains(&g.dark_cutoff)
            || !(0.0..=255.0).contains(&g.bright_cutoff)
            || g.dark_cutoff >= g.bright_cutoff
        {
            return Err(invalid(format!(
                "brightness cutoffs must satisfy 0 <= dark < bright <= 255, got {} / {}",
                g.dark_cutoff, g.bright_cutoff
            )));
        }
        if !(g.target > 0.0 && g.target < 1.0) {
            return Err(invalid(format!(
                "gamma target must lie in (0, 1), got {}",
                g.target
            )));
        }

        let c = &self.contrast;
        if c.clip_limit <= 0.0 {
            return Err(invalid(format!(
                "clip limit must be positive, got {}",
                c.clip_limit
            )));
        }
        if c.small_tile_grid == 0 || c.large_tile_grid == 0 {
            return Err(invalid("tile grids need at least one tile per axis".into()));
        }
        if c.gaussian_kernel == 0 || c.gaussian_kernel % 2 == 0 {
            return Err(invalid(format!(
                "gaussian kernel must be a positive odd size, got {}",
                c.gaussian_kernel
            )));
        }

        if !(self.binarize.block_fraction > 0.0 && self.binarize.block_fraction <= 1.0) {
            return Err(invalid(format!(
                "block fraction must lie in (0, 1], got {}",
                self.binarize.block_fraction
            )));
        }
        if !(self.morphology.kernel_fraction >= 0.0 && self.morphology.kernel_fraction <= 1.0) {
            return Err(invalid(format!(
                "kernel fraction must lie in [0, 1], got {}",
                self.morphology.kernel_fraction
            )));
        }

        let n = &self.noise;
        if n.iqr_multiplier < 0.0 {
            return Err(invalid(format!(
                "IQR multiplier must not be negative, got {}",
                n.iqr_multiplier
            )));
        }
        if !(n.aspect_min > 0.0 && n.aspect_min < n.aspect_max) {
            return Err(invalid(format!(
                "aspect band must satisfy 0 < min < max, got ({}, {})",
                n.aspect_min, n.aspect_max
            )));
        }
        if !(0.0..=1.0).contains(&n.solidity) {
            return Err(invalid(format!(
                "solidity must lie in [0, 1], got {}",
                n.solidity
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> PunktwerkError {
    PunktwerkError::InvalidConfig(message)
}
