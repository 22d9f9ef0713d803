// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Punktwerk dot-scan pipeline.

use serde::{Deserialize, Serialize};

/// A connected group of mark pixels found by the noise filter.
///
/// Pixel membership lives in the label image the component was measured from;
/// `id` is its label there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: u32,
    /// Number of pixels.
    pub area: u32,
    /// Left edge of the bounding box.
    pub x: u32,
    /// Top edge of the bounding box.
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Component {
    /// Bounding-box width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Tukey fences over the component area distribution of one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaStatistics {
    pub q25: f64,
    pub q75: f64,
    pub iqr: f64,
    pub min_threshold: f64,
    pub max_threshold: f64,
}

impl AreaStatistics {
    /// Derive the fences from a set of areas.
    ///
    /// `min_threshold = max(floor, q25 - k * iqr)` and
    /// `max_threshold = q75 + k * iqr`. Returns `None` for an empty set.
    pub fn from_areas(areas: &[u32], multiplier: f64, floor: f64) -> Option<Self> {
        if areas.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = areas.iter().map(|&a| a as f64).collect();
        sorted.sort_by(f64::total_cmp);

        let q25 = percentile(&sorted, 25.0);
        let q75 = percentile(&sorted, 75.0);
        let iqr = q75 - q25;
        Some(Self {
            q25,
            q75,
            iqr,
            min_threshold: floor.max(q25 - multiplier * iqr),
            max_threshold: q75 + multiplier * iqr,
        })
    }

    /// Strictly inside both fences.
    pub fn admits(&self, area: u32) -> bool {
        let area = area as f64;
        self.min_threshold < area && area < self.max_threshold
    }
}

/// Percentile of an ascending slice, linearly interpolating between the two
/// closest ranks. `p` is in percent.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

/// What the noise filter saw and decided.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterReport {
    /// Components found, background excluded.
    pub components: usize,
    pub accepted: usize,
    /// `None` when there was nothing to measure and the input passed through.
    pub statistics: Option<AreaStatistics>,
}

impl FilterReport {
    pub fn rejected(&self) -> usize {
        self.components - self.accepted
    }
}

/// Parameters every stage derived for one image, plus the filter outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub width: u32,
    pub height: u32,
    pub mean_brightness: f64,
    pub gamma: f64,
    pub tile_grid: u32,
    pub block_size: u32,
    pub kernel_size: u32,
    pub filter: FilterReport,
}
