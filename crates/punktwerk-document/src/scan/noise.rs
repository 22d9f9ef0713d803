// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Noise filter — connected-component analysis of the cleaned binary grid.
// Components survive when their area sits inside the image's own Tukey
// fences and their bounding box and fill look like a solid round dot.

use std::f64::consts::PI;

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use punktwerk_core::config::NoiseFilterConfig;
use punktwerk_core::{AreaStatistics, Component, FilterReport};
use tracing::{debug, info, instrument, warn};

use super::binarize::{BACKGROUND, FOREGROUND};

/// Label image produced by component labelling; 0 is background.
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Statistical + shape filter over the connected components of a mask.
#[derive(Debug, Clone, Default)]
pub struct NoiseFilter {
    config: NoiseFilterConfig,
}

impl NoiseFilter {
    pub fn new(config: NoiseFilterConfig) -> Self {
        Self { config }
    }

    /// Keep only the dot-like components of `binary`.
    pub fn filter(&self, binary: &GrayImage) -> GrayImage {
        self.filter_with_report(binary).0
    }

    /// Like [`filter`](Self::filter), also returning what was measured.
    ///
    /// A grid without foreground is returned unchanged.
    #[instrument(skip_all, fields(width = binary.width(), height = binary.height()))]
    pub fn filter_with_report(&self, binary: &GrayImage) -> (GrayImage, FilterReport) {
        let (labels, components) = label_components(binary);
        if components.is_empty() {
            warn!("No foreground components; passing mask through");
            return (binary.clone(), FilterReport::default());
        }

        let areas: Vec<u32> = components.iter().map(|c| c.area).collect();
        let Some(stats) = AreaStatistics::from_areas(
            &areas,
            self.config.iqr_multiplier,
            self.config.min_area_floor,
        ) else {
            return (binary.clone(), FilterReport::default());
        };
        debug!(
            q25 = stats.q25,
            q75 = stats.q75,
            min = stats.min_threshold,
            max = stats.max_threshold,
            "Area fences"
        );

        let max_label = components.iter().map(|c| c.id).max().unwrap_or(0) as usize;
        let mut keep = vec![false; max_label + 1];
        let mut accepted = 0usize;
        for component in &components {
            if self.accepts(component, &stats) {
                keep[component.id as usize] = true;
                accepted += 1;
            }
        }

        // One pass to build the mask of accepted components, one to apply it.
        let mut mask = GrayImage::new(binary.width(), binary.height());
        for (m, label) in mask.pixels_mut().zip(labels.as_raw().iter()) {
            if keep[*label as usize] {
                *m = Luma([FOREGROUND]);
            }
        }
        let mut output = GrayImage::new(binary.width(), binary.height());
        for ((out, src), m) in output
            .pixels_mut()
            .zip(binary.as_raw().iter())
            .zip(mask.as_raw().iter())
        {
            if *src != BACKGROUND && *m != BACKGROUND {
                *out = Luma([FOREGROUND]);
            }
        }

        let report = FilterReport {
            components: components.len(),
            accepted,
            statistics: Some(stats),
        };
        info!(
            components = report.components,
            accepted = report.accepted,
            rejected = report.rejected(),
            "Component filtering complete"
        );
        (output, report)
    }

    /// Area inside the fences and dot-shaped.
    pub fn accepts(&self, component: &Component, stats: &AreaStatistics) -> bool {
        stats.admits(component.area) && self.is_dot_shaped(component)
    }

    /// Shape heuristics, independent of the area distribution:
    ///
    /// - near-square bounding box (rejects smears and scratches),
    /// - half the box perimeter over 4 exceeds the radius implied by the area
    ///   (rejects line-like shapes),
    /// - the area fills enough of the inscribed circle (rejects rings and
    ///   ragged blobs).
    pub fn is_dot_shaped(&self, component: &Component) -> bool {
        let c = &self.config;
        let w = component.width as f64;
        let h = component.height as f64;
        let area = component.area as f64;

        let ratio = component.aspect_ratio();
        if !(c.aspect_min < ratio && ratio < c.aspect_max) {
            return false;
        }
        if (w + h) * 0.25 <= (area / PI).sqrt() {
            return false;
        }
        area > PI * (w.min(h) / 2.0).powi(2) * c.solidity
    }
}

/// Label the 8-connected foreground regions of `binary` and measure each.
///
/// Components come back ordered by label.
pub fn label_components(binary: &GrayImage) -> (LabelImage, Vec<Component>) {
    let labels = connected_components(binary, Connectivity::Eight, Luma([BACKGROUND]));
    let max_label = labels.as_raw().iter().copied().max().unwrap_or(0) as usize;
    if max_label == 0 {
        return (labels, Vec::new());
    }

    let mut extents = vec![Extent::default(); max_label + 1];
    for (x, y, label) in labels.enumerate_pixels() {
        let id = label.0[0] as usize;
        if id != 0 {
            extents[id].add(x, y);
        }
    }

    let components = extents
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, e)| e.area > 0)
        .map(|(id, e)| Component {
            id: id as u32,
            area: e.area,
            x: e.min_x,
            y: e.min_y,
            width: e.max_x - e.min_x + 1,
            height: e.max_y - e.min_y + 1,
        })
        .collect();
    (labels, components)
}

/// Running bounding box and pixel count of one label.
#[derive(Debug, Clone, Copy)]
struct Extent {
    area: u32,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            area: 0,
            min_x: u32::MAX,
            min_y: u32::MAX,
            max_x: 0,
            max_y: 0,
        }
    }
}

impl Extent {
    fn add(&mut self, x: u32, y: u32) {
        self.area += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}
