// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dot-scan pipeline — runs the five cleaning stages in order and keeps the
// original scan next to the finished mask.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use punktwerk_core::error::PunktwerkError;
use punktwerk_core::{PipelineConfig, PipelineReport};
use tracing::{info, instrument};

use super::binarize::Binarizer;
use super::contrast::ContrastEnhancer;
use super::gamma::{GammaCorrector, apply_gamma};
use super::morphology::MorphologicalCleaner;
use super::noise::NoiseFilter;
use crate::image::processor::{ImageProcessor, side_by_side};

/// The five stages, configured once and reusable across images.
///
/// Each stage is a pure function of its input grid, so a single pipeline can
/// process any number of scans one after another.
#[derive(Debug, Clone, Default)]
pub struct DotPipeline {
    gamma: GammaCorrector,
    contrast: ContrastEnhancer,
    binarizer: Binarizer,
    morphology: MorphologicalCleaner,
    noise: NoiseFilter,
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Binary mask of accepted dots (255) on background (0).
    pub mask: GrayImage,
    pub report: PipelineReport,
}

impl DotPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            gamma: GammaCorrector::new(config.gamma.clone()),
            contrast: ContrastEnhancer::new(config.contrast.clone()),
            binarizer: Binarizer::new(config.binarize.clone()),
            morphology: MorphologicalCleaner::new(config.morphology.clone()),
            noise: NoiseFilter::new(config.noise.clone()),
        }
    }

    /// Gamma → contrast → binarize → morphology → component filter.
    ///
    /// Every intermediate grid is dropped as soon as the next stage has
    /// consumed it.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn run(&self, gray: &GrayImage) -> PipelineOutput {
        let (width, height) = gray.dimensions();

        let (mean_brightness, gamma) = self.gamma.estimate(gray);
        info!(mean_brightness, gamma, "Stage 1/5: gamma correction");
        let corrected = apply_gamma(gray, gamma);

        info!("Stage 2/5: contrast enhancement");
        let enhanced = self.contrast.enhance(&corrected);
        drop(corrected);

        info!("Stage 3/5: adaptive binarization");
        let binary = self.binarizer.binarize(&enhanced);
        drop(enhanced);

        info!("Stage 4/5: morphological cleanup");
        let cleaned = self.morphology.clean(&binary);
        drop(binary);

        info!("Stage 5/5: component filtering");
        let (mask, filter) = self.noise.filter_with_report(&cleaned);

        let report = PipelineReport {
            width,
            height,
            mean_brightness,
            gamma,
            tile_grid: self.contrast.tile_grid(width, height),
            block_size: self.binarizer.block_size(width, height),
            kernel_size: self.morphology.kernel_size(width, height),
            filter,
        };
        info!(
            accepted = report.filter.accepted,
            rejected = report.filter.rejected(),
            "Dot pipeline complete"
        );
        PipelineOutput { mask, report }
    }
}

/// A processed scan: the original image, kept read-only for inspection, and
/// the dot mask derived from it.
pub struct DotScan {
    original: DynamicImage,
    processed: GrayImage,
    report: PipelineReport,
}

impl DotScan {
    // -- Construction ---------------------------------------------------------

    /// Load a scan from disk and process it.
    ///
    /// Load failures are returned as-is; nothing is processed in that case.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<Self, PunktwerkError> {
        let image = ImageProcessor::open(path)?.into_dynamic();
        Ok(Self::from_dynamic(image, config))
    }

    /// Process an already-decoded image.
    pub fn from_dynamic(original: DynamicImage, config: &PipelineConfig) -> Self {
        let processor = ImageProcessor::from_dynamic(original);
        let gray = processor.to_luma();
        let original = processor.into_dynamic();
        let PipelineOutput { mask, report } = DotPipeline::new(config).run(&gray);
        Self {
            original,
            processed: mask,
            report,
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn original(&self) -> &DynamicImage {
        &self.original
    }

    pub fn processed(&self) -> &GrayImage {
        &self.processed
    }

    pub fn report(&self) -> &PipelineReport {
        &self.report
    }

    /// Original (left) and processed mask (right) in one image.
    pub fn side_by_side(&self) -> RgbImage {
        side_by_side(&self.original, &self.processed)
    }

    pub fn into_parts(self) -> (DynamicImage, GrayImage, PipelineReport) {
        (self.original, self.processed, self.report)
    }
}
