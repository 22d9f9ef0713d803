// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// punktwerk-document — Dot-scan processing for Punktwerk.
//
// Provides image loading/saving and the cleaning pipeline that turns a raw
// scan of a punched or embossed dot pattern into a binary mask of dot marks
// (gamma correction, local contrast enhancement, adaptive binarization,
// morphological cleanup, statistical component filtering).

pub mod image;
pub mod scan;

// Re-export the primary structs so callers can use `punktwerk_document::DotScan` etc.
pub use crate::image::processor::ImageProcessor;
pub use scan::binarize::Binarizer;
pub use scan::contrast::ContrastEnhancer;
pub use scan::gamma::GammaCorrector;
pub use scan::morphology::MorphologicalCleaner;
pub use scan::noise::NoiseFilter;
pub use scan::pipeline::{DotPipeline, DotScan, PipelineOutput};
