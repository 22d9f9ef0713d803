// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dot-scan pipeline — brightness normalisation, local contrast, adaptive
// binarization, morphology and component filtering.

pub mod binarize;
pub mod contrast;
mod filters;
pub mod gamma;
pub mod morphology;
pub mod noise;
pub mod pipeline;

pub use binarize::Binarizer;
pub use contrast::ContrastEnhancer;
pub use gamma::GammaCorrector;
pub use morphology::MorphologicalCleaner;
pub use noise::NoiseFilter;
pub use pipeline::{DotPipeline, DotScan, PipelineOutput};
