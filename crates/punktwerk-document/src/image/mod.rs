// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — loading, luma conversion, saving and side-by-side composites.

pub mod processor;

pub use processor::{ImageProcessor, side_by_side};
