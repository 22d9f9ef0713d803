// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Punktwerk.

use thiserror::Error;

/// Top-level error type for all Punktwerk operations.
///
/// The processing stages themselves never fail; every variant here comes from
/// the edges of the pipeline (loading, saving, configuration).
#[derive(Debug, Error)]
pub enum PunktwerkError {
    // -- Loading --
    #[error("failed to load image {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("image {path} has no pixels")]
    EmptyImage { path: String },

    // -- Encoding / decoding --
    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration --
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PunktwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_names_the_path() {
        let err = PunktwerkError::Load {
            path: "scan.png".into(),
            reason: "No such file or directory".into(),
        };
        let text = err.to_string();
        assert!(text.contains("scan.png"), "got: {text}");
        assert!(text.contains("No such file"), "got: {text}");
    }

    #[test]
    fn io_errors_convert() {
        fn fails() -> Result<()> {
            std::fs::read("/nonexistent/punktwerk/scan.png")?;
            Ok(())
        }
        assert!(matches!(fails(), Err(PunktwerkError::Io(_))));
    }
}
