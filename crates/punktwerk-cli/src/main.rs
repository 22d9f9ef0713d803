// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Punktwerk — dot-scan cleaner
//
// Entry point. Initialises logging, loads the scan and optional configuration,
// runs the pipeline and writes the mask (and optionally a side-by-side
// comparison) to disk.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use image::DynamicImage;
use punktwerk_core::{PipelineConfig, PunktwerkError, Result};
use punktwerk_document::{DotScan, ImageProcessor};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "punktwerk")]
#[command(about = "Clean a scan of a punched or embossed dot pattern into a binary dot mask")]
#[command(version)]
struct Cli {
    /// Scan to process (any format the `image` crate decodes).
    #[arg(required_unless_present = "print_default_config")]
    input: Option<PathBuf>,

    /// Where to write the mask; format follows the extension.
    /// Defaults to `<input stem>_mask.png` next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the original and the mask side by side.
    #[arg(long)]
    compare: Option<PathBuf>,

    /// JSON file overriding pipeline bounds (missing fields keep defaults).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the per-stage report as JSON on stdout.
    #[arg(long)]
    report: bool,

    /// Print the default configuration as JSON and exit.
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "punktwerk failed");
            eprintln!("punktwerk: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.print_default_config {
        println!("{}", PipelineConfig::default().to_json_pretty()?);
        return Ok(());
    }

    let Some(input) = cli.input.as_deref() else {
        return Err(PunktwerkError::InvalidConfig("no input scan given".into()));
    };

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    tracing::info!(input = %input.display(), "Punktwerk starting");
    let scan = DotScan::open(input, &config)?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));
    ImageProcessor::save_gray(scan.processed(), &output)?;
    tracing::info!(output = %output.display(), "Mask written");

    if let Some(compare) = &cli.compare {
        ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(scan.side_by_side()))
            .save(compare)?;
        tracing::info!(compare = %compare.display(), "Comparison written");
    }

    if cli.report {
        println!("{}", serde_json::to_string_pretty(scan.report())?);
    }
    Ok(())
}

/// `dir/scan.jpg` → `dir/scan_mask.png`.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".into());
    input.with_file_name(format!("{stem}_mask.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use image::{GrayImage, Luma};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("punktwerk").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn input_is_required_unless_printing_config() {
        assert!(Cli::try_parse_from(["punktwerk"]).is_err());
        assert!(parse(&["--print-default-config"]).input.is_none());
    }

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output_path(Path::new("/scans/page1.jpg")),
            PathBuf::from("/scans/page1_mask.png")
        );
    }

    #[test]
    fn run_writes_mask_and_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("page.png");
        ImageProcessor::save_gray(&GrayImage::from_pixel(64, 48, Luma([128])), &input).unwrap();
        let compare = dir.path().join("compare.png");

        let cli = parse(&[
            input.to_str().unwrap(),
            "--compare",
            compare.to_str().unwrap(),
        ]);
        run(&cli).unwrap();

        let mask = ImageProcessor::open(dir.path().join("page_mask.png")).unwrap();
        assert_eq!((mask.width(), mask.height()), (64, 48));
        let side = ImageProcessor::open(&compare).unwrap();
        assert_eq!((side.width(), side.height()), (128, 48));
    }

    #[test]
    fn run_surfaces_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        let cli = parse(&[missing.to_str().unwrap()]);
        assert!(matches!(run(&cli), Err(PunktwerkError::Load { .. })));
        assert!(!dir.path().join("missing_mask.png").exists());
    }

    #[test]
    fn run_rejects_invalid_config_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("bad.json");
        std::fs::write(&config, r#"{"contrast": {"clip_limit": -1.0}}"#).unwrap();
        let cli = parse(&["whatever.png", "--config", config.to_str().unwrap()]);
        assert!(matches!(run(&cli), Err(PunktwerkError::InvalidConfig(_))));
    }
}
