// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — the pipeline's boundary with storage. Decodes scans into
// memory, converts them to luma, encodes results and builds the side-by-side
// inspection composite. Operates on in-memory images using the `image` crate.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use punktwerk_core::error::PunktwerkError;
use tracing::{debug, info, instrument};

/// A decoded scan, as handed to the dot pipeline.
///
/// ```ignore
/// let gray = ImageProcessor::open("sheet.jpg")?.to_luma();
/// ```
pub struct ImageProcessor {
    /// The decoded image, colour or grayscale.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    ///
    /// This is the only fallible step in front of the pipeline: a path that
    /// cannot be decoded, or that decodes to a zero-sized raster, is reported
    /// to the caller as-is.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PunktwerkError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|err| PunktwerkError::Load {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        if img.width() == 0 || img.height() == 0 {
            return Err(PunktwerkError::EmptyImage {
                path: path.display().to_string(),
            });
        }
        info!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PunktwerkError> {
        let img = image::load_from_memory(data).map_err(|err| {
            PunktwerkError::ImageError(format!("failed to decode image: {}", err))
        })?;
        if img.width() == 0 || img.height() == 0 {
            return Err(PunktwerkError::EmptyImage {
                path: "<memory>".into(),
            });
        }
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Single-channel 8-bit luma view of the image, the input of every stage.
    pub fn to_luma(&self) -> GrayImage {
        self.image.to_luma8()
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, PunktwerkError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PunktwerkError> {
        save_dynamic(&self.image, path.as_ref())
    }

    /// Write a grayscale grid (typically the finished mask) to a file.
    pub fn save_gray(gray: &GrayImage, path: impl AsRef<Path>) -> Result<(), PunktwerkError> {
        let path = path.as_ref();
        gray.save(path).map_err(|err| {
            PunktwerkError::ImageError(format!(
                "failed to save image to {}: {}",
                path.display(),
                err
            ))
        })?;
        debug!(path = %path.display(), "Grayscale image saved");
        Ok(())
    }
}

/// Compose the original scan and the processed grid into one RGB image,
/// original on the left.
///
/// The processed grid normally has the same size as the original; when it
/// does not, the canvas is sized to fit both.
pub fn side_by_side(original: &DynamicImage, processed: &GrayImage) -> RgbImage {
    let left = original.to_rgb8();
    let right = DynamicImage::ImageLuma8(processed.clone()).to_rgb8();

    let width = left.width() + right.width();
    let height = left.height().max(right.height());
    let mut canvas = RgbImage::new(width, height);
    image::imageops::replace(&mut canvas, &left, 0, 0);
    image::imageops::replace(&mut canvas, &right, i64::from(left.width()), 0);
    canvas
}

fn save_dynamic(image: &DynamicImage, path: &Path) -> Result<(), PunktwerkError> {
    image.save(path).map_err(|err| {
        PunktwerkError::ImageError(format!(
            "failed to save image to {}: {}",
            path.display(),
            err
        ))
    })
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, PunktwerkError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        PunktwerkError::ImageError(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn open_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-scan.png");
        match ImageProcessor::open(&missing) {
            Err(PunktwerkError::Load { path, .. }) => assert!(path.ends_with("no-such-scan.png")),
            Err(other) => panic!("expected Load, got {other:?}"),
            Ok(_) => panic!("expected Load error"),
        }
    }

    #[test]
    fn open_undecodable_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(
            ImageProcessor::open(&path),
            Err(PunktwerkError::Load { .. })
        ));
    }

    #[test]
    fn save_then_open_preserves_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        let mut gray = GrayImage::new(40, 30);
        gray.put_pixel(3, 4, Luma([255]));
        ImageProcessor::save_gray(&gray, &path).unwrap();

        let loaded = ImageProcessor::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (40, 30));
        let luma = loaded.to_luma();
        assert_eq!(luma.get_pixel(3, 4).0[0], 255);
        assert_eq!(luma.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"\x00\x01\x02"),
            Err(PunktwerkError::ImageError(_))
        ));
    }

    #[test]
    fn png_bytes_decode_back() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 6, Luma([77])));
        let bytes = ImageProcessor::from_dynamic(img).to_png_bytes().unwrap();
        let back = ImageProcessor::from_bytes(&bytes).unwrap();
        assert_eq!(back.to_luma().get_pixel(5, 5).0[0], 77);
    }

    #[test]
    fn side_by_side_places_original_left() {
        let original =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 5, Rgb([200, 10, 10])));
        let processed = GrayImage::from_pixel(10, 5, Luma([255]));
        let canvas = side_by_side(&original, &processed);

        assert_eq!(canvas.dimensions(), (20, 5));
        assert_eq!(canvas.get_pixel(2, 2), &Rgb([200, 10, 10]));
        assert_eq!(canvas.get_pixel(12, 2), &Rgb([255, 255, 255]));
    }
}
