// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed-size Gaussian smoothing shared by the denoise and binarization
// stages. The window size is the input; the weights follow from it.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;

type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Binomial weights used for the small windows (1, 3, 5 and 7 taps).
const SMALL_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[
        0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
    ],
];

/// Sigma implied by an odd kernel size when none is given explicitly.
pub(crate) fn kernel_sigma(ksize: u32) -> f64 {
    0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalised 1-D Gaussian weights of length `ksize`.
///
/// Windows of up to 7 taps use the fixed binomial tables; larger ones are
/// sampled from a Gaussian with [`kernel_sigma`].
pub(crate) fn gaussian_kernel(ksize: u32) -> Vec<f32> {
    if ksize % 2 == 1 && ksize <= 7 {
        return SMALL_KERNELS[(ksize / 2) as usize].to_vec();
    }
    let sigma = kernel_sigma(ksize);
    let radius = (ksize / 2) as i64;
    let denom = 2.0 * sigma * sigma;
    let raw: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / denom).exp())
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|w| (w / sum) as f32).collect()
}

/// Separable Gaussian smoothing with replicated borders, returned unrounded
/// in row-major order.
pub(crate) fn gaussian_smooth(gray: &GrayImage, ksize: u32) -> Vec<f32> {
    smooth(gray, ksize).into_raw()
}

/// Gaussian blur of a `ksize x ksize` window, rounded back to 8 bits.
pub(crate) fn gaussian_blur(gray: &GrayImage, ksize: u32) -> GrayImage {
    let smoothed = smooth(gray, ksize);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([smoothed.get_pixel(x, y).0[0].round().clamp(0.0, 255.0) as u8])
    })
}

fn smooth(gray: &GrayImage, ksize: u32) -> FloatImage {
    let widened = FloatImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([gray.get_pixel(x, y).0[0] as f32])
    });
    if gray.width() == 0 || gray.height() == 0 {
        return widened;
    }
    separable_filter_equal(&widened, &gaussian_kernel(ksize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigma_for_common_sizes() {
        assert!((kernel_sigma(5) - 1.1).abs() < 1e-12);
        assert!((kernel_sigma(3) - 0.8).abs() < 1e-12);
        assert!((kernel_sigma(11) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn small_windows_use_binomial_weights() {
        assert_eq!(gaussian_kernel(3), vec![0.25, 0.5, 0.25]);
        assert_eq!(gaussian_kernel(5), vec![0.0625, 0.25, 0.375, 0.25, 0.0625]);
        assert_eq!(gaussian_kernel(7).len(), 7);
        assert_eq!(gaussian_kernel(1), vec![1.0]);
    }

    #[test]
    fn large_kernel_is_normalised_and_symmetric() {
        for ksize in [9, 13, 61] {
            let k = gaussian_kernel(ksize);
            assert_eq!(k.len(), ksize as usize);
            let sum: f32 = k.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "ksize {ksize}: sum {sum}");
            let mid = k.len() / 2;
            assert_eq!(k[0], k[k.len() - 1]);
            assert!(k[mid] > k[mid - 1] && k[mid - 1] > k[0]);
        }
    }

    #[test]
    fn uniform_image_is_a_fixed_point() {
        let img = GrayImage::from_pixel(9, 7, Luma([128]));
        let out = gaussian_blur(&img, 5);
        assert!(out.pixels().all(|p| p.0[0] == 128));
    }

    #[test]
    fn spike_spreads_with_binomial_weights() {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, Luma([255]));
        let out = gaussian_smooth(&img, 5);
        assert!((out[4 * 9 + 4] - 255.0 * 0.375 * 0.375).abs() < 1e-3);
        assert!((out[4 * 9 + 5] - 255.0 * 0.375 * 0.25).abs() < 1e-3);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn borders_replicate_edge_pixels() {
        // Left column bright, rest dark: the bright column sees itself twice
        // through the replicated border.
        let img = GrayImage::from_fn(6, 3, |x, _| Luma([if x == 0 { 160 } else { 0 }]));
        let out = gaussian_smooth(&img, 3);
        assert!((out[0] - 160.0 * 0.75).abs() < 1e-3, "got {}", out[0]);
        assert!((out[1] - 160.0 * 0.25).abs() < 1e-3, "got {}", out[1]);
    }

    #[test]
    fn single_pixel_image_survives() {
        let img = GrayImage::from_pixel(1, 1, Luma([42]));
        assert_eq!(gaussian_blur(&img, 11).get_pixel(0, 0).0[0], 42);
    }

    #[test]
    fn empty_image_yields_empty_output() {
        assert!(gaussian_smooth(&GrayImage::new(0, 0), 5).is_empty());
    }
}
