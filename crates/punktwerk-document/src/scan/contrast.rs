// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local contrast enhancement — contrast-limited tiled histogram equalisation
// (CLAHE) followed by median + Gaussian denoising.

use image::GrayImage;
use imageproc::filter::median_filter;
use punktwerk_core::config::ContrastConfig;
use tracing::{debug, info, instrument};

use super::filters::gaussian_blur;

/// Boosts local contrast so unevenly lit scans binarize consistently, then
/// removes the impulse noise the equalisation amplifies.
#[derive(Debug, Clone, Default)]
pub struct ContrastEnhancer {
    config: ContrastConfig,
}

impl ContrastEnhancer {
    pub fn new(config: ContrastConfig) -> Self {
        Self { config }
    }

    /// Tiles per axis for an image of the given size.
    pub fn tile_grid(&self, width: u32, height: u32) -> u32 {
        if width.max(height) < self.config.large_image_threshold {
            self.config.small_tile_grid
        } else {
            self.config.large_tile_grid
        }
    }

    /// Equalise, then denoise.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn enhance(&self, gray: &GrayImage) -> GrayImage {
        let grid = self.tile_grid(gray.width(), gray.height());
        info!(
            grid,
            clip_limit = self.config.clip_limit,
            "Applying tiled histogram equalisation"
        );
        let equalised = equalize_tiles(gray, grid, self.config.clip_limit);
        self.denoise(&equalised)
    }

    /// Median filter (impulse noise) followed by a fixed-size Gaussian.
    pub fn denoise(&self, gray: &GrayImage) -> GrayImage {
        let radius = self.config.median_radius;
        let median = median_filter(gray, radius, radius);
        debug!(radius, kernel = self.config.gaussian_kernel, "Denoising");
        gaussian_blur(&median, self.config.gaussian_kernel)
    }
}

/// Contrast-limited adaptive histogram equalisation over a `grid x grid`
/// tiling.
///
/// Tiles are `ceil(size / grid)` pixels on a side; tiles reaching past the
/// image edge sample it mirrored about the last pixel (`dcb|abcd|cba`). Each
/// pixel blends the mappings of the four nearest tile centres bilinearly.
pub fn equalize_tiles(gray: &GrayImage, grid: u32, clip_limit: f64) -> GrayImage {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let tiles = grid.max(1) as usize;
    let tile_w = w.div_ceil(tiles);
    let tile_h = h.div_ceil(tiles);
    let tile_area = (tile_w * tile_h) as u32;
    let src = gray.as_raw();

    let mut luts = Vec::with_capacity(tiles * tiles);
    for ty in 0..tiles {
        for tx in 0..tiles {
            let mut hist = [0u32; 256];
            for y in ty * tile_h..(ty + 1) * tile_h {
                let row = reflect_101(y, h) * w;
                for x in tx * tile_w..(tx + 1) * tile_w {
                    hist[src[row + reflect_101(x, w)] as usize] += 1;
                }
            }
            luts.push(clipped_lut(&mut hist, tile_area, clip_limit));
        }
    }

    let columns: Vec<Blend> = (0..w).map(|x| Blend::new(x, tile_w, tiles)).collect();
    let rows: Vec<Blend> = (0..h).map(|y| Blend::new(y, tile_h, tiles)).collect();

    let mut out = GrayImage::new(w as u32, h as u32);
    for (y, row) in rows.iter().enumerate() {
        let top = row.lo * tiles;
        let bottom = row.hi * tiles;
        for (x, col) in columns.iter().enumerate() {
            let v = src[y * w + x] as usize;
            let upper = luts[top + col.lo][v] as f32 * (1.0 - col.weight)
                + luts[top + col.hi][v] as f32 * col.weight;
            let lower = luts[bottom + col.lo][v] as f32 * (1.0 - col.weight)
                + luts[bottom + col.hi][v] as f32 * col.weight;
            let value = upper * (1.0 - row.weight) + lower * row.weight;
            out.put_pixel(x as u32, y as u32, image::Luma([value.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Interpolation between the two tiles whose centres bracket a coordinate.
struct Blend {
    lo: usize,
    hi: usize,
    /// Weight of `hi`.
    weight: f32,
}

impl Blend {
    fn new(pos: usize, tile: usize, tiles: usize) -> Self {
        let f = pos as f32 / tile as f32 - 0.5;
        let base = f.floor();
        let weight = f - base;
        let lo = (base as isize).clamp(0, tiles as isize - 1) as usize;
        let hi = (base as isize + 1).clamp(0, tiles as isize - 1) as usize;
        Self { lo, hi, weight }
    }
}

/// Index into `0..len` for a coordinate past the end, mirrored about the
/// last sample without repeating it.
fn reflect_101(pos: usize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let pos = pos % period;
    if pos < len { pos } else { period - pos }
}

/// Clip a tile histogram, spread the excess evenly and return the cumulative
/// mapping scaled to 0..=255.
fn clipped_lut(hist: &mut [u32; 256], tile_area: u32, clip_limit: f64) -> [u8; 256] {
    let limit = ((clip_limit * tile_area as f64 / 256.0) as u32).max(1);

    let mut clipped = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            clipped += *bin - limit;
            *bin = limit;
        }
    }

    let batch = clipped / 256;
    let mut residual = clipped - batch * 256;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (256 / residual).max(1) as usize;
        let mut i = 0;
        while i < 256 && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }

    let scale = 255.0 / tile_area as f32;
    let mut lut = [0u8; 256];
    let mut sum = 0u32;
    for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
        sum += count;
        *entry = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}
