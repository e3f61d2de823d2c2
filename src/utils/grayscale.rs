//! Convert an RGBA raster to luminance
//! Y = 0.299*R + 0.587*G + 0.114*B, floored into u8
//!
//! Rows are converted in parallel; the result is identical to a sequential pass.

use crate::models::{GrayImage, RasterImage, luminance};
use rayon::prelude::*;

/// Convert RGBA bytes to grayscale (alpha is ignored)
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    if width == 0 {
        return gray;
    }

    gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let row_start = y * width * 4;
        for (x, out) in row.iter_mut().enumerate() {
            let idx = row_start + x * 4;
            *out = luminance_u8(rgba[idx], rgba[idx + 1], rgba[idx + 2]);
        }
    });

    gray
}

/// Luminance buffer of a raster
pub fn to_gray_image(image: &RasterImage) -> GrayImage {
    GrayImage {
        width: image.width(),
        height: image.height(),
        data: rgba_to_grayscale(image.as_bytes(), image.width(), image.height()),
    }
}

#[inline]
fn luminance_u8(r: u8, g: u8, b: u8) -> u8 {
    // Coefficients sum to 1 only up to f32 rounding; keep greys exact
    (luminance(r, g, b) + 1e-3).floor().clamp(0.0, 255.0) as u8
}
