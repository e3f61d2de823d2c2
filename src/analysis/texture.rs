//! Per-pixel maps consumed by the pixel-blend compositor.

use crate::models::{RasterImage, Rgb, luminance};
use rayon::prelude::*;

/// Window edge for the local texture estimate
const TEXTURE_WINDOW: usize = 5;

fn luminance_plane(image: &RasterImage) -> Vec<f32> {
    image
        .as_bytes()
        .par_chunks_exact(4)
        .map(|px| luminance(px[0], px[1], px[2]))
        .collect()
}

/// Largest absolute luminance difference to the 8 neighbours, divided by 255.
/// Border pixels are 0.
pub fn edge_map(image: &RasterImage) -> Vec<f32> {
    let (width, height) = (image.width(), image.height());
    let lum = luminance_plane(image);
    let mut edges = vec![0f32; width * height];
    if width < 3 || height < 3 {
        return edges;
    }

    edges
        .par_chunks_mut(width)
        .enumerate()
        .filter(|(y, _)| *y >= 1 && *y < height - 1)
        .for_each(|(y, row)| {
            for x in 1..width - 1 {
                let center = lum[y * width + x];
                let mut max_diff = 0f32;
                for ny in y - 1..=y + 1 {
                    for nx in x - 1..=x + 1 {
                        if nx == x && ny == y {
                            continue;
                        }
                        max_diff = max_diff.max((center - lum[ny * width + nx]).abs());
                    }
                }
                row[x] = max_diff / 255.0;
            }
        });

    edges
}

/// Luminance standard deviation over a 5×5 window, divided by 255 and capped
/// at 1. Pixels within two of the border are 0.
pub fn texture_map(image: &RasterImage) -> Vec<f32> {
    let (width, height) = (image.width(), image.height());
    let half = TEXTURE_WINDOW / 2;
    let lum = luminance_plane(image);
    let mut texture = vec![0f32; width * height];
    if width < TEXTURE_WINDOW || height < TEXTURE_WINDOW {
        return texture;
    }

    texture
        .par_chunks_mut(width)
        .enumerate()
        .filter(|(y, _)| *y >= half && *y < height - half)
        .for_each(|(y, row)| {
            for x in half..width - half {
                let mut sum = 0f32;
                let mut sum_sq = 0f32;
                for ny in y - half..=y + half {
                    for nx in x - half..=x + half {
                        let l = lum[ny * width + nx];
                        sum += l;
                        sum_sq += l * l;
                    }
                }
                let count = (TEXTURE_WINDOW * TEXTURE_WINDOW) as f32;
                let mean = sum / count;
                let variance = (sum_sq / count - mean * mean).max(0.0);
                row[x] = (variance.sqrt() / 255.0).min(1.0);
            }
        });

    texture
}

/// How much a QR pixel matters for scannability: near-black or near-white
/// pixels and edge pixels score high
pub fn pixel_importance(color: Rgb, edge: f32) -> f32 {
    let l = luminance(color[0], color[1], color[2]) / 255.0;
    let color_importance = 1.0 - l.min(1.0 - l);
    (color_importance * 0.7 + edge * 0.3).min(1.0)
}
