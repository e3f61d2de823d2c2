//! Smoothing filters: a separable Gaussian for pre-threshold denoising and a
//! box filter for softening rendered art.

use crate::models::{GrayImage, RasterImage};
use rayon::prelude::*;

/// Normalised 1-D Gaussian kernel of odd length `ceil(6σ)`
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let sigma = if sigma.is_finite() && sigma > 0.0 { sigma } else { 1e-3 };
    let mut size = (6.0 * sigma).ceil().max(1.0) as usize;
    if size % 2 == 0 {
        size += 1;
    }
    let half = (size / 2) as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Gaussian blur with edge clamping, applied horizontally then vertically
pub fn gaussian_blur(gray: &GrayImage, sigma: f32) -> GrayImage {
    let (width, height) = (gray.width, gray.height);
    if width == 0 || height == 0 {
        return gray.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let half = (kernel.len() / 2) as isize;

    let mut horizontal = vec![0f32; width * height];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let src = &gray.data[y * width..(y + 1) * width];
            for (x, out) in row.iter_mut().enumerate() {
                *out = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let sx = (x as isize + k as isize - half).clamp(0, width as isize - 1);
                        src[sx as usize] as f32 * w
                    })
                    .sum();
            }
        });

    let mut data = vec![0u8; width * height];
    data.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let v: f32 = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let sy = (y as isize + k as isize - half).clamp(0, height as isize - 1);
                    horizontal[sy as usize * width + x] * w
                })
                .sum();
            *out = v.round().clamp(0.0, 255.0) as u8;
        }
    });

    GrayImage {
        width,
        height,
        data,
    }
}

/// Mean filter over a `(2r+1)²` window on all four channels.
///
/// Pixels closer than `radius` to the border keep their value.
pub fn box_blur(image: &mut RasterImage, radius: usize) {
    let (width, height) = (image.width(), image.height());
    if radius == 0 || width <= 2 * radius || height <= 2 * radius {
        return;
    }
    let source = image.as_bytes().to_vec();
    let count = ((2 * radius + 1) * (2 * radius + 1)) as u32;

    image
        .as_bytes_mut()
        .par_chunks_mut(width * 4)
        .enumerate()
        .filter(|(y, _)| *y >= radius && *y < height - radius)
        .for_each(|(y, row)| {
            for x in radius..width - radius {
                let mut sums = [0u32; 4];
                for sy in y - radius..=y + radius {
                    let start = (sy * width + x - radius) * 4;
                    let end = (sy * width + x + radius + 1) * 4;
                    for px in source[start..end].chunks_exact(4) {
                        for c in 0..4 {
                            sums[c] += px[c] as u32;
                        }
                    }
                }
                for c in 0..4 {
                    row[x * 4 + c] = ((sums[c] as f32 / count as f32).round()) as u8;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_shape() {
        let k = gaussian_kernel(1.0);
        assert_eq!(k.len(), 7);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(k[3] > k[2] && k[2] > k[1]);
        assert_eq!(gaussian_kernel(1.2).len(), 9);
        assert_eq!(gaussian_kernel(0.0).len(), 1);
    }

    #[test]
    fn test_blur_preserves_flat_image() {
        let gray = GrayImage::new(6, 4, vec![90; 24]).unwrap();
        assert_eq!(gaussian_blur(&gray, 1.0), gray);
    }

    #[test]
    fn test_blur_softens_step() {
        let data: Vec<u8> = (0..100).map(|i| if i % 10 < 5 { 0 } else { 255 }).collect();
        let gray = GrayImage::new(10, 10, data).unwrap();
        let blurred = gaussian_blur(&gray, 1.0);
        let edge = blurred.get(4, 5);
        assert!(edge > 0 && edge < 255);
        assert!(blurred.get(0, 0) < 10);
    }

    #[test]
    fn test_box_blur_keeps_border() {
        let mut img = RasterImage::from_fn(5, 5, |x, y| {
            if x == 2 && y == 2 { [255, 255, 255] } else { [0, 0, 0] }
        });
        box_blur(&mut img, 1);
        assert_eq!(img.rgb(0, 0), [0, 0, 0]);
        assert_eq!(img.rgb(2, 2), [28, 28, 28]);
        assert_eq!(img.rgb(1, 1), [28, 28, 28]);
        assert_eq!(img.pixel(2, 2)[3], 255);
    }
}
