//! Structural control image for conditioned generation
use super::canvas::Canvas;
use crate::models::{QrMatrix, RasterImage};
use crate::utils::box_blur;

/// Blur radius applied to control images by default
pub const CONTROL_BLUR_RADIUS: usize = 2;

/// Draw `matrix` as black and white squares on a `size × size` canvas, then
/// soften module edges with a box blur of `blur_radius`
pub fn control_image(matrix: &QrMatrix, size: usize, blur_radius: usize) -> RasterImage {
    let n = matrix.size();
    let mut canvas = Canvas::new(size, size, [255, 255, 255]);
    if n == 0 {
        return canvas.into_image();
    }
    let cell = size as f32 / n as f32;

    for row in 0..n {
        for col in (0..n).filter(|&c| matrix.get(c, row)) {
            canvas.fill_rect(col as f32 * cell, row as f32 * cell, cell, cell, [0, 0, 0]);
        }
    }

    let mut image = canvas.into_image();
    box_blur(&mut image, blur_radius);
    image
}
