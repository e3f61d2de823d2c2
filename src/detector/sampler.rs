/// Module sampling: majority vote over a small neighbourhood of each cell centre
use crate::models::{BitMatrix, GridInfo, QrMatrix};

/// Neighbourhood radius for a module size: `max(1, floor(m / 3))`
pub fn sample_radius(module_size: f32) -> usize {
    ((module_size / 3.0).floor() as usize).max(1)
}

/// Sample every cell of the fitted grid from the binary bitmap
pub fn extract(binary: &BitMatrix, grid: &GridInfo) -> QrMatrix {
    let m = grid.module_size;
    let radius = sample_radius(m) as isize;
    let n = grid.module_count;

    BitMatrix::from_fn(n, n, |col, row| {
        let cx = (col as f32 * m + m / 2.0).round() as isize;
        let cy = (row as f32 * m + m / 2.0).round() as isize;
        majority_dark(binary, cx, cy, radius)
    })
}

/// True when more than half of the in-bounds pixels around (cx, cy) are dark.
/// A window entirely outside the bitmap reads light.
pub fn majority_dark(binary: &BitMatrix, cx: isize, cy: isize, radius: isize) -> bool {
    let (w, h) = (binary.width() as isize, binary.height() as isize);
    let mut dark = 0usize;
    let mut total = 0usize;

    for y in (cy - radius).max(0)..=(cy + radius).min(h - 1) {
        for x in (cx - radius).max(0)..=(cx + radius).min(w - 1) {
            total += 1;
            if binary.get_signed(x, y) {
                dark += 1;
            }
        }
    }

    total > 0 && dark * 2 > total
}
