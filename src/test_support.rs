//! Synthetic codes for unit tests
use crate::models::{QrMatrix, RasterImage};
use crate::render::control_image;

fn finder_cell(r: usize, c: usize) -> bool {
    r.abs_diff(3).max(c.abs_diff(3)) != 2
}

/// `n × n` matrix with three finder patterns, light separators, timing
/// lines and scrambled data
pub(crate) fn synthetic_matrix(n: usize, seed: u64) -> QrMatrix {
    let mut state = seed ^ 0x5DEE_CE66_D1CE_4E5B;
    let mut data = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state & 1 == 1
    };

    let mut matrix = QrMatrix::new(n, n);
    for row in 0..n {
        for col in 0..n {
            let flipped_c = n - 1 - col;
            let flipped_r = n - 1 - row;
            let dark = if row < 7 && col < 7 {
                finder_cell(row, col)
            } else if row < 7 && flipped_c < 7 {
                finder_cell(row, flipped_c)
            } else if flipped_r < 7 && col < 7 {
                finder_cell(flipped_r, col)
            } else if (row < 8 && (col < 8 || flipped_c < 8)) || (flipped_r < 8 && col < 8) {
                false
            } else if row == 6 || col == 6 {
                (row + col) % 2 == 0
            } else {
                data()
            };
            matrix.set(col, row, dark);
        }
    }
    matrix
}

/// Crisp black and white rendering, `module` pixels per module, no quiet zone
pub(crate) fn synthetic_image(matrix: &QrMatrix, module: usize) -> RasterImage {
    control_image(matrix, matrix.size() * module, 0)
}
