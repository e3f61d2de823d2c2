//! Synthetic QR fixtures shared by the integration tests
#![allow(dead_code)]

use qr_art::{QrMatrix, RasterImage, control_image};

fn finder_cell(r: usize, c: usize) -> bool {
    r.abs_diff(3).max(c.abs_diff(3)) != 2
}

/// `n × n` code with finder patterns, separators, timing lines and
/// pseudo-random data modules
pub fn synthetic_matrix(n: usize, seed: u64) -> QrMatrix {
    let mut state = seed ^ 0x5DEE_CE66_D1CE_4E5B;
    let mut data = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state & 1 == 1
    };

    QrMatrix::from_fn(n, n, |col, row| {
        let (fr, fc) = (n - 1 - row, n - 1 - col);
        if row < 7 && col < 7 {
            finder_cell(row, col)
        } else if row < 7 && fc < 7 {
            finder_cell(row, fc)
        } else if fr < 7 && col < 7 {
            finder_cell(fr, col)
        } else if (row < 8 && (col < 8 || fc < 8)) || (fr < 8 && col < 8) {
            false
        } else if row == 6 || col == 6 {
            (row + col) % 2 == 0
        } else {
            data()
        }
    })
}

/// Crisp rendering of `matrix`, `module` pixels per module, no quiet zone
pub fn render(matrix: &QrMatrix, module: usize) -> RasterImage {
    control_image(matrix, matrix.size() * module, 0)
}

/// White canvas with three bare finder patterns of `size` pixels whose
/// top-left corners sit at `corners`
pub fn finders_only(
    width: usize,
    height: usize,
    corners: &[(usize, usize)],
    size: usize,
) -> RasterImage {
    RasterImage::from_fn(width, height, |x, y| {
        let dark = corners.iter().any(|&(x0, y0)| {
            if x < x0 || y < y0 || x >= x0 + size || y >= y0 + size {
                return false;
            }
            let mx = (x - x0) * 7 / size;
            let my = (y - y0) * 7 / size;
            mx.min(my).min(6 - mx).min(6 - my) != 1
        });
        if dark { [0, 0, 0] } else { [255, 255, 255] }
    })
}
