#![allow(dead_code)]

use qr_art::{QrMatrix, RasterImage, control_image};

/// Version-style code with finder patterns and striped data
pub fn synthetic_code(n: usize) -> QrMatrix {
    let finder = |r: usize, c: usize| r.abs_diff(3).max(c.abs_diff(3)) != 2;
    QrMatrix::from_fn(n, n, |col, row| {
        let (fr, fc) = (n - 1 - row, n - 1 - col);
        if row < 7 && col < 7 {
            finder(row, col)
        } else if row < 7 && fc < 7 {
            finder(row, fc)
        } else if fr < 7 && col < 7 {
            finder(fr, col)
        } else if (row < 8 && (col < 8 || fc < 8)) || (fr < 8 && col < 8) {
            false
        } else {
            (row * 5 + col * 3) % 7 < 3
        }
    })
}

pub fn synthetic_image(n: usize, module: usize) -> RasterImage {
    control_image(&synthetic_code(n), n * module, 0)
}

pub fn textured_background(width: usize, height: usize) -> RasterImage {
    RasterImage::from_fn(width, height, |x, y| {
        [
            ((x * 7 + y * 3) % 256) as u8,
            ((x ^ y) % 256) as u8,
            ((x * y / 17) % 256) as u8,
        ]
    })
}
