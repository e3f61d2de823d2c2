/// Compact bit matrix used both for binarized images and recovered module grids.
///
/// `true` is dark (foreground / dark module), `false` is light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BitMatrix {
    /// Create a new all-light bit matrix with given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let bytes_needed = (width * height).div_ceil(8);
        Self {
            width,
            height,
            data: vec![0; bytes_needed],
        }
    }

    /// Build a matrix by evaluating `f(x, y)` for every cell
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut matrix = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    matrix.set(x, y, true);
                }
            }
        }
        matrix
    }

    /// Get matrix width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get matrix height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Side length when the matrix is square (module grids always are)
    pub fn size(&self) -> usize {
        self.width.min(self.height)
    }

    /// Get bit at (x, y); out-of-bounds reads are light
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y * self.width + x;
        (self.data[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Signed lookup for neighbourhood walks; negative coordinates are light
    pub fn get_signed(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.get(x as usize, y as usize)
    }

    /// Set bit at (x, y); out-of-bounds writes are ignored
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        let mask = 1 << (index % 8);
        if value {
            self.data[index / 8] |= mask;
        } else {
            self.data[index / 8] &= !mask;
        }
    }

    /// Number of dark cells
    pub fn count_dark(&self) -> usize {
        let mut count = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Number of cells that differ from `other` over the shared area, plus
    /// every cell outside it.
    pub fn hamming_distance(&self, other: &BitMatrix) -> usize {
        let width = self.width.max(other.width);
        let height = self.height.max(other.height);
        let mut diff = 0;
        for y in 0..height {
            for x in 0..width {
                let inside_both =
                    x < self.width && y < self.height && x < other.width && y < other.height;
                if !inside_both || self.get(x, y) != other.get(x, y) {
                    diff += 1;
                }
            }
        }
        diff
    }

    /// Render as text, one row per line (`#` dark, `.` light)
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(if self.get(x, y) { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
