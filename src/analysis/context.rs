use crate::models::QrMatrix;

/// Neighbour offsets (dx, dy) in row-major order around a cell
pub const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Local layout around one matrix cell, used only for stylistic variation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleContext {
    /// Neighbour states in [`NEIGHBOR_OFFSETS`] order; `None` off the grid
    pub neighbors: [Option<bool>; 8],
    /// In-grid neighbours sharing the cell's state (0-8)
    pub matching_neighbors: usize,
    /// Cell lies on the outer row or column
    pub is_edge: bool,
    /// Cell is one of the four grid corners
    pub is_corner: bool,
}

impl ModuleContext {
    /// Context of the cell at (`row`, `col`)
    pub fn of(matrix: &QrMatrix, row: usize, col: usize) -> Self {
        let size = matrix.size();
        let state = matrix.get(col, row);
        let mut neighbors = [None; 8];

        for (slot, (dx, dy)) in neighbors.iter_mut().zip(NEIGHBOR_OFFSETS) {
            let (c, r) = (col as isize + dx, row as isize + dy);
            if c >= 0 && r >= 0 && (c as usize) < size && (r as usize) < size {
                *slot = Some(matrix.get(c as usize, r as usize));
            }
        }

        let matching_neighbors = neighbors.iter().flatten().filter(|&&n| n == state).count();
        let last = size.saturating_sub(1);
        let edge_row = row == 0 || row == last;
        let edge_col = col == 0 || col == last;

        Self {
            neighbors,
            matching_neighbors,
            is_edge: edge_row || edge_col,
            is_corner: edge_row && edge_col,
        }
    }

    /// Neighbours that exist on the grid
    pub fn in_grid(&self) -> usize {
        self.neighbors.iter().flatten().count()
    }

    /// Fraction of existing neighbours matching the cell, in [0, 1]
    pub fn cluster_ratio(&self) -> f32 {
        match self.in_grid() {
            0 => 0.0,
            n => self.matching_neighbors as f32 / n as f32,
        }
    }
}

/// Contexts for every cell, row-major
pub fn module_contexts(matrix: &QrMatrix) -> Vec<ModuleContext> {
    let size = matrix.size();
    (0..size * size)
        .map(|i| ModuleContext::of(matrix, i / size, i % size))
        .collect()
}
