use super::{BitMatrix, Point};
use serde::Serialize;

/// Recovered module grid (true = dark module). Always square.
pub type QrMatrix = BitMatrix;

/// Smallest and largest Model 2 versions
pub const MIN_VERSION: u8 = 1;
/// Largest Model 2 version
pub const MAX_VERSION: u8 = 40;

/// Side length in modules for a version: `17 + 4·v`
pub fn version_size(version: u8) -> usize {
    17 + 4 * version as usize
}

/// Finder-pattern-like region found by the locator detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinderCandidate {
    /// Pattern centre in pixels
    pub center: Point,
    /// Pixel extent of the pattern (measured ring width or window size)
    pub size: f32,
}

impl FinderCandidate {
    /// Create a candidate centred at (x, y)
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            size,
        }
    }
}

/// Geometry of the module grid derived from the anchors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridInfo {
    /// Pixels per module
    pub module_size: f32,
    /// Modules per side
    pub module_count: usize,
    /// Estimated version (1-40)
    pub version: u8,
    /// Anchors used for the fit; ordered top-left, top-right, bottom-left
    /// when their roles could be identified
    pub anchors: Vec<FinderCandidate>,
    /// Whether `anchors` carries the top-left/top-right/bottom-left order
    pub roles_identified: bool,
}
