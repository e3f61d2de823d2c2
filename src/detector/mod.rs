//! Module grid recovery
//!
//! This module turns a binary bitmap into a module matrix:
//! - Finder pattern detection (the three square markers)
//! - Grid fitting (module size, module count, version)
//! - Module sampling (majority vote around each cell centre)

/// Finder pattern detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Module size, count and version estimation
pub mod grid;
/// Cell sampling into the module matrix
pub mod sampler;

pub use finder::{FinderDetector, select_anchors};
pub use grid::GridFitter;
pub use sampler::extract;
