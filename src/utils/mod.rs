//! Utility functions for image processing
//!
//! This module provides the pixel-level helpers the recovery pipeline is
//! built on:
//! - Grayscale conversion (RGBA to luminance)
//! - Binarization (Otsu's method and threshold-based)
//! - Blur filters (Gaussian pre-threshold smoothing, box softening)

/// Otsu thresholding
pub mod binarization;
/// Gaussian and box filters
pub mod blur;
/// RGBA to luminance
pub mod grayscale;

pub use binarization::{Binarized, binarize, otsu_threshold};
pub use blur::{box_blur, gaussian_blur};
pub use grayscale::to_gray_image;
