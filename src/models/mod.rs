//! Data types shared by the recovery and rendering stages

/// Finder anchors, grid geometry and the module matrix alias
pub mod grid;
/// Packed boolean bitmap
pub mod matrix;
/// Pixel-space points
pub mod point;
/// RGBA and luminance rasters
pub mod raster;
/// Overlay and art settings with their string forms
pub mod settings;

pub use grid::{FinderCandidate, GridInfo, QrMatrix, version_size};
pub use matrix::BitMatrix;
pub use point::Point;
pub use raster::{GrayImage, RasterImage, Rgb, luminance};
pub use settings::{Anchor, ArtSettings, ArtStyle, BlendMode, ParseSettingError, RenderSettings};
