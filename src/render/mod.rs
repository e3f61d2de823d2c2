//! Rendering the recovered matrix
//!
//! Two output paths share this module:
//! - Pixel-level compositing of a QR image into a background photo
//! - Procedural art drawn from the matrix alone
//!
//! plus the colour-space and blend-mode helpers both rely on.

/// Procedural scene renderer with scannability enforcement
pub mod art;
/// Blend modes and adaptive opacity
pub mod blend;
/// Drawing primitives (rects, discs, triangles, gradients)
pub mod canvas;
/// sRGB / XYZ / CIELAB conversion
pub mod color;
/// Overlay placement and per-pixel compositing
pub mod composite;
/// Black and white control images
pub mod control;

pub use art::{enforce_module_contrast, render_art};
pub use composite::{composite, overlay_position};
pub use control::control_image;
