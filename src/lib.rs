//! qr_art - QR module-matrix recovery and scannable re-rendering
//!
//! Recovers the logical module grid of a QR code from a photo without a
//! standards decoder (grayscale, Otsu threshold, finder-pattern location,
//! grid fitting, majority sampling), then uses that matrix either to blend
//! the code into a background photo or to drive procedural and generated
//! artwork that still scans.
//!
//! ```no_run
//! use qr_art::{ArtSettings, PipelineConfig, RasterImage, extract_matrix, render_art};
//!
//! let bytes = std::fs::read("code.png")?;
//! let image = RasterImage::decode(&bytes)?;
//! let extraction = extract_matrix(&image, &PipelineConfig::default())?;
//! let art = render_art(&extraction.matrix, &ArtSettings::default());
//! std::fs::write("art.png", art.to_png()?)?;
//! # Ok::<(), qr_art::QrArtError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Background region scoring, texture maps and matrix context
pub mod analysis;
/// Tunable constants and environment overrides
pub mod config;
/// Finder detection, grid fitting and module sampling
pub mod detector;
/// Crate error type
pub mod error;
/// Generative-image boundary and retry loop
pub mod generation;
/// Subscriber setup for binaries
pub mod logger;
/// Core data structures (RasterImage, BitMatrix, GridInfo, settings)
pub mod models;
/// End-to-end matrix recovery
pub mod pipeline;
/// Compositing, procedural art and colour blending
pub mod render;
/// Interactive workflow state machine
pub mod session;
/// Loading, saving and stats helpers for tools
pub mod tools;
/// Utility functions (grayscale, binarization, blur)
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use analysis::{AnalysisSummary, BackgroundAnalysis, RegionFeatures, analyze_background};
pub use config::{GeneratorKind, LocatorConfig, LocatorStrategy, ModuleSizeRule, PipelineConfig};
pub use error::{QrArtError, Result};
pub use generation::{
    GenerationConfig, GenerationOutcome, GenerationService, LocalGenerator, Quality,
    RemoteGenerator, Transport,
};
pub use models::{
    Anchor, ArtSettings, ArtStyle, BitMatrix, BlendMode, FinderCandidate, GridInfo, Point,
    QrMatrix, RasterImage, RenderSettings,
};
pub use pipeline::{Extraction, extract_batch, extract_matrix};
pub use render::{composite, control_image, render_art};
pub use session::{Session, SessionState};
