//! Background and matrix analysis
//!
//! - Region scoring of a background photo (where an overlay hides best)
//! - Per-pixel texture and edge maps for the compositor
//! - Neighbourhood context of matrix cells for the art renderer
//! - A serializable summary of one analysis run

/// Cell neighbourhood context
pub mod context;
/// 3×3 region features and overlay recommendations
pub mod region;
/// Analysis report
pub mod summary;
/// Edge, texture and importance maps
pub mod texture;

pub use context::{ModuleContext, module_contexts};
pub use region::{BackgroundAnalysis, RegionFeatures, analyze_background, analyze_regions};
pub use summary::AnalysisSummary;
