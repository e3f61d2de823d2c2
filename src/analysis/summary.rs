//! Serializable report of one analysis run
use super::region::BackgroundAnalysis;
use crate::models::{FinderCandidate, RenderSettings};
use crate::pipeline::Extraction;
use serde::Serialize;
use std::fmt;

/// Grid, anchors and (optionally) background recommendations for one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    /// Otsu threshold of the source image
    pub threshold: u8,
    /// Retained finder anchors
    pub anchors: Vec<FinderCandidate>,
    /// Pixels per module
    pub module_size: f32,
    /// Modules per side
    pub module_count: usize,
    /// Estimated version
    pub version: u8,
    /// Dark modules in the recovered matrix
    pub dark_modules: usize,
    /// Recovered matrix, one string per row (`#` dark, `.` light)
    pub matrix: Vec<String>,
    /// Background scores when a background was analysed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundAnalysis>,
}

impl AnalysisSummary {
    /// Summarise an extraction and an optional background analysis
    pub fn new(extraction: &Extraction, background: Option<BackgroundAnalysis>) -> Self {
        let matrix = &extraction.matrix;
        let rows = (0..matrix.size())
            .map(|y| {
                (0..matrix.size())
                    .map(|x| if matrix.get(x, y) { '#' } else { '.' })
                    .collect()
            })
            .collect();

        Self {
            threshold: extraction.threshold,
            anchors: extraction.anchors.clone(),
            module_size: extraction.grid.module_size,
            module_count: extraction.grid.module_count,
            version: extraction.grid.version,
            dark_modules: matrix.count_dark(),
            matrix: rows,
            background,
        }
    }

    /// Overlay settings recommended for the background, if one was analysed
    pub fn recommended(&self) -> Option<&RenderSettings> {
        self.background.as_ref().map(|b| &b.recommended)
    }
}

impl fmt::Display for AnalysisSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Grid: {n}x{n} modules, version {v}, module size {m:.2}px",
            n = self.module_count,
            v = self.version,
            m = self.module_size
        )?;
        writeln!(f, "Threshold: {}", self.threshold)?;
        for (i, a) in self.anchors.iter().enumerate() {
            writeln!(
                f,
                "Anchor {}: ({:.1}, {:.1}) size {:.1}",
                i + 1,
                a.center.x,
                a.center.y,
                a.size
            )?;
        }
        let total = self.module_count * self.module_count;
        writeln!(f, "Dark modules: {} / {}", self.dark_modules, total)?;

        if let Some(bg) = &self.background {
            writeln!(
                f,
                "Best region: {} (texture {:.2})",
                bg.best.position, bg.best.texture_score
            )?;
            let r = &bg.recommended;
            writeln!(
                f,
                "Recommended: {} at {:.0}% opacity, edge {:.1}, texture adaption {:.1}",
                r.blend_mode,
                r.opacity * 100.0,
                r.edge_strength,
                r.texture_adaption
            )?;
        }
        Ok(())
    }
}
