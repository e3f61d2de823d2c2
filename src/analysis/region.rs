//! Background region scoring: which part of a photo can best absorb a QR
//! overlay, and the overlay settings that suit it.

use crate::models::{Anchor, BlendMode, RasterImage, RenderSettings, luminance};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Quantisation step for the colour-complexity count
const COLOR_STEP: u8 = 32;
/// Distinct quantised colours that saturate the complexity score
const COLOR_SATURATION: f32 = 64.0;

/// Texture features of one cell of the 3×3 background grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionFeatures {
    /// Grid cell the features describe
    pub position: Anchor,
    /// `(max − min)` luminance over 255
    pub contrast: f32,
    /// Luminance standard deviation over 255
    pub variance: f32,
    /// Mean central-difference gradient magnitude over 255
    pub edge_strength: f32,
    /// Distinct 32-step colours over 64, capped at 1
    pub color_complexity: f32,
    /// `0.3·contrast + 0.3·variance + 0.2·edge + 0.2·colour`
    pub texture_score: f32,
}

impl RegionFeatures {
    /// Score the pixels of `region` (typically a crop of the background)
    pub fn measure(region: &RasterImage, position: Anchor) -> Self {
        let contrast = contrast(region);
        let variance = variance(region);
        let edge_strength = edge_strength(region);
        let color_complexity = color_complexity(region);
        Self {
            position,
            contrast,
            variance,
            edge_strength,
            color_complexity,
            texture_score: contrast * 0.3
                + variance * 0.3
                + edge_strength * 0.2
                + color_complexity * 0.2,
        }
    }
}

/// Region scores, the preferred hiding place and matching overlay settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundAnalysis {
    /// Nine regions in row-major order
    pub regions: Vec<RegionFeatures>,
    /// Highest-texture region outside the centre
    pub best: RegionFeatures,
    /// Overlay settings tuned to `best`
    pub recommended: RenderSettings,
}

/// Split the image into a 3×3 grid and score every region
pub fn analyze_regions(image: &RasterImage) -> Vec<RegionFeatures> {
    let region_w = image.width() / 3;
    let region_h = image.height() / 3;

    Anchor::ALL
        .par_iter()
        .map(|&position| {
            let col = position.index() % 3;
            let row = position.index() / 3;
            let region = image.crop(col * region_w, row * region_h, region_w, region_h);
            RegionFeatures::measure(&region, position)
        })
        .collect()
}

/// Highest texture score, skipping the centre region. Ties keep the earlier
/// region; with nothing else available the first region is returned.
pub fn best_hiding_region(regions: &[RegionFeatures]) -> Option<RegionFeatures> {
    let mut best: Option<RegionFeatures> = None;
    for region in regions.iter().filter(|r| r.position != Anchor::Center) {
        if best.is_none_or(|b| region.texture_score > b.texture_score) {
            best = Some(*region);
        }
    }
    best.or_else(|| regions.first().copied())
}

/// Overlay settings for a chosen region
pub fn recommended_settings(region: &RegionFeatures) -> RenderSettings {
    let mut settings = RenderSettings {
        opacity: 0.3,
        blend_mode: BlendMode::Multiply,
        position: region.position,
        size_px: 150,
        ..RenderSettings::default()
    };

    if region.contrast > 0.6 {
        settings.opacity = 0.2;
        settings.blend_mode = BlendMode::SoftLight;
    } else if region.contrast < 0.3 {
        settings.opacity = 0.4;
        settings.blend_mode = BlendMode::Overlay;
    }

    if region.texture_score > 0.7 {
        settings.edge_strength = 0.3;
        settings.texture_adaption = 0.8;
    } else {
        settings.edge_strength = 0.7;
        settings.texture_adaption = 0.5;
    }

    settings
}

/// Full background analysis
pub fn analyze_background(image: &RasterImage) -> Option<BackgroundAnalysis> {
    let regions = analyze_regions(image);
    let best = best_hiding_region(&regions)?;
    let recommended = recommended_settings(&best);
    debug!(
        position = %best.position,
        texture = best.texture_score,
        blend = %recommended.blend_mode,
        "background analyzed"
    );
    Some(BackgroundAnalysis {
        regions,
        best,
        recommended,
    })
}

fn luminances(region: &RasterImage) -> Vec<f32> {
    region
        .as_bytes()
        .chunks_exact(4)
        .map(|px| luminance(px[0], px[1], px[2]))
        .collect()
}

fn contrast(region: &RasterImage) -> f32 {
    let lum = luminances(region);
    if lum.is_empty() {
        return 0.0;
    }
    let (min, max) = lum
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &l| (lo.min(l), hi.max(l)));
    (max - min) / 255.0
}

fn variance(region: &RasterImage) -> f32 {
    let lum = luminances(region);
    if lum.is_empty() {
        return 0.0;
    }
    // Shifted by the first sample so flat regions come out exactly zero
    let origin = lum[0];
    let n = lum.len() as f32;
    let mean = lum.iter().map(|l| l - origin).sum::<f32>() / n;
    let var = lum.iter().map(|l| (l - origin - mean).powi(2)).sum::<f32>() / n;
    var.sqrt() / 255.0
}

fn edge_strength(region: &RasterImage) -> f32 {
    let (w, h) = (region.width(), region.height());
    if w * h < 4 {
        return 0.0;
    }
    let lum = luminances(region);
    let mut total = 0f32;
    for y in 1..h.saturating_sub(1) {
        for x in 1..w - 1 {
            let gx = lum[y * w + x + 1] - lum[y * w + x - 1];
            let gy = lum[(y + 1) * w + x] - lum[(y - 1) * w + x];
            total += (gx * gx + gy * gy).sqrt();
        }
    }
    total / (lum.len() as f32 * 255.0)
}

fn color_complexity(region: &RasterImage) -> f32 {
    let mut seen = std::collections::HashSet::new();
    for px in region.as_bytes().chunks_exact(4) {
        seen.insert([px[0] / COLOR_STEP, px[1] / COLOR_STEP, px[2] / COLOR_STEP]);
    }
    (seen.len() as f32 / COLOR_SATURATION).min(1.0)
}
