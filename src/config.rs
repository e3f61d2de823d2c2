//! Pipeline configuration: named heuristic constants plus `QR_ART_*`
//! environment overrides.

use std::sync::OnceLock;

/// Edge length of the image the heuristics were tuned on
pub const REFERENCE_RESOLUTION: f32 = 512.0;
/// Minimum anchor separation at the reference resolution
pub const REFERENCE_SEPARATION: f32 = 50.0;
/// Lower bound for the scaled separation on tiny images
pub const MIN_SEPARATION_FLOOR: f32 = 8.0;
/// Finder-pattern footprint in modules
pub const FINDER_MODULES: f32 = 7.0;
/// Centre-to-centre finder spacing assumed by the spacing rule
pub const FINDER_SPACING_MODULES: f32 = 14.0;
/// Lower clamp for the module size estimate, in pixels
pub const MIN_MODULE_SIZE: f32 = 4.0;
/// Accepted distance between a module count and `17 + 4v`
pub const VERSION_TOLERANCE: usize = 2;
/// Default sliding window for the density-band locator
pub const FINDER_PATCH: usize = 7;
/// Default scan stride in pixels
pub const DEFAULT_STRIDE: usize = 3;
/// Dark-fraction band of the permissive locator
pub const DENSITY_BAND_WIDE: (f32, f32) = (0.35, 0.65);
/// Dark-fraction band of the strict locator
pub const DENSITY_BAND_TIGHT: (f32, f32) = (0.4, 0.6);
/// Allowed deviation per run, in modules, for the 1:1:3:1:1 check
pub const RING_TOLERANCE: f32 = 0.5;
/// Hard cap on generation attempts
pub const MAX_GENERATION_ATTEMPTS: usize = 5;

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_f32(name: &str) -> Option<f32> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
}

fn parse_env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// How finder candidates are proposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocatorStrategy {
    /// Dark-fraction band over a sliding window, no structural check
    DensityBand,
    /// 1:1:3:1:1 run check along both centre cross-sections
    #[default]
    RingVerified,
}

/// How the module pixel size is derived from the anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleSizeRule {
    /// Mean finder extent divided by 7
    #[default]
    FinderWidth,
    /// Anchor distance divided by 14
    AnchorSpacing,
}

/// Locator detector parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorConfig {
    /// Candidate proposal strategy
    pub strategy: LocatorStrategy,
    /// Window edge for the density band, in pixels
    pub patch_size: usize,
    /// Scan stride in pixels
    pub stride: usize,
    /// Accepted dark fraction, exclusive bounds
    pub density_band: (f32, f32),
    /// Fixed anchor separation; `None` scales with the image
    pub min_separation: Option<f32>,
    /// Run tolerance in modules for the ring check
    pub ring_tolerance: f32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            strategy: LocatorStrategy::RingVerified,
            patch_size: FINDER_PATCH,
            stride: DEFAULT_STRIDE,
            density_band: DENSITY_BAND_WIDE,
            min_separation: None,
            ring_tolerance: RING_TOLERANCE,
        }
    }
}

impl LocatorConfig {
    /// Separation between retained anchors for an image of this size
    pub fn separation_for(&self, width: usize, height: usize) -> f32 {
        self.min_separation.unwrap_or_else(|| {
            let scale = width.min(height) as f32 / REFERENCE_RESOLUTION;
            (REFERENCE_SEPARATION * scale).max(MIN_SEPARATION_FLOOR)
        })
    }
}

/// Full recovery pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineConfig {
    /// Gaussian sigma applied before thresholding; `None` disables the blur
    pub blur_sigma: Option<f32>,
    /// Locator parameters
    pub locator: LocatorConfig,
    /// Module size derivation
    pub module_rule: ModuleSizeRule,
}

impl PipelineConfig {
    /// Preset for camera photos: light blur to suppress sensor noise
    pub fn photo() -> Self {
        Self {
            blur_sigma: Some(1.0),
            ..Self::default()
        }
    }

    /// Defaults overridden by `QR_ART_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(sigma) = parse_env_f32("QR_ART_BLUR_SIGMA") {
            config.blur_sigma = (sigma > 0.0).then_some(sigma);
        }
        config.locator.stride = parse_env_usize("QR_ART_STRIDE", DEFAULT_STRIDE).clamp(1, 16);
        config.locator.patch_size = parse_env_usize("QR_ART_PATCH", FINDER_PATCH).clamp(3, 63);
        config.locator.min_separation =
            parse_env_f32("QR_ART_MIN_SEPARATION").filter(|v| *v > 0.0);
        match parse_env_string("QR_ART_LOCATOR").as_deref() {
            Some("density") => config.locator.strategy = LocatorStrategy::DensityBand,
            Some("density-tight") => {
                config.locator.strategy = LocatorStrategy::DensityBand;
                config.locator.density_band = DENSITY_BAND_TIGHT;
            }
            _ => {}
        }
        if parse_env_string("QR_ART_MODULE_RULE").as_deref() == Some("anchor-spacing") {
            config.module_rule = ModuleSizeRule::AnchorSpacing;
        }
        config
    }
}

/// Which generation backend callers should construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorKind {
    /// Deterministic local stand-in
    #[default]
    Local,
    /// External service behind a transport
    Remote,
}

static GENERATOR_KIND: OnceLock<GeneratorKind> = OnceLock::new();

/// Backend selected by `QR_ART_GENERATOR` (`local` or `remote`)
pub fn generator_kind() -> GeneratorKind {
    *GENERATOR_KIND.get_or_init(|| match parse_env_string("QR_ART_GENERATOR").as_deref() {
        Some("remote") => GeneratorKind::Remote,
        _ => GeneratorKind::Local,
    })
}

static GENERATION_ATTEMPTS: OnceLock<usize> = OnceLock::new();

/// Retry budget from `QR_ART_MAX_ATTEMPTS`, clamped to 1..=5
pub fn generation_attempts() -> usize {
    *GENERATION_ATTEMPTS.get_or_init(|| {
        parse_env_usize("QR_ART_MAX_ATTEMPTS", MAX_GENERATION_ATTEMPTS)
            .clamp(1, MAX_GENERATION_ATTEMPTS)
    })
}
