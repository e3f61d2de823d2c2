//! Plain configuration values consumed by the compositor and art renderer.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A setting name that did not match any known variant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseSettingError {
    kind: &'static str,
    value: String,
}

/// Colour blend formula applied before opacity compositing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Straight linear interpolation
    Normal,
    /// `qr·bg/255`
    #[default]
    Multiply,
    /// Contrast-preserving overlay keyed on the background
    Overlay,
    /// Softer variant of overlay
    SoftLight,
}

impl BlendMode {
    /// All modes in declaration order
    pub const ALL: [BlendMode; 4] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Overlay,
        BlendMode::SoftLight,
    ];

    /// Kebab-case name
    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Overlay => "overlay",
            BlendMode::SoftLight => "soft-light",
        }
    }
}

impl FromStr for BlendMode {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlendMode::ALL
            .into_iter()
            .find(|m| m.name() == s.trim())
            .ok_or_else(|| ParseSettingError {
                kind: "blend mode",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the nine anchor positions of a 3×3 layout, in row-major order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    /// Row 0, column 0
    TopLeft,
    /// Row 0, column 1
    TopCenter,
    /// Row 0, column 2
    TopRight,
    /// Row 1, column 0
    MiddleLeft,
    /// Row 1, column 1
    Center,
    /// Row 1, column 2
    MiddleRight,
    /// Row 2, column 0
    BottomLeft,
    /// Row 2, column 1
    BottomCenter,
    /// Row 2, column 2
    #[default]
    BottomRight,
}

impl Anchor {
    /// All anchors in row-major order
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::MiddleLeft,
        Anchor::Center,
        Anchor::MiddleRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Anchor for a row-major index into a 3×3 grid
    pub fn from_index(index: usize) -> Anchor {
        Anchor::ALL.get(index).copied().unwrap_or(Anchor::Center)
    }

    /// Row-major index (0-8)
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Column offset in {-1, 0, 1}
    pub fn dx(&self) -> i32 {
        (self.index() % 3) as i32 - 1
    }

    /// Row offset in {-1, 0, 1}
    pub fn dy(&self) -> i32 {
        (self.index() / 3) as i32 - 1
    }

    /// Kebab-case name
    pub fn name(&self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::MiddleLeft => "middle-left",
            Anchor::Center => "center",
            Anchor::MiddleRight => "middle-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }
}

impl FromStr for Anchor {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Anchor::ALL
            .into_iter()
            .find(|a| a.name() == s.trim())
            .ok_or_else(|| ParseSettingError {
                kind: "position",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pixel-blend compositor settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderSettings {
    /// Base overlay opacity in [0, 1]
    pub opacity: f32,
    /// Blend formula for low-texture pixels
    pub blend_mode: BlendMode,
    /// Where the overlay lands on the background
    pub position: Anchor,
    /// Overlay side length in pixels
    pub size_px: usize,
    /// Boost applied to important QR pixels, in [0, 1]
    pub edge_strength: f32,
    /// Opacity reduction over busy background texture, in [0, 1]
    pub texture_adaption: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            opacity: 0.3,
            blend_mode: BlendMode::Multiply,
            position: Anchor::BottomRight,
            size_px: 150,
            edge_strength: 0.5,
            texture_adaption: 0.7,
        }
    }
}

impl RenderSettings {
    /// Copy with every field forced into its valid range
    pub fn clamped(self) -> Self {
        Self {
            opacity: clamp_unit(self.opacity),
            size_px: self.size_px.max(1),
            edge_strength: clamp_unit(self.edge_strength),
            texture_adaption: clamp_unit(self.texture_adaption),
            ..self
        }
    }
}

/// Procedural art style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtStyle {
    /// Houses on dark modules, snow on light
    #[default]
    WinterVillage,
    /// Trees on dark modules, clearings on light
    ForestCabin,
    /// Wooden buildings on dark modules, stone paths on light
    JapaneseGarden,
    /// Skyscrapers on dark modules, night sky on light
    CityNight,
    /// Geometric shapes on dark modules, plain ground on light
    Abstract,
    /// Flat squares
    Basic,
}

impl ArtStyle {
    /// All styles
    pub const ALL: [ArtStyle; 6] = [
        ArtStyle::WinterVillage,
        ArtStyle::ForestCabin,
        ArtStyle::JapaneseGarden,
        ArtStyle::CityNight,
        ArtStyle::Abstract,
        ArtStyle::Basic,
    ];

    /// Kebab-case name
    pub fn name(&self) -> &'static str {
        match self {
            ArtStyle::WinterVillage => "winter-village",
            ArtStyle::ForestCabin => "forest-cabin",
            ArtStyle::JapaneseGarden => "japanese-garden",
            ArtStyle::CityNight => "city-night",
            ArtStyle::Abstract => "abstract",
            ArtStyle::Basic => "basic",
        }
    }
}

impl FromStr for ArtStyle {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtStyle::ALL
            .into_iter()
            .find(|a| a.name() == s.trim())
            .ok_or_else(|| ParseSettingError {
                kind: "art style",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Procedural art settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArtSettings {
    /// Element style
    pub style: ArtStyle,
    /// Output side length in pixels
    pub output_size: usize,
    /// Contrast enhancement strength in [0, 1]; the final pass scales
    /// contrast by `2 × strength`
    pub control_strength: f32,
    /// Softening strength in [0, 1]; blur radius is `floor(3 × denoising)`
    pub denoising: f32,
    /// Seed for the deterministic decoration jitter
    pub seed: u64,
}

impl Default for ArtSettings {
    fn default() -> Self {
        Self {
            style: ArtStyle::WinterVillage,
            output_size: 600,
            control_strength: 0.7,
            denoising: 0.3,
            seed: 0,
        }
    }
}

impl ArtSettings {
    /// Copy with every field forced into its valid range
    pub fn clamped(self) -> Self {
        Self {
            output_size: self.output_size.max(1),
            control_strength: clamp_unit(self.control_strength),
            denoising: clamp_unit(self.denoising),
            ..self
        }
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
