//! Per-pixel colour blending for the overlay compositor.

use super::color::lab_lerp;
use crate::models::{BlendMode, RenderSettings, Rgb};

/// Background texture above which opacity is reduced
pub const TEXTURE_DAMPING_THRESHOLD: f32 = 0.6;
/// Background texture above which blending happens in LAB space
pub const LAB_BLEND_THRESHOLD: f32 = 0.5;
/// QR pixel importance above which opacity is boosted
pub const IMPORTANCE_BOOST_THRESHOLD: f32 = 0.8;

/// Blend one channel of `top` over `base` without opacity
pub fn blend_channel(mode: BlendMode, top: f32, base: f32) -> f32 {
    match mode {
        BlendMode::Normal => top,
        BlendMode::Multiply => top * base / 255.0,
        BlendMode::Overlay => {
            if base < 128.0 {
                2.0 * top * base / 255.0
            } else {
                255.0 - 2.0 * (255.0 - top) * (255.0 - base) / 255.0
            }
        }
        BlendMode::SoftLight => {
            if base < 128.0 {
                2.0 * top * base / 255.0 + top * top * (255.0 - 2.0 * base) / (255.0 * 255.0)
            } else {
                top * (255.0 + (2.0 * base - 255.0) * (255.0 - top) / 255.0) / 255.0
            }
        }
    }
}

/// Blend `qr` over `bg` with `mode`, then composite the result at `opacity`
pub fn apply_blend_mode(qr: Rgb, bg: Rgb, opacity: f32, mode: BlendMode) -> Rgb {
    std::array::from_fn(|c| {
        let top = qr[c] as f32;
        let base = bg[c] as f32;
        let blended = blend_channel(mode, top, base);
        (base + (blended - base) * opacity).round().clamp(0.0, 255.0) as u8
    })
}

/// Opacity for one pixel given background texture and QR pixel importance
pub fn adaptive_opacity(settings: &RenderSettings, texture: f32, importance: f32) -> f32 {
    let mut opacity = settings.opacity;
    if texture > TEXTURE_DAMPING_THRESHOLD {
        opacity *= 1.0 - settings.texture_adaption * 0.3;
    }
    if importance > IMPORTANCE_BOOST_THRESHOLD {
        opacity *= 1.0 + settings.edge_strength * 0.5;
    }
    opacity.clamp(0.0, 1.0)
}

/// Final colour of one overlay pixel: LAB interpolation over busy texture,
/// the configured blend mode elsewhere
pub fn blend_pixel(qr: Rgb, bg: Rgb, opacity: f32, mode: BlendMode, texture: f32) -> Rgb {
    if texture > LAB_BLEND_THRESHOLD {
        lab_lerp(qr, bg, opacity)
    } else {
        apply_blend_mode(qr, bg, opacity, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_scenario() {
        let out = apply_blend_mode([0, 0, 0], [200, 200, 200], 0.3, BlendMode::Multiply);
        assert_eq!(out, [140, 140, 140]);
    }

    #[test]
    fn test_normal_is_linear() {
        let out = apply_blend_mode([0, 100, 255], [100, 100, 100], 0.5, BlendMode::Normal);
        assert_eq!(out, [50, 100, 178]);
    }

    #[test]
    fn test_modes_stay_in_range() {
        for mode in BlendMode::ALL {
            for top in (0..=255).step_by(15) {
                for base in (0..=255).step_by(15) {
                    let v = blend_channel(mode, top as f32, base as f32);
                    assert!((-1e-3..=255.001).contains(&v), "{mode} {top} {base} -> {v}");
                }
            }
        }
    }

    #[test]
    fn test_overlay_and_soft_light_identities() {
        // Black over mid-dark base darkens fully under overlay
        assert_eq!(blend_channel(BlendMode::Overlay, 0.0, 100.0), 0.0);
        assert_eq!(blend_channel(BlendMode::Overlay, 255.0, 200.0), 255.0);
        assert_eq!(blend_channel(BlendMode::SoftLight, 0.0, 200.0), 0.0);
    }

    #[test]
    fn test_adaptive_opacity_monotonic_in_texture_adaption() {
        let mut last = f32::MAX;
        for step in 0..=10 {
            let settings = RenderSettings {
                texture_adaption: step as f32 / 10.0,
                ..RenderSettings::default()
            };
            let op = adaptive_opacity(&settings, 0.9, 0.5);
            assert!(op < last || step == 0);
            last = op;
        }
    }

    #[test]
    fn test_adaptive_opacity_monotonic_in_edge_strength() {
        let mut last = f32::MIN;
        for step in 0..=10 {
            let settings = RenderSettings {
                edge_strength: step as f32 / 10.0,
                ..RenderSettings::default()
            };
            let op = adaptive_opacity(&settings, 0.1, 0.95);
            assert!(op > last);
            last = op;
        }
    }

    #[test]
    fn test_adaptive_opacity_untouched_below_thresholds() {
        let settings = RenderSettings::default();
        assert_eq!(adaptive_opacity(&settings, 0.6, 0.8), settings.opacity);
    }

    #[test]
    fn test_blend_pixel_switches_to_lab() {
        let flat = blend_pixel([0, 0, 0], [200, 200, 200], 0.3, BlendMode::Multiply, 0.2);
        assert_eq!(flat, [140, 140, 140]);
        let busy = blend_pixel([0, 0, 0], [200, 200, 200], 0.3, BlendMode::Multiply, 0.9);
        assert_ne!(busy, flat);
    }
}
