//! sRGB ↔ CIELAB conversion through XYZ under the D65 white point.

use crate::models::Rgb;

/// D65 reference white
const WHITE: [f32; 3] = [0.95047, 1.0, 1.08883];
const EPSILON: f32 = 0.008856;
const KAPPA: f32 = 7.787;

fn linearize(c: f32) -> f32 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

fn gamma(c: f32) -> f32 {
    if c > 0.0031308 {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * c
    }
}

fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        KAPPA * t + 16.0 / 116.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    let cube = t * t * t;
    if cube > EPSILON {
        cube
    } else {
        (t - 16.0 / 116.0) / KAPPA
    }
}

/// `[L, a, b]` of an sRGB colour
pub fn rgb_to_lab(rgb: Rgb) -> [f32; 3] {
    let [r, g, b] = rgb.map(|c| linearize(c as f32 / 255.0));

    let x = (r * 0.4124 + g * 0.3576 + b * 0.1805) / WHITE[0];
    let y = (r * 0.2126 + g * 0.7152 + b * 0.0722) / WHITE[1];
    let z = (r * 0.0193 + g * 0.1192 + b * 0.9505) / WHITE[2];

    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// sRGB colour of `[L, a, b]`, rounded and clamped
pub fn lab_to_rgb(lab: [f32; 3]) -> Rgb {
    let [l, a, b] = lab;
    let fy = (l + 16.0) / 116.0;
    let fx = a / 500.0 + fy;
    let fz = fy - b / 200.0;

    let x = lab_f_inv(fx) * WHITE[0];
    let y = lab_f_inv(fy) * WHITE[1];
    let z = lab_f_inv(fz) * WHITE[2];

    let r = x * 3.2406 + y * -1.5372 + z * -0.4986;
    let g = x * -0.9689 + y * 1.8758 + z * 0.0415;
    let bb = x * 0.0557 + y * -0.2040 + z * 1.0570;

    [r, g, bb].map(|c| (gamma(c) * 255.0).round().clamp(0.0, 255.0) as u8)
}

/// Interpolate from `bg` toward `fg` by `t` in LAB space
pub fn lab_lerp(fg: Rgb, bg: Rgb, t: f32) -> Rgb {
    let f = rgb_to_lab(fg);
    let b = rgb_to_lab(bg);
    lab_to_rgb([
        b[0] + (f[0] - b[0]) * t,
        b[1] + (f[1] - b[1]) * t,
        b[2] + (f[2] - b[2]) * t,
    ])
}
