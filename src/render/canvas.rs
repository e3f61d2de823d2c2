//! Minimal raster drawing surface for the procedural renderer.
//!
//! Coverage is decided at pixel centres, so shapes with fractional bounds
//! tile without gaps or overlap.

use crate::models::{RasterImage, Rgb, luminance};

/// Parse a `0xRRGGBB` literal
pub const fn hex(rgb: u32) -> Rgb {
    [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8]
}

/// Linear interpolation between two colours
pub fn lerp_color(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    std::array::from_fn(|c| (a[c] as f32 + (b[c] as f32 - a[c] as f32) * t).round() as u8)
}

/// Colour stops along [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<(f32, Rgb)>,
}

impl Gradient {
    /// Stops are sorted by offset
    pub fn new(stops: &[(f32, Rgb)]) -> Self {
        let mut stops = stops.to_vec();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { stops }
    }

    /// Colour at `t`, clamped to the end stops
    pub fn sample(&self, t: f32) -> Rgb {
        let Some(&(first_t, first)) = self.stops.first() else {
            return [0, 0, 0];
        };
        if t <= first_t {
            return first;
        }
        for pair in self.stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                let span = (t1 - t0).max(f32::EPSILON);
                return lerp_color(c0, c1, (t - t0) / span);
            }
        }
        self.stops.last().map(|s| s.1).unwrap_or(first)
    }
}

/// Parameterisation of a gradient over the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientShape {
    /// Projection onto the segment from `from` to `to`
    Linear {
        /// Start point (t = 0)
        from: (f32, f32),
        /// End point (t = 1)
        to: (f32, f32),
    },
    /// Distance from `center` over `radius`
    Radial {
        /// Centre (t = 0)
        center: (f32, f32),
        /// Distance where t reaches 1
        radius: f32,
    },
}

impl GradientShape {
    /// Gradient parameter at a point, clamped to [0, 1]
    pub fn param(&self, x: f32, y: f32) -> f32 {
        let t = match *self {
            GradientShape::Linear { from, to } => {
                let (dx, dy) = (to.0 - from.0, to.1 - from.1);
                let len_sq = (dx * dx + dy * dy).max(f32::EPSILON);
                ((x - from.0) * dx + (y - from.1) * dy) / len_sq
            }
            GradientShape::Radial { center, radius } => {
                let (dx, dy) = (x - center.0, y - center.1);
                (dx * dx + dy * dy).sqrt() / radius.max(f32::EPSILON)
            }
        };
        t.clamp(0.0, 1.0)
    }
}

/// Square RGB drawing surface
pub struct Canvas {
    image: RasterImage,
}

impl Canvas {
    /// Canvas filled with one colour
    pub fn new(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            image: RasterImage::filled(width, height, color),
        }
    }

    /// Wrap an existing raster
    pub fn from_image(image: RasterImage) -> Self {
        Self { image }
    }

    /// Canvas width
    pub fn width(&self) -> usize {
        self.image.width()
    }

    /// Canvas height
    pub fn height(&self) -> usize {
        self.image.height()
    }

    /// Borrow the pixels
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    /// Mutably borrow the pixels
    pub fn image_mut(&mut self) -> &mut RasterImage {
        &mut self.image
    }

    /// Finish drawing
    pub fn into_image(self) -> RasterImage {
        self.image
    }

    /// Colour at (x, y)
    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.image.rgb(x, y)
    }

    /// Opaque write; out-of-bounds writes are ignored
    pub fn set(&mut self, x: usize, y: usize, color: Rgb) {
        self.image.put_pixel(x, y, [color[0], color[1], color[2], 255]);
    }

    /// Mix `color` over the existing pixel with coverage `alpha`
    pub fn blend(&mut self, x: usize, y: usize, color: Rgb, alpha: f32) {
        if x >= self.width() || y >= self.height() {
            return;
        }
        let mixed = lerp_color(self.get(x, y), color, alpha);
        self.set(x, y, mixed);
    }

    /// Repaint every pixel from its coordinates and current colour
    pub fn map(&mut self, mut f: impl FnMut(usize, usize, Rgb) -> Rgb) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                let c = f(x, y, self.get(x, y));
                self.set(x, y, c);
            }
        }
    }

    /// Fill with a gradient
    pub fn fill_gradient(&mut self, gradient: &Gradient, shape: GradientShape) {
        self.map(|x, y, _| gradient.sample(shape.param(x as f32 + 0.5, y as f32 + 0.5)));
    }

    /// Pixel index range whose centres fall in `[lo, hi)`
    fn span(lo: f32, hi: f32, limit: usize) -> std::ops::Range<usize> {
        let start = (lo - 0.5).ceil().max(0.0) as usize;
        let end = ((hi - 0.5).ceil().max(0.0) as usize).min(limit);
        start..end.max(start)
    }

    /// Axis-aligned rectangle `[x, x+w) × [y, y+h)`
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        for py in Self::span(y, y + h, self.height()) {
            for px in Self::span(x, x + w, self.width()) {
                self.set(px, py, color);
            }
        }
    }

    /// Rectangle shaded by `gradient` along `shape`
    pub fn fill_rect_gradient(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        gradient: &Gradient,
        shape: GradientShape,
    ) {
        for py in Self::span(y, y + h, self.height()) {
            for px in Self::span(x, x + w, self.width()) {
                let t = shape.param(px as f32 + 0.5, py as f32 + 0.5);
                self.set(px, py, gradient.sample(t));
            }
        }
    }

    /// Filled disc
    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: Rgb) {
        let r_sq = r * r;
        for py in Self::span(cy - r, cy + r, self.height()) {
            for px in Self::span(cx - r, cx + r, self.width()) {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r_sq {
                    self.set(px, py, color);
                }
            }
        }
    }

    /// Filled triangle
    pub fn fill_triangle(&mut self, a: (f32, f32), b: (f32, f32), c: (f32, f32), color: Rgb) {
        let edge = |p: (f32, f32), q: (f32, f32), x: f32, y: f32| {
            (q.0 - p.0) * (y - p.1) - (q.1 - p.1) * (x - p.0)
        };
        let min_x = a.0.min(b.0).min(c.0);
        let max_x = a.0.max(b.0).max(c.0);
        let min_y = a.1.min(b.1).min(c.1);
        let max_y = a.1.max(b.1).max(c.1);

        for py in Self::span(min_y, max_y, self.height()) {
            for px in Self::span(min_x, max_x, self.width()) {
                let (x, y) = (px as f32 + 0.5, py as f32 + 0.5);
                let e0 = edge(a, b, x, y);
                let e1 = edge(b, c, x, y);
                let e2 = edge(c, a, x, y);
                let inside = (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0)
                    || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0);
                if inside {
                    self.set(px, py, color);
                }
            }
        }
    }

    /// Vertical line segment one pixel wide
    pub fn vline(&mut self, x: f32, y0: f32, y1: f32, color: Rgb) {
        self.fill_rect(x, y0.min(y1), 1.0, (y1 - y0).abs().max(1.0), color);
    }

    /// Mean luminance over the pixel block `[x0, x1) × [y0, y1)`
    pub fn mean_luminance(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f32 {
        let (x1, y1) = (x1.min(self.width()), y1.min(self.height()));
        let mut sum = 0f32;
        let mut count = 0usize;
        for y in y0..y1 {
            for x in x0..x1 {
                let [r, g, b] = self.get(x, y);
                sum += luminance(r, g, b);
                count += 1;
            }
        }
        if count == 0 { 0.0 } else { sum / count as f32 }
    }
}
