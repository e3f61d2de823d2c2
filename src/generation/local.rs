//! Deterministic in-process stand-in for the generative service
use super::service::{GenerationRequest, GenerationService};
use crate::error::{QrArtError, Result};
use crate::models::RasterImage;
use crate::render::art::{in_finder_zone, jitter};
use crate::render::canvas::{Canvas, Gradient, GradientShape, hex, lerp_color};
use image::imageops::FilterType;
use tracing::debug;

/// Weight of the control image over the backdrop
const CONTROL_ALPHA: f32 = 0.6;
/// Share of dark cells that receive a decoration
const DECORATION_RATE: f32 = 0.3;
const DECORATION: [u8; 3] = [139, 69, 19];
const WINDOW: [u8; 3] = [0xFF, 0xD7, 0x00];

/// Paints a sky gradient, lays the control image over it and sprinkles
/// small houses on dark cells. Same request, same pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalGenerator;

impl LocalGenerator {
    /// New local generator
    pub fn new() -> Self {
        Self
    }
}

impl GenerationService for LocalGenerator {
    fn name(&self) -> &'static str {
        "local"
    }

    fn generate(&self, request: &GenerationRequest) -> Result<RasterImage> {
        let (w, h) = (request.width, request.height);
        if w == 0 || h == 0 {
            return Err(QrArtError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        let mut control = RasterImage::decode(&request.control_png)?;
        if (control.width(), control.height()) != (w, h) {
            control = control.resized(w, h, FilterType::Nearest);
        }

        let mut canvas = Canvas::new(w, h, [255, 255, 255]);
        let sky = Gradient::new(&[
            (0.0, hex(0x87CEEB)),
            (0.5, hex(0xE0E6E6)),
            (1.0, hex(0xFFFFFF)),
        ]);
        canvas.fill_gradient(
            &sky,
            GradientShape::Linear {
                from: (0.0, 0.0),
                to: (w as f32, h as f32),
            },
        );
        canvas.map(|x, y, bg| lerp_color(bg, control.rgb(x, y), CONTROL_ALPHA));

        let decorated = decorate(&mut canvas, &control, request);
        debug!(seed = request.seed, decorated, "local image generated");
        Ok(canvas.into_image())
    }
}

/// Small houses on a share of the dark cells outside the finder zones
fn decorate(canvas: &mut Canvas, control: &RasterImage, request: &GenerationRequest) -> usize {
    let n = request.module_count;
    if n == 0 {
        return 0;
    }
    let m = request.width.min(request.height) as f32 / n as f32;
    let mut count = 0;

    for row in 0..n {
        for col in 0..n {
            let cx = ((col as f32 + 0.5) * m) as usize;
            let cy = ((row as f32 + 0.5) * m) as usize;
            if cx >= control.width()
                || cy >= control.height()
                || control.luminance(cx, cy) >= 128.0
            {
                continue;
            }
            if in_finder_zone(row, col, n) || jitter(row, col, request.seed, 1) >= DECORATION_RATE {
                continue;
            }

            let alpha = 0.3 + 0.4 * jitter(row, col, request.seed, 2);
            let (x, y) = (col as f32 * m, row as f32 * m);
            let span = |lo: f32, len: f32| (lo + 0.1 * len) as usize..(lo + 0.9 * len) as usize;
            for py in span(y, m) {
                for px in span(x, m) {
                    canvas.blend(px, py, DECORATION, alpha);
                }
            }
            if m > 10.0 {
                canvas.fill_rect(x + 0.6 * m, y + 0.4 * m, 0.3 * m, 0.3 * m, WINDOW);
            }
            count += 1;
        }
    }
    count
}
