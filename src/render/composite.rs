//! Pixel-level overlay of a QR image onto a background photo.

use super::blend::{adaptive_opacity, blend_pixel};
use crate::analysis::texture::{edge_map, pixel_importance, texture_map};
use crate::models::{Anchor, RasterImage, RenderSettings};
use image::imageops::FilterType;
use tracing::debug;

/// Anchor offset from the centred position, as a fraction of the canvas
pub const ANCHOR_OFFSET_RATIO: f32 = 0.125;
/// Minimum distance between the overlay and the canvas border
pub const EDGE_MARGIN: f32 = 10.0;

/// Top-left corner of a `size × size` overlay placed at `anchor`.
///
/// Centred, shifted by an eighth of the canvas toward the anchor, then kept
/// at least [`EDGE_MARGIN`] pixels from the border (which wins when the
/// overlay is too large to fit).
pub fn overlay_position(anchor: Anchor, size: usize, width: usize, height: usize) -> (i64, i64) {
    let place = |extent: usize, direction: i32| -> i64 {
        let extent = extent as f32;
        let centred = (extent - size as f32) / 2.0;
        let shifted = centred + direction as f32 * extent * ANCHOR_OFFSET_RATIO;
        let upper = extent - size as f32 - EDGE_MARGIN;
        shifted.min(upper).max(EDGE_MARGIN).floor() as i64
    };
    (place(width, anchor.dx()), place(height, anchor.dy()))
}

/// Blend `qr` into a copy of `background` using per-pixel adaptive opacity.
///
/// The QR image is resized to `settings.size_px` with nearest-neighbour
/// sampling so module edges stay sharp. Overlay pixels falling outside the
/// background are dropped before edge and texture scoring; the output keeps
/// the background's dimensions.
pub fn composite(
    background: &RasterImage,
    qr: &RasterImage,
    settings: &RenderSettings,
) -> RasterImage {
    let settings = settings.clamped();
    let size = settings.size_px;
    let (bw, bh) = (background.width(), background.height());
    let (ox, oy) = overlay_position(settings.position, size, bw, bh);
    let (ox, oy) = (ox.max(0) as usize, oy.max(0) as usize);

    // visible part only
    let under = background.crop(ox, oy, size, size);
    let (w, h) = (under.width(), under.height());
    let overlay = qr.resized(size, size, FilterType::Nearest).crop(0, 0, w, h);

    let edges = edge_map(&overlay);
    let texture = texture_map(&under);

    let mut out = background.clone();
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let qr_px = overlay.pixel(x, y);
            let bg_px = under.pixel(x, y);
            let qr_rgb = [qr_px[0], qr_px[1], qr_px[2]];
            let bg_rgb = [bg_px[0], bg_px[1], bg_px[2]];

            let importance = pixel_importance(qr_rgb, edges[idx]);
            let opacity = adaptive_opacity(&settings, texture[idx], importance);
            let [r, g, b] = blend_pixel(qr_rgb, bg_rgb, opacity, settings.blend_mode, texture[idx]);
            out.put_pixel(ox + x, oy + y, [r, g, b, qr_px[3].max(bg_px[3])]);
        }
    }

    debug!(x = ox, y = oy, size, mode = %settings.blend_mode, "overlay composited");
    out
}
