//! Procedural art driven by the module matrix.
//!
//! Every cell gets a small scene element chosen by the style and the cell's
//! state: houses or trees on dark modules, snow or clearings on light ones.
//! Softening, lighting and contrast passes follow, and a final pass pushes
//! every cell back into its luminance class so the picture still reads as
//! the original matrix.

use super::blend::blend_channel;
use super::canvas::{Canvas, Gradient, GradientShape, hex, lerp_color};
use crate::analysis::context::ModuleContext;
use crate::detector::sampler::sample_radius;
use crate::models::{ArtSettings, ArtStyle, BlendMode, QrMatrix, RasterImage, Rgb, luminance};
use crate::utils::box_blur;
use tracing::debug;

/// Upper bound for any pixel in the sampling core of a dark cell
pub const DARK_CORE_MAX: f32 = 58.0;
/// Lower bound for any pixel in the sampling core of a light cell
pub const LIGHT_CORE_MIN: f32 = 202.0;
/// Upper bound for the mean luminance of a dark cell
pub const DARK_MEAN_MAX: f32 = 96.0;
/// Lower bound for the mean luminance of a light cell
pub const LIGHT_MEAN_MIN: f32 = 160.0;
/// Side of the finder zone (pattern plus separator) in modules
pub const FINDER_ZONE: usize = 8;
/// Strength of the style lighting overlay
const LIGHTING_ALPHA: f32 = 0.3;
/// Peak amplitude of the background grain
const NOISE_AMPLITUDE: i32 = 5;

const HOUSE_COLORS: [Rgb; 3] = [hex(0x8B4513), hex(0xA0522D), hex(0x654321)];
const ROOF: Rgb = hex(0x4A2511);
const WINDOW_LIGHT: Rgb = hex(0xFFEB3B);
const SNOW_SHADES: [Rgb; 4] = [hex(0xFFFFFF), hex(0xF8F8FF), hex(0xF0F8FF), hex(0xE6E6FA)];
const SNOWFLAKE: Rgb = hex(0xE0E6E6);
const TRUNK: Rgb = hex(0x8B4513);
const TREE_COLORS: [Rgb; 3] = [hex(0x228B22), hex(0x32CD32), hex(0x90EE90)];
const CLEARING_SHADES: [Rgb; 4] = [hex(0x90EE90), hex(0x98FB98), hex(0xF0FFF0), hex(0xADFF2F)];
const GRASS: Rgb = hex(0x228B22);
const WOOD: Rgb = hex(0x8B4513);
const TILE_ROOF: Rgb = hex(0x696969);
const PATH_SHADES: [Rgb; 3] = [hex(0xD2B48C), hex(0xDEB887), hex(0xF5DEB3)];
const TOWER: Rgb = hex(0x2F4F4F);
const LIT_WINDOW: Rgb = hex(0xFFD700);
const SKY_SHADES: [Rgb; 3] = [hex(0xB0C4DE), hex(0xC6D4E8), hex(0xE6E6FA)];
const ABSTRACT_DARK: [Rgb; 3] = [hex(0x3B1F5C), hex(0x5C1F3B), hex(0x1F3B5C)];
const ABSTRACT_LIGHT: [Rgb; 3] = [hex(0xFFF5E1), hex(0xE1F5FF), hex(0xF5E1FF)];

/// Solid tones used for finder zones and as the shadow under dark elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Dark module tone (luminance below the dark core bound)
    pub dark: Rgb,
    /// Light module tone (luminance above the light core bound)
    pub light: Rgb,
}

impl Palette {
    /// Tones for a style
    pub fn for_style(style: ArtStyle) -> Self {
        let (dark, light) = match style {
            ArtStyle::WinterVillage => (0x2B1A10, 0xFFFFFF),
            ArtStyle::ForestCabin => (0x0F2E12, 0xF0FFF0),
            ArtStyle::JapaneseGarden => (0x2E1C0E, 0xFAF0E6),
            ArtStyle::CityNight => (0x0B0B24, 0xE6E6FA),
            ArtStyle::Abstract => (0x241238, 0xFFF5E1),
            ArtStyle::Basic => (0x000000, 0xFFFFFF),
        };
        Self {
            dark: hex(dark),
            light: hex(light),
        }
    }
}

/// One matrix cell in canvas coordinates
#[derive(Debug, Clone, Copy)]
struct Cell {
    x: f32,
    y: f32,
    size: f32,
    row: usize,
    col: usize,
    dark: bool,
}

impl Cell {
    /// Element variant picked by diagonal position
    fn variant(&self, count: usize) -> usize {
        (self.row + self.col) % count
    }
}

/// splitmix64 finaliser
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic value in [0, 1) for a cell, seed and purpose
pub fn jitter(row: usize, col: usize, seed: u64, salt: u64) -> f32 {
    let key = mix(seed ^ mix((row as u64) << 32 | col as u64) ^ salt.wrapping_mul(0x2545_F491));
    (key >> 40) as f32 / (1u64 << 24) as f32
}

/// Whether (row, col) lies in one of the three finder zones of an `n`-module grid
pub fn in_finder_zone(row: usize, col: usize, n: usize) -> bool {
    let zone = FINDER_ZONE.min(n);
    let top = row < zone;
    let left = col < zone;
    let right = col + zone >= n;
    let bottom = row + zone >= n;
    (top && left) || (top && right) || (bottom && left)
}

/// Render `matrix` as a square picture of `settings.output_size` pixels.
///
/// The output is deterministic for a given matrix and settings.
pub fn render_art(matrix: &QrMatrix, settings: &ArtSettings) -> RasterImage {
    let settings = settings.clamped();
    let size = settings.output_size;
    let n = matrix.size();
    let palette = Palette::for_style(settings.style);
    if n == 0 {
        return RasterImage::filled(size, size, palette.light);
    }
    let cell = size as f32 / n as f32;

    let mut canvas = Canvas::new(size, size, palette.light);
    paint_background(&mut canvas, settings.style, settings.seed);

    for row in 0..n {
        for col in 0..n {
            let c = Cell {
                x: col as f32 * cell,
                y: row as f32 * cell,
                size: cell,
                row,
                col,
                dark: matrix.get(col, row),
            };
            if in_finder_zone(row, col, n) {
                let tone = if c.dark { palette.dark } else { palette.light };
                canvas.fill_rect(c.x, c.y, c.size, c.size, tone);
                continue;
            }
            let ctx = ModuleContext::of(matrix, row, col);
            draw_element(&mut canvas, settings.style, &palette, c, &ctx, settings.seed);
        }
    }

    let mut image = canvas.into_image();
    let radius = (settings.denoising * 3.0).floor() as usize;
    box_blur(&mut image, radius);

    let mut canvas = Canvas::from_image(image);
    apply_lighting(&mut canvas, settings.style);
    enhance_contrast(canvas.image_mut(), settings.control_strength * 2.0);

    let mut image = canvas.into_image();
    enforce_module_contrast(&mut image, matrix);
    paint_finder_zones(&mut image, matrix, &palette);

    debug!(style = %settings.style, size, modules = n, blur = radius, "art rendered");
    image
}

fn paint_background(canvas: &mut Canvas, style: ArtStyle, seed: u64) {
    let s = canvas.width().min(canvas.height()) as f32;
    let vertical = GradientShape::Linear {
        from: (0.0, 0.0),
        to: (0.0, s),
    };
    let (gradient, shape) = match style {
        ArtStyle::WinterVillage => (
            Gradient::new(&[
                (0.0, hex(0x87CEEB)),
                (0.3, hex(0xB0E0E6)),
                (0.7, hex(0xF0F8FF)),
                (1.0, hex(0xFFFFFF)),
            ]),
            vertical,
        ),
        ArtStyle::ForestCabin => (
            Gradient::new(&[
                (0.0, hex(0x228B22)),
                (0.4, hex(0x32CD32)),
                (0.8, hex(0x90EE90)),
                (1.0, hex(0xF0FFF0)),
            ]),
            vertical,
        ),
        ArtStyle::JapaneseGarden => (
            Gradient::new(&[(0.0, hex(0xFFE4E1)), (0.5, hex(0xF5F5DC)), (1.0, hex(0xD2B48C))]),
            GradientShape::Radial {
                center: (s / 2.0, s / 2.0),
                radius: s / 2.0,
            },
        ),
        ArtStyle::CityNight => (
            Gradient::new(&[
                (0.0, hex(0x191970)),
                (0.3, hex(0x2F4F4F)),
                (0.7, hex(0x4682B4)),
                (1.0, hex(0x1E1E1E)),
            ]),
            vertical,
        ),
        ArtStyle::Abstract => (
            Gradient::new(&[(0.0, hex(0xFFF5E1)), (1.0, hex(0xE1F5FF))]),
            GradientShape::Linear {
                from: (0.0, 0.0),
                to: (s, s),
            },
        ),
        ArtStyle::Basic => return,
    };
    canvas.fill_gradient(&gradient, shape);

    canvas.map(|x, y, color| {
        let grain = (mix(seed ^ ((y as u64) << 32 | x as u64)) % (2 * NOISE_AMPLITUDE as u64 + 1))
            as i32
            - NOISE_AMPLITUDE;
        color.map(|c| (c as i32 + grain).clamp(0, 255) as u8)
    });
}

fn draw_element(
    canvas: &mut Canvas,
    style: ArtStyle,
    palette: &Palette,
    cell: Cell,
    ctx: &ModuleContext,
    seed: u64,
) {
    if cell.dark {
        let under = canvas.get(
            (cell.x + cell.size / 2.0) as usize,
            (cell.y + cell.size / 2.0) as usize,
        );
        let shadow = lerp_color(under, palette.dark, 0.6);
        canvas.fill_rect(cell.x, cell.y, cell.size, cell.size, shadow);
    }

    match (style, cell.dark) {
        (ArtStyle::WinterVillage, true) => draw_house(canvas, cell, ctx),
        (ArtStyle::WinterVillage, false) => draw_snow(canvas, cell, ctx, seed),
        (ArtStyle::ForestCabin, true) => draw_tree(canvas, cell, ctx),
        (ArtStyle::ForestCabin, false) => draw_clearing(canvas, cell, ctx, seed),
        (ArtStyle::JapaneseGarden, true) => draw_pavilion(canvas, cell),
        (ArtStyle::JapaneseGarden, false) => draw_path(canvas, cell),
        (ArtStyle::CityNight, true) => draw_skyscraper(canvas, cell, seed),
        (ArtStyle::CityNight, false) => draw_sky(canvas, cell, ctx, seed),
        (ArtStyle::Abstract, true) => draw_shape(canvas, cell, seed),
        (ArtStyle::Abstract, false) => {
            let shade = ABSTRACT_LIGHT[cell.variant(ABSTRACT_LIGHT.len())];
            canvas.fill_rect(cell.x, cell.y, cell.size, cell.size, shade);
        }
        (ArtStyle::Basic, dark) => {
            let tone = if dark { palette.dark } else { palette.light };
            canvas.fill_rect(cell.x, cell.y, cell.size, cell.size, tone);
        }
    }
}

/// Element scale grows with the number of matching neighbours
fn cluster_scale(ctx: &ModuleContext, base: f32, growth: f32) -> f32 {
    (base + ctx.matching_neighbors as f32 / 8.0 * growth).min(1.0)
}

fn draw_house(canvas: &mut Canvas, cell: Cell, ctx: &ModuleContext) {
    let s = cell.size * cluster_scale(ctx, 0.8, 0.4);
    let x = cell.x + (cell.size - s) / 2.0;
    let y = cell.y + (cell.size - s) / 2.0;
    let body = HOUSE_COLORS[cell.variant(HOUSE_COLORS.len())];

    canvas.fill_rect(x, y + 0.3 * s, s, 0.7 * s, body);
    canvas.fill_triangle((x, y + 0.3 * s), (x + s, y + 0.3 * s), (x + s / 2.0, y), ROOF);

    if s > 8.0 {
        let w = s * 0.2;
        canvas.fill_rect(x + 0.2 * s, y + 0.5 * s, w, w, WINDOW_LIGHT);
        canvas.fill_rect(x + 0.6 * s, y + 0.5 * s, w, w, WINDOW_LIGHT);
    }
}

fn draw_snow(canvas: &mut Canvas, cell: Cell, ctx: &ModuleContext, seed: u64) {
    let shade = SNOW_SHADES[cell.variant(SNOW_SHADES.len())];
    canvas.fill_rect(cell.x, cell.y, cell.size, cell.size, shade);

    if ctx.is_edge {
        return;
    }
    for flake in 0..3u64 {
        if jitter(cell.row, cell.col, seed, flake) > 0.5 {
            let fx = cell.x + jitter(cell.row, cell.col, seed, flake + 10) * cell.size;
            let fy = cell.y + jitter(cell.row, cell.col, seed, flake + 20) * cell.size;
            canvas.fill_circle(fx, fy, (cell.size * 0.06).max(1.0), SNOWFLAKE);
        }
    }
}

fn draw_tree(canvas: &mut Canvas, cell: Cell, ctx: &ModuleContext) {
    let s = cell.size * cluster_scale(ctx, 0.7, 0.5);
    let x = cell.x + (cell.size - s) / 2.0;
    let y = cell.y + (cell.size - s) / 2.0;
    let trunk_w = (0.2 * s).max(2.0);

    canvas.fill_rect(x + (s - trunk_w) / 2.0, y + 0.6 * s, trunk_w, 0.4 * s, TRUNK);
    let kind = cell.variant(TREE_COLORS.len());
    let crown = TREE_COLORS[kind];
    if kind == 0 {
        canvas.fill_triangle((x, y + 0.7 * s), (x + s, y + 0.7 * s), (x + s / 2.0, y), crown);
    } else {
        canvas.fill_circle(x + s / 2.0, y + 0.35 * s, 0.35 * s, crown);
    }
}

fn draw_clearing(canvas: &mut Canvas, cell: Cell, ctx: &ModuleContext, seed: u64) {
    let shade = CLEARING_SHADES[cell.variant(CLEARING_SHADES.len())];
    canvas.fill_rect(cell.x, cell.y, cell.size, cell.size, shade);

    if ctx.is_edge || cell.size < 6.0 {
        return;
    }
    for blade in 0..3u64 {
        if jitter(cell.row, cell.col, seed, 100 + blade) > 0.6 {
            let gx = cell.x + jitter(cell.row, cell.col, seed, 110 + blade) * cell.size;
            let base = cell.y + cell.size;
            canvas.vline(gx, base - cell.size * 0.25, base, GRASS);
        }
    }
}

fn draw_pavilion(canvas: &mut Canvas, cell: Cell) {
    let s = cell.size;
    canvas.fill_rect(cell.x + 0.1 * s, cell.y + 0.4 * s, 0.8 * s, 0.6 * s, WOOD);
    canvas.fill_triangle(
        (cell.x, cell.y + 0.45 * s),
        (cell.x + s, cell.y + 0.45 * s),
        (cell.x + s / 2.0, cell.y + 0.1 * s),
        TILE_ROOF,
    );
}

fn draw_path(canvas: &mut Canvas, cell: Cell) {
    let kind = cell.variant(PATH_SHADES.len());
    canvas.fill_rect(cell.x, cell.y, cell.size, cell.size, PATH_SHADES[kind]);
    let stone = PATH_SHADES[(kind + 1) % PATH_SHADES.len()];
    canvas.fill_circle(
        cell.x + cell.size / 2.0,
        cell.y + cell.size / 2.0,
        cell.size * 0.3,
        stone,
    );
}

fn draw_skyscraper(canvas: &mut Canvas, cell: Cell, seed: u64) {
    let s = cell.size;
    canvas.fill_rect(cell.x + 0.1 * s, cell.y, 0.8 * s, s, TOWER);
    if s >= 5.0 && jitter(cell.row, cell.col, seed, 200) > 0.4 {
        let wx = cell.x + (0.2 + 0.4 * jitter(cell.row, cell.col, seed, 201)) * s;
        let wy = cell.y + (0.1 + 0.6 * jitter(cell.row, cell.col, seed, 202)) * s;
        canvas.fill_rect(wx, wy, 0.2 * s, 0.2 * s, LIT_WINDOW);
    }
}

fn draw_sky(canvas: &mut Canvas, cell: Cell, ctx: &ModuleContext, seed: u64) {
    let shade = SKY_SHADES[cell.variant(SKY_SHADES.len())];
    canvas.fill_rect(cell.x, cell.y, cell.size, cell.size, shade);
    if !ctx.is_edge && jitter(cell.row, cell.col, seed, 300) > 0.85 {
        let sx = cell.x + jitter(cell.row, cell.col, seed, 301) * cell.size;
        let sy = cell.y + jitter(cell.row, cell.col, seed, 302) * cell.size;
        canvas.fill_circle(sx, sy, (cell.size * 0.05).max(0.75), [255, 255, 255]);
    }
}

fn draw_shape(canvas: &mut Canvas, cell: Cell, seed: u64) {
    let color = ABSTRACT_DARK[cell.variant(ABSTRACT_DARK.len())];
    let inset = cell.size * 0.1 * jitter(cell.row, cell.col, seed, 400);
    let (x, y, s) = (cell.x + inset, cell.y + inset, cell.size - 2.0 * inset);
    match (cell.row * 7 + cell.col * 3) % 3 {
        0 => canvas.fill_rect(x, y, s, s, color),
        1 => canvas.fill_circle(x + s / 2.0, y + s / 2.0, s / 2.0, color),
        _ => canvas.fill_triangle((x, y + s), (x + s, y + s), (x + s / 2.0, y), color),
    }
}

/// Overlay-blended light gradient with per-stop alpha
struct Lighting {
    shape: GradientShape,
    from: (Rgb, f32),
    to: (Rgb, f32),
}

fn lighting_for(style: ArtStyle, s: f32) -> Option<Lighting> {
    let lighting = match style {
        ArtStyle::WinterVillage => Lighting {
            shape: GradientShape::Radial {
                center: (0.3 * s, 0.3 * s),
                radius: 0.8 * s,
            },
            from: ([255, 255, 255], 0.3),
            to: ([135, 206, 235], 0.1),
        },
        ArtStyle::ForestCabin => Lighting {
            shape: GradientShape::Linear {
                from: (0.0, 0.0),
                to: (s, s),
            },
            from: ([255, 255, 255], 0.2),
            to: ([34, 139, 34], 0.1),
        },
        ArtStyle::JapaneseGarden => Lighting {
            shape: GradientShape::Radial {
                center: (s / 2.0, s / 2.0),
                radius: s / 2.0,
            },
            from: ([255, 228, 225], 0.2),
            to: ([210, 180, 140], 0.1),
        },
        ArtStyle::CityNight => Lighting {
            shape: GradientShape::Linear {
                from: (0.0, 0.0),
                to: (0.0, s),
            },
            from: ([25, 25, 112], 0.2),
            to: ([30, 30, 30], 0.3),
        },
        ArtStyle::Abstract | ArtStyle::Basic => return None,
    };
    Some(lighting)
}

fn apply_lighting(canvas: &mut Canvas, style: ArtStyle) {
    let s = canvas.width().min(canvas.height()) as f32;
    let Some(light) = lighting_for(style, s) else {
        return;
    };
    canvas.map(|x, y, base| {
        let t = light.shape.param(x as f32 + 0.5, y as f32 + 0.5);
        let top = lerp_color(light.from.0, light.to.0, t);
        let alpha = (light.from.1 + (light.to.1 - light.from.1) * t) * LIGHTING_ALPHA;
        std::array::from_fn(|c| {
            let b = base[c] as f32;
            let blended = blend_channel(BlendMode::Overlay, top[c] as f32, b);
            (b + (blended - b) * alpha).round().clamp(0.0, 255.0) as u8
        })
    });
}

/// Scale every channel's distance from mid-grey by `factor`
pub fn enhance_contrast(image: &mut RasterImage, factor: f32) {
    for px in image.as_bytes_mut().chunks_exact_mut(4) {
        for c in &mut px[..3] {
            *c = ((*c as f32 - 128.0) * factor + 128.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Pixel bounds `[start, end)` of cell `index` along an axis
fn cell_bounds(index: usize, cell: f32, limit: usize) -> (usize, usize) {
    let start = ((index as f32 * cell).round() as usize).min(limit);
    let end = (((index + 1) as f32 * cell).round() as usize).min(limit);
    (start, end.max(start))
}

/// Darken a pixel so its luminance is at most `max`
fn cap_luminance(px: Rgb, max: f32) -> Rgb {
    let lum = luminance(px[0], px[1], px[2]);
    if lum <= max {
        return px;
    }
    px.map(|c| rescale(c, true, max / lum))
}

/// Lighten a pixel so its luminance is at least `min`
fn floor_luminance(px: Rgb, min: f32) -> Rgb {
    let lum = luminance(px[0], px[1], px[2]);
    if lum >= min {
        return px;
    }
    px.map(|c| rescale(c, false, (255.0 - min) / (255.0 - lum).max(f32::EPSILON)))
}

/// Push every cell of `image` (which covers `matrix` edge to edge) back into
/// its class.
///
/// The sampling core around each cell centre is forced below
/// [`DARK_CORE_MAX`] or above [`LIGHT_CORE_MIN`]; then the whole cell is
/// scaled so its mean luminance respects [`DARK_MEAN_MAX`] or
/// [`LIGHT_MEAN_MIN`]. Cells already inside their class are untouched.
pub fn enforce_module_contrast(image: &mut RasterImage, matrix: &QrMatrix) {
    let n = matrix.size();
    let (w, h) = (image.width(), image.height());
    if n == 0 || w == 0 || h == 0 {
        return;
    }
    let cell_w = w as f32 / n as f32;
    let cell_h = h as f32 / n as f32;
    let cell = cell_w.min(cell_h);
    let reach = sample_radius(cell) + (cell / 10.0).floor().max(1.0) as usize;

    for row in 0..n {
        let (y0, y1) = cell_bounds(row, cell_h, h);
        for col in 0..n {
            let (x0, x1) = cell_bounds(col, cell_w, w);
            if x0 == x1 || y0 == y1 {
                continue;
            }
            let dark = matrix.get(col, row);
            let cx = (col as f32 * cell_w + cell_w / 2.0).round() as usize;
            let cy = (row as f32 * cell_h + cell_h / 2.0).round() as usize;
            let core_x = cx.saturating_sub(reach).max(x0)..(cx + reach + 1).min(x1);
            let core_y = cy.saturating_sub(reach).max(y0)..(cy + reach + 1).min(y1);

            for y in core_y {
                for x in core_x.clone() {
                    let px = image.rgb(x, y);
                    let forced = if dark {
                        cap_luminance(px, DARK_CORE_MAX)
                    } else {
                        floor_luminance(px, LIGHT_CORE_MIN)
                    };
                    let a = image.pixel(x, y)[3];
                    image.put_pixel(x, y, [forced[0], forced[1], forced[2], a]);
                }
            }

            let mut sum = 0.0;
            for y in y0..y1 {
                for x in x0..x1 {
                    sum += image.luminance(x, y);
                }
            }
            let mean = sum / ((x1 - x0) * (y1 - y0)) as f32;

            let k = if dark && mean > DARK_MEAN_MAX {
                DARK_MEAN_MAX / mean
            } else if !dark && mean < LIGHT_MEAN_MIN {
                (255.0 - LIGHT_MEAN_MIN) / (255.0 - mean).max(f32::EPSILON)
            } else {
                continue;
            };
            for y in y0..y1 {
                for x in x0..x1 {
                    let [r, g, b, a] = image.pixel(x, y);
                    let [r, g, b] = [r, g, b].map(|c| rescale(c, dark, k));
                    image.put_pixel(x, y, [r, g, b, a]);
                }
            }
        }
    }
}

/// Scale a channel toward black (dark) or white (light) by `k`
fn rescale(c: u8, dark: bool, k: f32) -> u8 {
    if dark {
        (c as f32 * k).floor() as u8
    } else {
        (255.0 - (255.0 - c as f32) * k).ceil().min(255.0) as u8
    }
}

/// Repaint finder zones in flat palette tones after the softening passes
fn paint_finder_zones(image: &mut RasterImage, matrix: &QrMatrix, palette: &Palette) {
    let n = matrix.size();
    let cell_w = image.width() as f32 / n as f32;
    let cell_h = image.height() as f32 / n as f32;
    for row in 0..n {
        for col in (0..n).filter(|&c| in_finder_zone(row, c, n)) {
            let tone = if matrix.get(col, row) {
                palette.dark
            } else {
                palette.light
            };
            let (x0, x1) = cell_bounds(col, cell_w, image.width());
            let (y0, y1) = cell_bounds(row, cell_h, image.height());
            for y in y0..y1 {
                for x in x0..x1 {
                    image.put_pixel(x, y, [tone[0], tone[1], tone[2], 255]);
                }
            }
        }
    }
}
