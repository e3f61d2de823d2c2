use crate::error::{QrArtError, Result};
use image::RgbaImage;

/// 8-bit RGB colour
pub type Rgb = [u8; 3];

/// RGBA raster, row-major, 4 bytes per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap an RGBA buffer, checking its length against the dimensions
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height * 4 {
            return Err(QrArtError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Solid-colour opaque image
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        let mut data = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            data.extend_from_slice(&[color[0], color[1], color[2], 255]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Build an opaque image by evaluating `f(x, y)` per pixel
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Rgb) -> Self {
        let mut data = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            for x in 0..width {
                let [r, g, b] = f(x, y);
                data.extend_from_slice(&[r, g, b, 255]);
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Decode any raster format the `image` crate understands
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::from(decoded.to_rgba8()))
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw RGBA bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume into the raw RGBA buffer
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// RGBA at (x, y). Callers stay in bounds.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// RGB at (x, y)
    pub fn rgb(&self, x: usize, y: usize) -> Rgb {
        let i = (y * self.width + x) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Overwrite RGBA at (x, y); out-of-bounds writes are ignored
    pub fn put_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y * self.width + x) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Luminance `0.299R + 0.587G + 0.114B` of one pixel
    pub fn luminance(&self, x: usize, y: usize) -> f32 {
        let [r, g, b] = self.rgb(x, y);
        luminance(r, g, b)
    }

    /// Copy of the `w × h` window at (x, y), clipped to the image
    pub fn crop(&self, x: usize, y: usize, w: usize, h: usize) -> RasterImage {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        let cw = x_end.saturating_sub(x);
        let ch = y_end.saturating_sub(y);
        let mut data = Vec::with_capacity(cw * ch * 4);
        for row in (y..y_end).filter(|_| cw > 0) {
            let start = (row * self.width + x) * 4;
            data.extend_from_slice(&self.data[start..start + cw * 4]);
        }
        RasterImage {
            width: cw,
            height: ch,
            data,
        }
    }

    /// Resample to a new size
    pub fn resized(
        &self,
        width: usize,
        height: usize,
        filter: image::imageops::FilterType,
    ) -> Self {
        let source = self.to_rgba_image();
        let scaled = image::imageops::resize(&source, width as u32, height as u32, filter);
        Self::from(scaled)
    }

    /// Copy into an `image` crate buffer
    pub fn to_rgba_image(&self) -> RgbaImage {
        // Dimensions and length are validated on construction
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Rgba(self.pixel(x as usize, y as usize))
        })
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        use image::ImageEncoder;
        use image::codecs::png::PngEncoder;

        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                &self.data,
                self.width as u32,
                self.height as u32,
                image::ColorType::Rgba8,
            )
            .map_err(|e| QrArtError::Encode(e.to_string()))?;
        Ok(out)
    }
}

impl From<RgbaImage> for RasterImage {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width: width as usize,
            height: height as usize,
            data: img.into_raw(),
        }
    }
}

/// Luminance of an RGB triple in [0, 255]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Single-channel luminance image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Row-major luminance values
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Wrap a luminance buffer
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height {
            return Err(QrArtError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Luminance at (x, y)
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}
