//! Request and response types of the generative-image boundary
use crate::error::{QrArtError, Result};
use crate::models::{ArtStyle, QrMatrix, RasterImage};
use crate::render::control::{CONTROL_BLUR_RADIUS, control_image};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::time::Duration;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Conditioning parameters shared by every request of a run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Model identifier sent to the service
    pub model: String,
    /// Output side length in pixels
    pub image_size: usize,
    /// How strongly the control image constrains the result, in [0, 1]
    pub control_weight: f32,
    /// How far the result may drift from the control image, in [0, 1]
    pub denoising: f32,
    /// Classifier-free guidance scale
    pub guidance_scale: f32,
    /// Diffusion steps
    pub steps: u32,
    /// Per-request deadline
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "flux-dev".to_string(),
            image_size: 1024,
            control_weight: 0.75,
            denoising: 0.6,
            guidance_scale: 8.5,
            steps: 30,
            timeout: Duration::from_secs(60),
        }
    }
}

/// One generation call: a prompt plus the matrix as a control image
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Scene description
    pub prompt: String,
    /// PNG bytes of the control image
    pub control_png: Vec<u8>,
    /// Output width
    pub width: usize,
    /// Output height
    pub height: usize,
    /// Modules per side of the matrix behind the control image
    pub module_count: usize,
    /// Control image weight
    pub control_weight: f32,
    /// `1 − denoising`
    pub strength: f32,
    /// Sampling seed
    pub seed: u64,
    /// Diffusion steps
    pub steps: u32,
    /// Guidance scale
    pub guidance_scale: f32,
    /// Model identifier
    pub model: String,
    /// Deadline for this request
    pub timeout: Duration,
}

impl GenerationRequest {
    /// Build a request for `matrix` drawn in `style`
    pub fn new(
        matrix: &QrMatrix,
        style: ArtStyle,
        config: &GenerationConfig,
        seed: u64,
    ) -> Result<Self> {
        let control = control_image(matrix, config.image_size, CONTROL_BLUR_RADIUS);
        Ok(Self {
            prompt: style_prompt(style).to_string(),
            control_png: control.to_png()?,
            width: config.image_size,
            height: config.image_size,
            module_count: matrix.size(),
            control_weight: config.control_weight.clamp(0.0, 1.0),
            strength: 1.0 - config.denoising.clamp(0.0, 1.0),
            seed,
            steps: config.steps,
            guidance_scale: config.guidance_scale,
            model: config.model.clone(),
            timeout: config.timeout,
        })
    }

    /// Same request with another seed
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Control image as a `data:image/png;base64,` URL
    pub fn control_data_url(&self) -> String {
        encode_data_url(&self.control_png)
    }
}

/// A backend that turns a request into exactly one image
pub trait GenerationService: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Produce one image for `request`
    fn generate(&self, request: &GenerationRequest) -> Result<RasterImage>;
}

/// Scene description for a style
pub fn style_prompt(style: ArtStyle) -> &'static str {
    match style {
        ArtStyle::WinterVillage => {
            "A beautiful winter village scene with cozy wooden houses covered in snow, warm golden lights glowing from windows, surrounded by snow-covered pine trees and mountains in the background, peaceful evening atmosphere, photorealistic, high quality, detailed"
        }
        ArtStyle::ForestCabin => {
            "A serene forest landscape with tall pine trees, dappled sunlight filtering through the canopy, moss-covered ground, small clearings with wildflowers, natural and peaceful atmosphere, photorealistic, high quality"
        }
        ArtStyle::JapaneseGarden => {
            "A tranquil Japanese garden with traditional wooden buildings, stone pathways, carefully manicured trees, a small pond with koi fish, zen atmosphere, soft natural lighting, photorealistic, high quality"
        }
        ArtStyle::CityNight => {
            "A modern city skyline at night with illuminated skyscrapers, glowing windows, neon lights reflecting on wet streets, urban atmosphere, dramatic lighting, photorealistic, high quality"
        }
        ArtStyle::Abstract => {
            "An abstract artistic composition with geometric patterns, flowing organic shapes, harmonious color palette, modern art style, high contrast, visually striking, artistic masterpiece"
        }
        ArtStyle::Basic => {
            "A clean minimal mosaic of dark and light tiles, flat colors, high contrast, sharp edges"
        }
    }
}

/// Wrap PNG bytes in a base64 data URL
pub fn encode_data_url(png: &[u8]) -> String {
    format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png))
}

/// Payload bytes of a base64 `data:` URL of any image type
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, data)| data)
        .ok_or_else(|| QrArtError::GenerationService("not a base64 data URL".to_string()))?;
    STANDARD
        .decode(payload.trim())
        .map_err(|e| QrArtError::GenerationService(format!("invalid base64 payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_defaults() {
        let matrix = QrMatrix::from_fn(21, 21, |x, y| (x * y) % 2 == 0);
        let config = GenerationConfig {
            image_size: 84,
            ..GenerationConfig::default()
        };
        let request = GenerationRequest::new(&matrix, ArtStyle::CityNight, &config, 7).unwrap();
        assert_eq!((request.width, request.height), (84, 84));
        assert_eq!(request.module_count, 21);
        assert!((request.strength - 0.4).abs() < 1e-6);
        assert!(request.prompt.starts_with("A modern city skyline"));

        let control = RasterImage::decode(&request.control_png).unwrap();
        assert_eq!(control.width(), 84);
        assert_eq!(request.with_seed(9).seed, 9);
    }

    #[test]
    fn test_data_url() {
        let url = encode_data_url(&[1, 2, 3, 250]);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), vec![1, 2, 3, 250]);
        assert_eq!(decode_data_url("data:image/jpeg;base64,AQI=").unwrap(), vec![1, 2]);
        assert!(decode_data_url("https://example.com/a.png").is_err());
        assert!(decode_data_url("data:image/png;base64,!!").is_err());
    }

    #[test]
    fn test_every_style_has_a_prompt() {
        for style in ArtStyle::ALL {
            assert!(!style_prompt(style).is_empty());
        }
    }
}
