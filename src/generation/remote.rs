//! JSON contract with an external image-generation service.
//!
//! The HTTP client itself lives behind [`Transport`]; this module only
//! shapes requests and interprets responses.

use super::service::{GenerationRequest, GenerationService, decode_data_url};
use crate::error::{QrArtError, Result};
use crate::models::RasterImage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Conditioning mode requested from the service
const CONTROL_TYPE: &str = "qr_code";

/// Moves bytes to and from the service. The crate ships no HTTP client;
/// the embedding application implements this over its own stack.
pub trait Transport: Send + Sync {
    /// POST a JSON body and return the response body
    fn post_json(&self, endpoint: &str, body: &str, timeout: Duration) -> Result<String>;

    /// GET a resource (used when the service answers with plain URLs)
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>>;
}

/// Request body as sent on the wire
#[derive(Debug, Serialize)]
pub struct WireRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Scene description
    pub prompt: &'a str,
    /// Control image as a PNG data URL
    pub image: String,
    /// Always `qr_code`
    pub control_type: &'a str,
    /// Control image weight
    pub control_weight: f32,
    /// Output width
    pub width: usize,
    /// Output height
    pub height: usize,
    /// Diffusion steps
    pub num_inference_steps: u32,
    /// Guidance scale
    pub guidance_scale: f32,
    /// `1 − denoising`
    pub strength: f32,
    /// Sampling seed
    pub seed: u64,
}

impl<'a> From<&'a GenerationRequest> for WireRequest<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            model: &request.model,
            prompt: &request.prompt,
            image: request.control_data_url(),
            control_type: CONTROL_TYPE,
            control_weight: request.control_weight,
            width: request.width,
            height: request.height,
            num_inference_steps: request.steps,
            guidance_scale: request.guidance_scale,
            strength: request.strength,
            seed: request.seed,
        }
    }
}

/// Response body: one or more image URLs or data URLs
#[derive(Debug, Deserialize)]
pub struct WireResponse {
    /// Generated images; only the first one is used
    #[serde(default)]
    pub images: Vec<String>,
}

/// Generation through an external service
pub struct RemoteGenerator<T: Transport> {
    transport: T,
    endpoint: String,
}

impl<T: Transport> RemoteGenerator<T> {
    /// Generator posting to `endpoint` through `transport`
    pub fn new(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn image_bytes(&self, reference: &str, timeout: Duration) -> Result<Vec<u8>> {
        if reference.starts_with("data:") {
            decode_data_url(reference)
        } else {
            self.transport.fetch(reference, timeout)
        }
    }
}

impl<T: Transport> GenerationService for RemoteGenerator<T> {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn generate(&self, request: &GenerationRequest) -> Result<RasterImage> {
        let body = serde_json::to_string(&WireRequest::from(request))
            .map_err(|e| QrArtError::GenerationService(format!("request encoding: {e}")))?;
        debug!(
            endpoint = %self.endpoint,
            seed = request.seed,
            bytes = body.len(),
            "posting generation request"
        );

        let raw = self
            .transport
            .post_json(&self.endpoint, &body, request.timeout)?;
        let response: WireResponse = serde_json::from_str(&raw)
            .map_err(|e| QrArtError::GenerationService(format!("malformed response: {e}")))?;

        let Some(first) = response.images.first() else {
            warn!("service returned no images");
            return Err(QrArtError::GenerationService(
                "no images in response".to_string(),
            ));
        };

        let bytes = self.image_bytes(first, request.timeout)?;
        RasterImage::decode(&bytes)
            .map_err(|e| QrArtError::GenerationService(format!("undecodable image: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::service::{GenerationConfig, encode_data_url};
    use crate::models::{ArtStyle, QrMatrix};
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<String>,
        sent: Mutex<Vec<String>>,
        fetched: Vec<u8>,
    }

    impl Scripted {
        fn new(reply: Result<String>) -> Self {
            Self {
                reply,
                sent: Mutex::new(Vec::new()),
                fetched: Vec::new(),
            }
        }
    }

    impl Transport for Scripted {
        fn post_json(&self, _endpoint: &str, body: &str, _timeout: Duration) -> Result<String> {
            self.sent.lock().unwrap().push(body.to_string());
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(QrArtError::GenerationService(e.to_string())),
            }
        }

        fn fetch(&self, _url: &str, _timeout: Duration) -> Result<Vec<u8>> {
            Ok(self.fetched.clone())
        }
    }

    fn request() -> GenerationRequest {
        let matrix = QrMatrix::from_fn(21, 21, |x, y| x == y);
        let config = GenerationConfig {
            image_size: 42,
            ..GenerationConfig::default()
        };
        GenerationRequest::new(&matrix, ArtStyle::Abstract, &config, 11).unwrap()
    }

    fn png_url() -> String {
        let png = RasterImage::filled(4, 4, [10, 20, 30]).to_png().unwrap();
        encode_data_url(&png)
    }

    #[test]
    fn test_request_wire_format() {
        let reply = format!(r#"{{"images":["{}"]}}"#, png_url());
        let generator = RemoteGenerator::new(Scripted::new(Ok(reply)), "https://gen.invalid/v1");
        let image = generator.generate(&request()).unwrap();
        assert_eq!(image.rgb(0, 0), [10, 20, 30]);

        let sent = generator.transport.sent.lock().unwrap();
        let body: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(body["model"], "flux-dev");
        assert_eq!(body["control_type"], "qr_code");
        assert_eq!(body["width"], 42);
        assert_eq!(body["seed"], 11);
        assert_eq!(body["num_inference_steps"], 30);
        assert!(body["image"].as_str().unwrap().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_plain_url_is_fetched() {
        let mut transport = Scripted::new(Ok(r#"{"images":["https://cdn.invalid/a.png"]}"#.into()));
        transport.fetched = RasterImage::filled(2, 2, [1, 2, 3]).to_png().unwrap();
        let generator = RemoteGenerator::new(transport, "e");
        assert_eq!(generator.generate(&request()).unwrap().rgb(1, 1), [1, 2, 3]);
    }

    #[test]
    fn test_bad_responses_are_service_errors() {
        for reply in [
            r#"{"images":[]}"#,
            "{}",
            "not json",
            r#"{"images":["data:x;base64,AAAA"]}"#,
        ] {
            let generator = RemoteGenerator::new(Scripted::new(Ok(reply.into())), "e");
            let err = generator.generate(&request()).unwrap_err();
            assert!(matches!(err, QrArtError::GenerationService(_)), "{reply}");
        }
    }

    #[test]
    fn test_transport_failure_propagates() {
        let generator = RemoteGenerator::new(
            Scripted::new(Err(QrArtError::GenerationService("timeout".into()))),
            "e",
        );
        assert!(generator.generate(&request()).unwrap_err().is_retryable());
    }
}
