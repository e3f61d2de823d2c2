//! Generate-verify loop and session workflow against stub backends

mod common;

use common::{render, synthetic_matrix};
use qr_art::error::Result;
use qr_art::generation::service::encode_data_url;
use qr_art::generation::{GenerationRequest, RetryPolicy, Verifier, generate_art};
use qr_art::session::RenderedOutput;
use qr_art::{
    ArtSettings, ArtStyle, GenerationConfig, LocalGenerator, Quality, QrArtError, RasterImage,
    RemoteGenerator, Session, SessionState, Transport,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Fails the first `failures` posts, then answers with `image`
struct StubTransport {
    failures: usize,
    calls: AtomicUsize,
    image: RasterImage,
    bodies: Mutex<Vec<String>>,
}

impl StubTransport {
    fn new(failures: usize, image: RasterImage) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
            image,
            bodies: Mutex::new(Vec::new()),
        }
    }
}

impl Transport for StubTransport {
    fn post_json(&self, _endpoint: &str, body: &str, _timeout: Duration) -> Result<String> {
        self.bodies.lock().unwrap().push(body.to_string());
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(QrArtError::GenerationService("503 from upstream".into()));
        }
        let url = encode_data_url(&self.image.to_png()?);
        Ok(format!(r#"{{"images":["{url}"]}}"#))
    }

    fn fetch(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>> {
        Err(QrArtError::GenerationService(format!("unexpected fetch of {url}")))
    }
}

fn config() -> GenerationConfig {
    GenerationConfig {
        image_size: 200,
        ..GenerationConfig::default()
    }
}

#[test]
fn test_local_generation_verifies_first_time() {
    let matrix = synthetic_matrix(25, 4);
    let outcome = generate_art(
        &LocalGenerator::new(),
        &matrix,
        ArtStyle::WinterVillage,
        &config(),
        Verifier::default(),
        40,
    )
    .unwrap();
    assert_eq!(outcome.quality, Quality::Verified { bit_errors: 0 });
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.seed, 40);
    assert_eq!((outcome.image.width(), outcome.image.height()), (200, 200));
}

#[test]
fn test_remote_retries_transient_failures() {
    let matrix = synthetic_matrix(25, 4);
    let service = RemoteGenerator::new(StubTransport::new(2, render(&matrix, 8)), "stub://gen");
    let request = GenerationRequest::new(&matrix, ArtStyle::CityNight, &config(), 7).unwrap();

    let outcome = RetryPolicy::new(&service, Verifier::default(), 3)
        .run(&request, &matrix)
        .unwrap();
    assert!(outcome.quality.is_verified());
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.seed, 9);

    let bodies = service.transport().bodies.lock().unwrap().clone();
    let weights: Vec<f64> = bodies
        .iter()
        .map(|b| serde_json::from_str::<serde_json::Value>(b).unwrap())
        .map(|body| body["control_weight"].as_f64().unwrap())
        .collect();
    assert_eq!(weights.len(), 3);
    assert!(weights[0] < weights[1] && weights[1] < weights[2]);
    assert!((outcome.adjustment.control_weight as f64 - weights[2]).abs() < 1e-6);
}

#[test]
fn test_remote_wire_body() {
    let matrix = synthetic_matrix(21, 1);
    let transport = StubTransport::new(0, render(&matrix, 8));
    let service = RemoteGenerator::new(transport, "stub://gen");
    let request = GenerationRequest::new(&matrix, ArtStyle::ForestCabin, &config(), 3).unwrap();
    RetryPolicy::new(&service, Verifier::default(), 1)
        .run(&request, &matrix)
        .unwrap();

    let bodies = service.transport().bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(body["control_type"], "qr_code");
    assert_eq!(body["model"], "flux-dev");
    assert_eq!(body["seed"], 3);
    assert_eq!(body["width"], 200);
    assert!(body["image"].as_str().unwrap().starts_with("data:image/png;base64,"));
}

#[test]
fn test_unscannable_results_come_back_degraded() {
    let matrix = synthetic_matrix(25, 4);
    let blank = RasterImage::filled(200, 200, [255, 255, 255]);
    let service = RemoteGenerator::new(StubTransport::new(0, blank), "stub://gen");
    let request = GenerationRequest::new(&matrix, ArtStyle::Abstract, &config(), 0).unwrap();

    let outcome = RetryPolicy::new(&service, Verifier::default(), 2)
        .run(&request, &matrix)
        .unwrap();
    assert_eq!(
        outcome.quality,
        Quality::Degraded {
            bit_errors: 625,
            total: 625,
            locator_found: false
        }
    );
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.seed, 0);
}

#[test]
fn test_session_workflow_with_stale_render() {
    let matrix = synthetic_matrix(25, 4);
    let mut session = Session::default();
    session.load_bytes(&render(&matrix, 8).to_png().unwrap()).unwrap();
    assert_eq!(session.extract().unwrap().matrix, matrix);

    session
        .select_style(ArtSettings {
            style: ArtStyle::Basic,
            output_size: 200,
            ..ArtSettings::default()
        })
        .unwrap();
    assert_eq!(session.state(), SessionState::StyleSelected);

    let first = session.begin_render().unwrap();
    let second = session.begin_render().unwrap();
    assert!(first.is_stale());
    assert!(!second.is_stale());

    let output = |ticket: &qr_art::session::RenderTicket| RenderedOutput {
        image: qr_art::render_art(&ticket.matrix, &ticket.settings),
        quality: None,
    };
    assert!(!session.complete_render(&first, Ok(output(&first))));
    assert_eq!(session.state(), SessionState::Rendering);
    assert!(session.complete_render(&second, Ok(output(&second))));
    assert_eq!(session.state(), SessionState::Rendered);
    assert_eq!(session.output().unwrap().image.width(), 200);
}
