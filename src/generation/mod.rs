//! Generative-image boundary
//!
//! The matrix is turned into a control image and sent, with a style prompt,
//! to a [`GenerationService`]. Results are contrast-corrected, re-extracted
//! and compared with the source matrix; failures are retried a bounded
//! number of times.

/// Deterministic stand-in backend
pub mod local;
/// JSON contract with an external service
pub mod remote;
/// Generate-verify retry state machine
pub mod retry;
/// Request types, prompts and the service trait
pub mod service;

pub use local::LocalGenerator;
pub use remote::{RemoteGenerator, Transport};
pub use retry::{
    Adjustment, AttemptState, Comparison, GenerationOutcome, Quality, RetryPolicy, Verifier,
};
pub use service::{GenerationConfig, GenerationRequest, GenerationService, style_prompt};

use crate::config::{GeneratorKind, generation_attempts};
use crate::error::{QrArtError, Result};
use crate::models::{ArtStyle, QrMatrix};
use tracing::info_span;

/// Backend for `kind`. A remote backend needs a transport; asking for one
/// without it is a configuration error.
pub fn select_service<T: Transport + 'static>(
    kind: GeneratorKind,
    transport: Option<T>,
    endpoint: &str,
) -> Result<Box<dyn GenerationService>> {
    match (kind, transport) {
        (GeneratorKind::Remote, Some(transport)) => {
            Ok(Box::new(RemoteGenerator::new(transport, endpoint)))
        }
        (kind, _) => Ok(Box::new(local_service(kind)?)),
    }
}

/// Backend for callers with no [`Transport`] of their own, such as the
/// bundled CLI. Only the local generator is available there.
pub fn local_service(kind: GeneratorKind) -> Result<LocalGenerator> {
    match kind {
        GeneratorKind::Local => Ok(LocalGenerator::new()),
        GeneratorKind::Remote => Err(QrArtError::GenerationService(
            "remote generation needs a Transport supplied by the embedding application"
                .to_string(),
        )),
    }
}

/// Generate a styled image for `matrix` and verify it re-extracts, using
/// the attempt budget from [`generation_attempts`]
pub fn generate_art(
    service: &dyn GenerationService,
    matrix: &QrMatrix,
    style: ArtStyle,
    config: &GenerationConfig,
    verifier: Verifier,
    seed: u64,
) -> Result<GenerationOutcome> {
    let _span = info_span!("generate", style = %style, backend = service.name()).entered();
    let request = GenerationRequest::new(matrix, style, config, seed)?;
    RetryPolicy::new(service, verifier, generation_attempts()).run(&request, matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Unreachable;

    impl Transport for Unreachable {
        fn post_json(&self, _: &str, _: &str, _: Duration) -> Result<String> {
            Err(QrArtError::GenerationService("unreachable".into()))
        }

        fn fetch(&self, _: &str, _: Duration) -> Result<Vec<u8>> {
            Err(QrArtError::GenerationService("unreachable".into()))
        }
    }

    #[test]
    fn test_select_service() {
        let local = select_service::<Unreachable>(GeneratorKind::Local, None, "").unwrap();
        assert_eq!(local.name(), "local");
        let remote = select_service(GeneratorKind::Remote, Some(Unreachable), "e").unwrap();
        assert_eq!(remote.name(), "remote");
        assert!(select_service::<Unreachable>(GeneratorKind::Remote, None, "e").is_err());
    }

    #[test]
    fn test_local_service_refuses_remote() {
        assert_eq!(local_service(GeneratorKind::Local).unwrap().name(), "local");
        let err = local_service(GeneratorKind::Remote).unwrap_err();
        assert!(matches!(err, QrArtError::GenerationService(_)));
        assert!(err.to_string().contains("Transport"));
    }
}
