//! Bounded generate-then-verify loop.
//!
//! Each attempt moves through `Requesting → Verifying` and ends in either
//! `Done` or `Retrying`. Service errors and verification failures are both
//! retried with a fresh seed and an escalated [`Adjustment`] until the
//! attempt budget runs out; the closest image seen so far is then returned
//! as [`Quality::Degraded`].

use super::service::{GenerationRequest, GenerationService};
use crate::config::PipelineConfig;
use crate::error::{QrArtError, Result};
use crate::models::{QrMatrix, RasterImage};
use crate::pipeline::extract_matrix;
use crate::render::art::enhance_contrast;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Control weight added per retry
pub const CONTROL_WEIGHT_STEP: f32 = 0.1;
/// Strength removed per retry
pub const STRENGTH_STEP: f32 = 0.1;
/// Post-process contrast factor added per retry
pub const CONTRAST_STEP: f32 = 0.25;
/// Upper bound of the post-process contrast factor
pub const MAX_CONTRAST: f32 = 3.0;

/// How well the returned image reproduces the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum Quality {
    /// Re-extraction matched within the allowed bit errors
    Verified {
        /// Modules that differ
        bit_errors: usize,
    },
    /// Best effort after the attempt budget ran out
    Degraded {
        /// Modules that differ in the best image
        bit_errors: usize,
        /// Modules compared
        total: usize,
        /// False when no attempt had three recoverable anchors
        locator_found: bool,
    },
}

impl Quality {
    /// Whether the image passed verification
    pub fn is_verified(&self) -> bool {
        matches!(self, Quality::Verified { .. })
    }
}

/// Conditioning used for one attempt. Retries lean harder on the control
/// image: more control weight, less strength and a steeper contrast pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adjustment {
    /// Control image weight sent to the service
    pub control_weight: f32,
    /// Strength sent to the service
    pub strength: f32,
    /// Contrast factor applied to the returned image
    pub contrast: f32,
}

impl Adjustment {
    /// First-attempt values taken from the request
    pub fn initial(request: &GenerationRequest) -> Self {
        let control_weight = request.control_weight.clamp(0.0, 1.0);
        Self {
            control_weight,
            strength: request.strength.clamp(0.0, 1.0),
            contrast: 1.0 + control_weight,
        }
    }

    /// Values for the next attempt, each moved one bounded step
    pub fn escalated(self) -> Self {
        Self {
            control_weight: (self.control_weight + CONTROL_WEIGHT_STEP).min(1.0),
            strength: (self.strength - STRENGTH_STEP).max(0.0),
            contrast: (self.contrast + CONTRAST_STEP).min(MAX_CONTRAST),
        }
    }

    /// `request` with these values and `seed`
    pub fn apply(&self, request: &GenerationRequest, seed: u64) -> GenerationRequest {
        GenerationRequest {
            control_weight: self.control_weight,
            strength: self.strength,
            ..request.with_seed(seed)
        }
    }
}

/// Final image of a generation run
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Post-processed image
    pub image: RasterImage,
    /// Verification result
    pub quality: Quality,
    /// Attempts used (1-based)
    pub attempts: usize,
    /// Seed of the returned image
    pub seed: u64,
    /// Conditioning of the attempt that produced the image
    pub adjustment: Adjustment,
}

/// Outcome of re-extracting one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    /// Modules that differ
    pub bit_errors: usize,
    /// Modules compared
    pub total: usize,
    /// Whether the anchors were found at all
    pub locator_found: bool,
}

/// Re-runs matrix recovery on a generated image
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Verifier {
    /// Recovery settings
    pub pipeline: PipelineConfig,
    /// Module mismatches still accepted as a pass
    pub max_bit_errors: usize,
}

impl Verifier {
    /// Compare the grid recovered from `image` with `expected`. An image
    /// whose anchors cannot be found counts every module as wrong.
    pub fn compare(&self, image: &RasterImage, expected: &QrMatrix) -> Result<Comparison> {
        let total = expected.size() * expected.size();
        match extract_matrix(image, &self.pipeline) {
            Ok(extraction) => Ok(Comparison {
                bit_errors: extraction.matrix.hamming_distance(expected).min(total),
                total,
                locator_found: true,
            }),
            Err(QrArtError::LocatorNotFound { found }) => {
                warn!(found, total, "generated image has no recoverable anchors");
                Ok(Comparison {
                    bit_errors: total,
                    total,
                    locator_found: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Number of differing modules, or [`QrArtError::VerificationFailed`]
    /// when above the allowance
    pub fn verify(&self, image: &RasterImage, expected: &QrMatrix) -> Result<usize> {
        let Comparison {
            bit_errors, total, ..
        } = self.compare(image, expected)?;
        if bit_errors > self.max_bit_errors {
            return Err(QrArtError::VerificationFailed { bit_errors, total });
        }
        Ok(bit_errors)
    }
}

/// One step of the retry state machine
#[derive(Debug)]
pub enum AttemptState {
    /// About to call the service
    Requesting {
        /// 1-based attempt number
        attempt: usize,
        /// Conditioning for this attempt
        adjustment: Adjustment,
    },
    /// An image arrived and is being checked
    Verifying {
        /// 1-based attempt number
        attempt: usize,
        /// Conditioning the image was produced with
        adjustment: Adjustment,
        /// Post-processed image
        image: RasterImage,
    },
    /// The attempt failed with a retryable error
    Retrying {
        /// 1-based attempt number
        attempt: usize,
        /// Conditioning of the failed attempt
        adjustment: Adjustment,
        /// Why it failed
        error: QrArtError,
    },
    /// Terminal state
    Done(GenerationOutcome),
}

struct Candidate {
    image: RasterImage,
    comparison: Comparison,
    seed: u64,
    adjustment: Adjustment,
}

/// Drives a [`GenerationService`] until an image verifies or the budget is
/// spent
pub struct RetryPolicy<'a, S: GenerationService + ?Sized> {
    service: &'a S,
    verifier: Verifier,
    max_attempts: usize,
}

impl<'a, S: GenerationService + ?Sized> RetryPolicy<'a, S> {
    /// Policy with the given attempt budget (at least one attempt)
    pub fn new(service: &'a S, verifier: Verifier, max_attempts: usize) -> Self {
        Self {
            service,
            verifier,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Attempt budget
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Run the loop. Fails only when no attempt produced an image, or on a
    /// non-retryable error.
    pub fn run(
        &self,
        request: &GenerationRequest,
        expected: &QrMatrix,
    ) -> Result<GenerationOutcome> {
        let allowed = self.verifier.max_bit_errors;
        let mut best: Option<Candidate> = None;
        let mut state = AttemptState::Requesting {
            attempt: 1,
            adjustment: Adjustment::initial(request),
        };

        loop {
            state = match state {
                AttemptState::Requesting {
                    attempt,
                    adjustment,
                } => {
                    let seed = attempt_seed(request.seed, attempt);
                    debug!(
                        attempt,
                        seed,
                        control_weight = adjustment.control_weight,
                        strength = adjustment.strength,
                        service = self.service.name(),
                        "requesting image"
                    );
                    match self.service.generate(&adjustment.apply(request, seed)) {
                        Ok(mut image) => {
                            enhance_contrast(&mut image, adjustment.contrast);
                            AttemptState::Verifying {
                                attempt,
                                adjustment,
                                image,
                            }
                        }
                        Err(error) => AttemptState::Retrying {
                            attempt,
                            adjustment,
                            error,
                        },
                    }
                }
                AttemptState::Verifying {
                    attempt,
                    adjustment,
                    image,
                } => {
                    let seed = attempt_seed(request.seed, attempt);
                    match self.verifier.compare(&image, expected) {
                        Ok(comparison) if comparison.bit_errors <= allowed => {
                            let bit_errors = comparison.bit_errors;
                            info!(attempt, bit_errors, "generated image verified");
                            AttemptState::Done(GenerationOutcome {
                                image,
                                quality: Quality::Verified { bit_errors },
                                attempts: attempt,
                                seed,
                                adjustment,
                            })
                        }
                        Ok(comparison) => {
                            let error = QrArtError::VerificationFailed {
                                bit_errors: comparison.bit_errors,
                                total: comparison.total,
                            };
                            let closer = best
                                .as_ref()
                                .is_none_or(|b| comparison.bit_errors < b.comparison.bit_errors);
                            if closer {
                                best = Some(Candidate {
                                    image,
                                    comparison,
                                    seed,
                                    adjustment,
                                });
                            }
                            AttemptState::Retrying {
                                attempt,
                                adjustment,
                                error,
                            }
                        }
                        Err(error) => AttemptState::Retrying {
                            attempt,
                            adjustment,
                            error,
                        },
                    }
                }
                AttemptState::Retrying {
                    attempt,
                    adjustment,
                    error,
                } => {
                    if !error.is_retryable() {
                        return Err(error);
                    }
                    warn!(attempt, error = %error, "generation attempt failed");
                    if attempt < self.max_attempts {
                        AttemptState::Requesting {
                            attempt: attempt + 1,
                            adjustment: adjustment.escalated(),
                        }
                    } else {
                        match best.take() {
                            Some(candidate) => {
                                let Comparison {
                                    bit_errors,
                                    total,
                                    locator_found,
                                } = candidate.comparison;
                                warn!(
                                    bit_errors,
                                    total,
                                    locator_found,
                                    "returning unverified image"
                                );
                                AttemptState::Done(GenerationOutcome {
                                    image: candidate.image,
                                    quality: Quality::Degraded {
                                        bit_errors,
                                        total,
                                        locator_found,
                                    },
                                    attempts: attempt,
                                    seed: candidate.seed,
                                    adjustment: candidate.adjustment,
                                })
                            }
                            None => return Err(error),
                        }
                    }
                }
                AttemptState::Done(outcome) => return Ok(outcome),
            };
        }
    }
}

/// Seed for a 1-based attempt: the base seed first, then successors
pub fn attempt_seed(base: u64, attempt: usize) -> u64 {
    base.wrapping_add(attempt.saturating_sub(1) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::local::LocalGenerator;
    use crate::generation::service::GenerationConfig;
    use crate::models::ArtStyle;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
        image: RasterImage,
    }

    impl GenerationService for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn generate(&self, _request: &GenerationRequest) -> Result<RasterImage> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(QrArtError::GenerationService(format!("timeout #{call}")))
            } else {
                Ok(self.image.clone())
            }
        }
    }

    /// Keeps every request it receives and answers with flat grey
    #[derive(Default)]
    struct Recording {
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl GenerationService for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn generate(&self, request: &GenerationRequest) -> Result<RasterImage> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(RasterImage::filled(64, 64, [128, 128, 128]))
        }
    }

    fn small_request(matrix: &QrMatrix) -> GenerationRequest {
        let config = GenerationConfig {
            image_size: 64,
            ..GenerationConfig::default()
        };
        GenerationRequest::new(matrix, ArtStyle::Basic, &config, 100).unwrap()
    }

    #[test]
    fn test_attempt_seed() {
        assert_eq!(attempt_seed(100, 1), 100);
        assert_eq!(attempt_seed(100, 3), 102);
        assert_eq!(attempt_seed(u64::MAX, 2), 0);
    }

    #[test]
    fn test_service_errors_exhaust_budget() {
        let matrix = QrMatrix::from_fn(21, 21, |x, _| x % 2 == 0);
        let service = Flaky {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
            image: RasterImage::filled(1, 1, [0, 0, 0]),
        };
        let policy = RetryPolicy::new(&service, Verifier::default(), 5);
        let err = policy.run(&small_request(&matrix), &matrix).unwrap_err();
        assert!(matches!(err, QrArtError::GenerationService(_)));
        assert_eq!(service.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_unverifiable_image_is_degraded() {
        let matrix = QrMatrix::from_fn(21, 21, |x, _| x % 2 == 0);
        let service = Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
            image: RasterImage::filled(64, 64, [255, 255, 255]),
        };
        let policy = RetryPolicy::new(&service, Verifier::default(), 4);
        let outcome = policy.run(&small_request(&matrix), &matrix).unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.attempts, 4);
        // first image that arrived is kept: attempt 3
        assert_eq!(outcome.seed, 102);
        assert_eq!(
            outcome.quality,
            Quality::Degraded {
                bit_errors: 441,
                total: 441,
                locator_found: false
            }
        );
        assert_eq!(
            outcome.adjustment,
            Adjustment::initial(&small_request(&matrix))
                .escalated()
                .escalated()
        );
    }

    #[test]
    fn test_retries_escalate_conditioning() {
        let matrix = QrMatrix::from_fn(21, 21, |x, y| (x + y) % 3 == 0);
        let service = Recording::default();
        let outcome = RetryPolicy::new(&service, Verifier::default(), 4)
            .run(&small_request(&matrix), &matrix)
            .unwrap();
        assert!(!outcome.quality.is_verified());

        let requests = service.requests.lock().unwrap();
        let seeds: Vec<u64> = requests.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102, 103]);
        assert!((requests[0].control_weight - 0.75).abs() < 1e-6);
        assert!((requests[0].strength - 0.4).abs() < 1e-6);
        for pair in requests.windows(2) {
            assert!(pair[1].control_weight > pair[0].control_weight);
            assert!(pair[1].strength < pair[0].strength);
            assert_eq!(pair[1].prompt, pair[0].prompt);
        }
        assert!(requests[3].control_weight <= 1.0);
    }

    #[test]
    fn test_adjustment_is_bounded() {
        let matrix = QrMatrix::from_fn(21, 21, |_, _| false);
        let first = Adjustment::initial(&small_request(&matrix));
        assert!((first.contrast - 1.75).abs() < 1e-6);

        let last = (0..20).fold(first, |a, _| a.escalated());
        assert_eq!(last.control_weight, 1.0);
        assert_eq!(last.strength, 0.0);
        assert_eq!(last.contrast, MAX_CONTRAST);

        let request = last.apply(&small_request(&matrix), 9);
        assert_eq!((request.seed, request.control_weight, request.strength), (9, 1.0, 0.0));
    }

    #[test]
    fn test_budget_is_at_least_one() {
        let service = LocalGenerator::new();
        assert_eq!(RetryPolicy::new(&service, Verifier::default(), 0).max_attempts(), 1);
    }

    #[test]
    fn test_verifier_flags_missing_anchors() {
        let matrix = QrMatrix::from_fn(21, 21, |_, _| true);
        let blank = RasterImage::filled(50, 50, [255, 255, 255]);
        let comparison = Verifier::default().compare(&blank, &matrix).unwrap();
        assert_eq!(
            comparison,
            Comparison {
                bit_errors: 441,
                total: 441,
                locator_found: false
            }
        );
    }

    #[test]
    fn test_verifier_counts_missing_grid_as_total() {
        let matrix = QrMatrix::from_fn(21, 21, |_, _| true);
        let verifier = Verifier {
            max_bit_errors: 441,
            ..Verifier::default()
        };
        let blank = RasterImage::filled(50, 50, [255, 255, 255]);
        assert_eq!(verifier.verify(&blank, &matrix).unwrap(), 441);
        let strict = Verifier::default();
        assert!(matches!(
            strict.verify(&blank, &matrix),
            Err(QrArtError::VerificationFailed {
                bit_errors: 441,
                total: 441
            })
        ));
    }
}
