use thiserror::Error;

/// Errors surfaced by the recovery and rendering pipeline.
///
/// Numeric noise inside a stage (zero module size, samples that fall outside
/// the image) is clamped where it happens and never shows up here.
#[derive(Error, Debug)]
pub enum QrArtError {
    /// Input bytes are not a decodable raster image
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Fewer than three finder patterns survived filtering
    #[error("Locator patterns not found: {found} of 3 candidates")]
    LocatorNotFound {
        /// Number of candidates that survived filtering
        found: usize,
    },

    /// The generative-image boundary failed or returned malformed data
    #[error("Generation service error: {0}")]
    GenerationService(String),

    /// A rendered result did not re-extract to the expected matrix
    #[error("Verification failed: {bit_errors} of {total} modules differ")]
    VerificationFailed {
        /// Modules whose recovered value differs
        bit_errors: usize,
        /// Modules compared
        total: usize,
    },

    /// Pixel buffer length does not match the declared dimensions
    #[error("Invalid image dimensions: width={width}, height={height}")]
    InvalidDimensions {
        /// Declared width
        width: usize,
        /// Declared height
        height: usize,
    },

    /// A session operation was requested in a state that does not allow it
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        /// State the session was in
        state: &'static str,
        /// Operation that was refused
        action: &'static str,
    },

    /// Encoding an output raster failed
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// Filesystem failure while loading or saving
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QrArtError {
    /// Whether a bounded retry may recover from this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QrArtError::GenerationService(_) | QrArtError::VerificationFailed { .. }
        )
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, QrArtError>;
