//! Raster to module matrix: grayscale, optional blur, Otsu threshold, finder
//! detection, grid fitting and sampling, run in order on the calling thread.

use crate::config::PipelineConfig;
use crate::detector::{FinderDetector, GridFitter, extract};
use crate::error::{QrArtError, Result};
use crate::models::{BitMatrix, FinderCandidate, GridInfo, QrMatrix, RasterImage};
use crate::utils::{binarize, gaussian_blur, to_gray_image};
use rayon::prelude::*;
use tracing::{debug, debug_span, warn};

/// Everything the recovery stages produced for one image
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Binary bitmap the anchors and modules were read from
    pub binary: BitMatrix,
    /// Otsu threshold used for `binary`
    pub threshold: u8,
    /// The three retained finder anchors
    pub anchors: Vec<FinderCandidate>,
    /// Fitted grid geometry
    pub grid: GridInfo,
    /// Recovered module matrix
    pub matrix: QrMatrix,
}

/// Recover the module matrix of `image`.
///
/// Fails with [`QrArtError::LocatorNotFound`] when fewer than three finder
/// anchors survive filtering.
pub fn extract_matrix(image: &RasterImage, config: &PipelineConfig) -> Result<Extraction> {
    let _span = debug_span!("extract", width = image.width(), height = image.height()).entered();

    let mut gray = to_gray_image(image);
    if let Some(sigma) = config.blur_sigma {
        gray = gaussian_blur(&gray, sigma);
    }

    let binarized = binarize(&gray);
    debug!(threshold = binarized.threshold, "binarized");

    let anchors = FinderDetector::detect(&binarized.matrix, &config.locator);
    if anchors.len() < 3 {
        warn!(found = anchors.len(), "not enough finder anchors");
        return Err(QrArtError::LocatorNotFound {
            found: anchors.len(),
        });
    }

    let grid = GridFitter::fit(&anchors, image.width(), image.height(), config.module_rule);
    let matrix = extract(&binarized.matrix, &grid);
    debug!(
        modules = matrix.size(),
        dark = matrix.count_dark(),
        "matrix extracted"
    );

    Ok(Extraction {
        binary: binarized.matrix,
        threshold: binarized.threshold,
        anchors: grid.anchors.clone(),
        grid,
        matrix,
    })
}

/// Decode image bytes and recover their module matrix
pub fn extract_from_bytes(bytes: &[u8], config: &PipelineConfig) -> Result<Extraction> {
    let image = RasterImage::decode(bytes)?;
    extract_matrix(&image, config)
}

/// Run [`extract_matrix`] over independent images in parallel. Results keep
/// the input order.
pub fn extract_batch(images: &[RasterImage], config: &PipelineConfig) -> Vec<Result<Extraction>> {
    images
        .par_iter()
        .map(|image| extract_matrix(image, config))
        .collect()
}
