//! End-to-end matrix recovery on synthetic codes

mod common;

use common::{finders_only, render, synthetic_matrix};
use qr_art::pipeline::extract_from_bytes;
use qr_art::{
    ModuleSizeRule, PipelineConfig, QrArtError, RasterImage, extract_batch, extract_matrix,
};

#[test]
fn test_round_trip_has_no_bit_errors() {
    for (n, seed, module) in [(21, 1, 8), (25, 4, 8), (25, 4, 12), (29, 4, 8), (33, 9, 8)] {
        let matrix = synthetic_matrix(n, seed);
        let extraction = extract_matrix(&render(&matrix, module), &PipelineConfig::default())
            .unwrap_or_else(|e| panic!("{n} modules at {module} px: {e}"));
        assert_eq!(extraction.grid.module_count, n);
        assert_eq!(extraction.grid.module_size, module as f32);
        assert_eq!(
            extraction.matrix.hamming_distance(&matrix),
            0,
            "{n} modules at {module} px"
        );
    }
}

#[test]
fn test_round_trip_through_png() {
    let matrix = synthetic_matrix(25, 7);
    let png = render(&matrix, 8).to_png().unwrap();
    let extraction = extract_from_bytes(&png, &PipelineConfig::default()).unwrap();
    assert_eq!(extraction.matrix, matrix);
    assert!(extraction.threshold > 0 && extraction.threshold < 255);
}

#[test]
fn test_photo_preset_still_recovers_clean_codes() {
    let matrix = synthetic_matrix(25, 4);
    let extraction = extract_matrix(&render(&matrix, 12), &PipelineConfig::photo()).unwrap();
    assert_eq!(extraction.matrix, matrix);
}

#[test]
fn test_reference_scenario_grid() {
    let image = finders_only(512, 512, &[(20, 20), (20, 450), (450, 20)], 30);
    let extraction = extract_matrix(&image, &PipelineConfig::default()).unwrap();

    let expected_module = 30.0 / 7.0;
    assert!((extraction.grid.module_size - expected_module).abs() < expected_module * 0.1);
    assert!(extraction.grid.module_count.abs_diff(119) <= 12);
    assert!((1..=40).contains(&extraction.grid.version));
    assert!(extraction.grid.roles_identified);
    assert_eq!(extraction.anchors.len(), 3);
}

#[test]
fn test_anchor_spacing_rule_on_synthetic_code() {
    // Version 1 finder centres are exactly 14 modules apart
    let matrix = synthetic_matrix(21, 1);
    let config = PipelineConfig {
        module_rule: ModuleSizeRule::AnchorSpacing,
        ..PipelineConfig::default()
    };
    let extraction = extract_matrix(&render(&matrix, 10), &config).unwrap();
    assert!((extraction.grid.module_size - 10.0).abs() < 1e-3);
    assert_eq!(extraction.grid.version, 1);
}

#[test]
fn test_blank_image_has_no_locator() {
    let blank = RasterImage::filled(100, 100, [255, 255, 255]);
    let err = extract_matrix(&blank, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, QrArtError::LocatorNotFound { found: 0 }));
    assert!(!err.is_retryable());
}

#[test]
fn test_two_finders_are_not_enough() {
    let image = finders_only(300, 300, &[(10, 10), (200, 10)], 70);
    let err = extract_matrix(&image, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, QrArtError::LocatorNotFound { found: 2 }));
}

#[test]
fn test_batch_matches_sequential() {
    let images: Vec<RasterImage> = (0..4)
        .map(|seed| render(&synthetic_matrix(25, seed + 1), 8))
        .chain(std::iter::once(RasterImage::filled(64, 64, [255, 255, 255])))
        .collect();
    let config = PipelineConfig::default();
    let batch = extract_batch(&images, &config);
    assert_eq!(batch.len(), images.len());
    for (image, result) in images.iter().zip(&batch) {
        match (extract_matrix(image, &config), result) {
            (Ok(a), Ok(b)) => assert_eq!(a.matrix, b.matrix),
            (Err(_), Err(_)) => {}
            (a, b) => panic!("batch disagrees: {a:?} vs {b:?}"),
        }
    }
    assert!(batch[4].is_err());
}
