use crate::models::{BitMatrix, GrayImage};

/// Binary bitmap plus the threshold that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binarized {
    /// `true` = dark (gray < threshold)
    pub matrix: BitMatrix,
    /// Global threshold
    pub threshold: u8,
}

/// 256-bin intensity histogram
pub fn histogram(gray: &[u8]) -> [u32; 256] {
    let mut histogram = [0u32; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }
    histogram
}

/// Otsu's optimal threshold.
///
/// For each `t`, intensities below `t` form the background class and the rest
/// the foreground; the `t` with the largest between-class variance wins.
/// A histogram with a single populated bin yields 0.
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    let histogram = histogram(gray);
    let total = gray.len() as f64;
    if total == 0.0 {
        return 0;
    }
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut weight_b = 0f64;
    let mut sum_b = 0f64;
    let mut max_variance = 0.0;
    let mut optimal_threshold = 0u8;

    for threshold in 0..=255usize {
        if threshold > 0 {
            let count = histogram[threshold - 1] as f64;
            weight_b += count;
            sum_b += (threshold - 1) as f64 * count;
        }
        if weight_b == 0.0 {
            continue;
        }
        let weight_f = total - weight_b;
        if weight_f == 0.0 {
            break;
        }

        let mean_b = sum_b / weight_b;
        let mean_f = (sum_all - sum_b) / weight_f;
        let variance = (weight_b / total) * (weight_f / total) * (mean_b - mean_f).powi(2);

        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = threshold as u8;
        }
    }

    optimal_threshold
}

/// Convert grayscale image to binary using Otsu's thresholding method
/// Returns a BitMatrix where true = black, false = white
pub fn otsu_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    threshold_binarize(gray, width, height, otsu_threshold(gray))
}

/// Simple global threshold binarization: dark iff `gray < threshold`
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    BitMatrix::from_fn(width, height, |x, y| gray[y * width + x] < threshold)
}

/// Otsu-binarize a luminance image, keeping the chosen threshold
pub fn binarize(gray: &GrayImage) -> Binarized {
    let threshold = otsu_threshold(&gray.data);
    Binarized {
        matrix: threshold_binarize(&gray.data, gray.width, gray.height, threshold),
        threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otsu_bimodal() {
        let mut gray = vec![30u8; 500];
        gray.extend(vec![220u8; 500]);
        let t = otsu_threshold(&gray);
        assert!(t > 30 && t <= 220, "threshold {t}");

        let binary = otsu_binarize(&gray, 100, 10);
        assert_eq!(binary.count_dark(), 500);
    }

    #[test]
    fn test_otsu_pure_black_white() {
        let gray: Vec<u8> = (0..64).map(|i| if i % 3 == 0 { 0 } else { 255 }).collect();
        assert_eq!(otsu_threshold(&gray), 1);
    }

    #[test]
    fn test_otsu_degenerate() {
        assert_eq!(otsu_threshold(&[255u8; 100]), 0);
        assert_eq!(otsu_threshold(&[77u8; 10]), 0);
        assert_eq!(otsu_threshold(&[]), 0);

        let binary = otsu_binarize(&[255u8; 100], 10, 10);
        assert_eq!(binary.count_dark(), 0);
    }

    #[test]
    fn test_otsu_idempotent() {
        let gray: Vec<u8> = (0..4096u32).map(|i| ((i * 7919) % 251) as u8).collect();
        let first = otsu_threshold(&gray);
        assert_eq!(otsu_threshold(&gray), first);
    }

    #[test]
    fn test_threshold_binarize() {
        let gray = vec![0, 127, 128, 255];
        let binary = threshold_binarize(&gray, 2, 2, 128);
        assert!(binary.get(0, 0));
        assert!(binary.get(1, 0));
        assert!(!binary.get(0, 1));
        assert!(!binary.get(1, 1));
    }

    #[test]
    fn test_binarize_keeps_threshold() {
        let gray = GrayImage::new(2, 1, vec![10, 240]).unwrap();
        let result = binarize(&gray);
        assert!(result.threshold > 10 && result.threshold <= 240);
        assert!(result.matrix.get(0, 0));
        assert!(!result.matrix.get(1, 0));
    }
}
