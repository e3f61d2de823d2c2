//! File helpers shared by the command-line tools, benches and tests.
use crate::error::Result;
use crate::models::{BitMatrix, RasterImage};
use image::GenericImageView;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn max_dim_from_env() -> Option<u32> {
    match env::var("QR_ART_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image file as RGBA, downscaled when `QR_ART_MAX_DIM` is set and
/// smaller than the longer side.
pub fn load_raster<P: AsRef<Path>>(path: P) -> Result<RasterImage> {
    let img = image::open(path.as_ref())?;
    let (orig_w, orig_h) = img.dimensions();
    let img = match max_dim_from_env() {
        Some(max_dim) if orig_w.max(orig_h) > max_dim => {
            img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
        }
        _ => img,
    };
    debug!(
        path = %path.as_ref().display(),
        width = img.width(),
        height = img.height(),
        "image loaded"
    );
    Ok(RasterImage::from(img.to_rgba8()))
}

/// Encode as PNG and write to `path`
pub fn save_png<P: AsRef<Path>>(image: &RasterImage, path: P) -> Result<()> {
    let bytes = image.to_png()?;
    fs::write(path.as_ref(), bytes)?;
    debug!(path = %path.as_ref().display(), "png written");
    Ok(())
}

/// Summary statistics for grayscale data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrayStats {
    /// Minimum grayscale value.
    pub min: u8,
    /// Maximum grayscale value.
    pub max: u8,
    /// Average grayscale value.
    pub avg: u8,
}

/// Summary statistics for a binary matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryStats {
    /// Count of dark pixels.
    pub dark_pixels: usize,
    /// Total pixels in the matrix.
    pub total_pixels: usize,
    /// Ratio of dark pixels to total pixels.
    pub dark_ratio: f64,
}

/// Compute min/max/avg for grayscale values.
pub fn grayscale_stats(gray: &[u8]) -> GrayStats {
    if gray.is_empty() {
        return GrayStats {
            min: 0,
            max: 0,
            avg: 0,
        };
    }
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    for &v in gray {
        min = min.min(v);
        max = max.max(v);
        sum += v as u64;
    }
    GrayStats {
        min,
        max,
        avg: (sum / gray.len() as u64) as u8,
    }
}

/// Compute dark pixel stats for a binary matrix.
pub fn binary_stats(binary: &BitMatrix) -> BinaryStats {
    let dark = binary.count_dark();
    let total = binary.width() * binary.height();
    let ratio = if total == 0 {
        0.0
    } else {
        dark as f64 / total as f64
    };
    BinaryStats {
        dark_pixels: dark,
        total_pixels: total,
        dark_ratio: ratio,
    }
}

/// Image files under `root`, recursively, sorted by path
pub fn collect_images<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut stack = vec![root.as_ref().to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "bmp") {
                    images.push(path);
                }
            }
        }
    }

    images.sort();
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let image = RasterImage::from_fn(5, 3, |x, y| [x as u8 * 40, y as u8 * 60, 9]);
        save_png(&image, &path).unwrap();
        assert_eq!(load_raster(&path).unwrap(), image);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_raster(dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn test_collect_images_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.PNG"), b"x").unwrap();
        fs::write(dir.path().join("nested/a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let found = collect_images(dir.path());
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().is_some_and(|e| e != "txt")));
    }

    #[test]
    fn test_stats() {
        assert_eq!(
            grayscale_stats(&[10, 20, 30]),
            GrayStats {
                min: 10,
                max: 30,
                avg: 20
            }
        );
        let matrix = BitMatrix::from_fn(2, 2, |x, _| x == 0);
        let stats = binary_stats(&matrix);
        assert_eq!(stats.dark_pixels, 2);
        assert_eq!(stats.dark_ratio, 0.5);
    }
}
