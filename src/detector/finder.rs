/// Finder pattern detection: 1:1:3:1:1 ring scanning with a vertical
/// cross-check, or the dark-density window heuristic
use crate::config::{LocatorConfig, LocatorStrategy};
use crate::models::{BitMatrix, FinderCandidate};
use tracing::{debug, trace};

/// Finder candidate accumulated over several scan rows
#[derive(Debug, Clone, Copy)]
struct RingHit {
    x: f32,
    y: f32,
    size: f32,
    hits: usize,
}

/// Locator-pattern detector over a binary bitmap
pub struct FinderDetector;

impl FinderDetector {
    /// Propose candidates and keep at most three mutually separated ones
    pub fn detect(matrix: &BitMatrix, config: &LocatorConfig) -> Vec<FinderCandidate> {
        let candidates = Self::propose(matrix, config);
        let separation = config.separation_for(matrix.width(), matrix.height());
        let anchors = select_anchors(&candidates, separation);
        debug!(
            raw = candidates.len(),
            kept = anchors.len(),
            separation,
            "finder candidates filtered"
        );
        anchors
    }

    /// Raw candidates in preference order, before separation filtering
    pub fn propose(matrix: &BitMatrix, config: &LocatorConfig) -> Vec<FinderCandidate> {
        match config.strategy {
            LocatorStrategy::DensityBand => Self::density_candidates(matrix, config),
            LocatorStrategy::RingVerified => Self::ring_candidates(matrix, config),
        }
    }

    /// Windows whose dark fraction falls strictly inside the band, in scan order
    fn density_candidates(matrix: &BitMatrix, config: &LocatorConfig) -> Vec<FinderCandidate> {
        let patch = config.patch_size.max(1);
        let stride = config.stride.max(1);
        let (low, high) = config.density_band;
        let area = (patch * patch) as f32;
        let mut candidates = Vec::new();

        if matrix.width() < patch || matrix.height() < patch {
            return candidates;
        }

        for y in (0..=matrix.height() - patch).step_by(stride) {
            for x in (0..=matrix.width() - patch).step_by(stride) {
                let mut dark = 0usize;
                for wy in y..y + patch {
                    for wx in x..x + patch {
                        if matrix.get(wx, wy) {
                            dark += 1;
                        }
                    }
                }
                let density = dark as f32 / area;
                if density > low && density < high {
                    let half = patch as f32 / 2.0;
                    candidates.push(FinderCandidate::new(
                        x as f32 + half,
                        y as f32 + half,
                        patch as f32,
                    ));
                }
            }
        }

        candidates
    }

    /// Ring-verified candidates, most frequently hit first
    fn ring_candidates(matrix: &BitMatrix, config: &LocatorConfig) -> Vec<FinderCandidate> {
        let tolerance = config.ring_tolerance;
        let mut hits = Vec::new();

        for y in (0..matrix.height()).step_by(config.stride.max(1)) {
            for (row_x, _) in Self::scan_row(matrix, y, tolerance) {
                let Some((center_y, height)) =
                    Self::cross_check(matrix, row_x, y as f32, Axis::Vertical, tolerance)
                else {
                    continue;
                };
                let Some((center_x, width)) =
                    Self::cross_check(matrix, row_x, center_y, Axis::Horizontal, tolerance)
                else {
                    continue;
                };
                trace!(center_x, center_y, width, height, "ring hit");
                hits.push(RingHit {
                    x: center_x,
                    y: center_y,
                    size: (width + height) / 2.0,
                    hits: 1,
                });
            }
        }

        let mut merged = Self::merge_candidates(hits);
        merged.sort_by(|a, b| b.hits.cmp(&a.hits));
        merged
            .into_iter()
            .map(|h| FinderCandidate::new(h.x, h.y, h.size))
            .collect()
    }

    /// Centre x and pixel width of every 1:1:3:1:1 run sequence on row `y`
    fn scan_row(matrix: &BitMatrix, y: usize, tolerance: f32) -> Vec<(f32, f32)> {
        let width = matrix.width();
        let mut found = Vec::new();
        if width == 0 {
            return found;
        }

        let mut run_lengths: Vec<usize> = Vec::new();
        let mut run_colors: Vec<bool> = Vec::new();
        let mut run_start = 0usize;
        let mut current_color = matrix.get(0, y);

        // x == width flushes the final run so patterns touching the border count
        for x in 1..=width {
            let color = x < width && matrix.get(x, y);
            if x < width && color == current_color {
                continue;
            }

            run_lengths.push(x - run_start);
            run_colors.push(current_color);
            run_start = x;
            current_color = color;

            let n = run_colors.len();
            if n < 5 {
                continue;
            }
            let colors = &run_colors[n - 5..];
            let lengths = &run_lengths[n - 5..];

            // Pattern should be: black-white-black-white-black
            if colors[0]
                && !colors[1]
                && colors[2]
                && !colors[3]
                && colors[4]
                && Self::quick_ratio_check(lengths)
                && Self::check_pattern(lengths, tolerance).is_some()
            {
                let total: usize = lengths.iter().sum();
                let center_x =
                    x as f32 - (lengths[4] + lengths[3]) as f32 - lengths[2] as f32 / 2.0;
                found.push((center_x, total as f32));
            }
        }

        found
    }

    /// Quick ratio validation - rough check before floating-point math
    fn quick_ratio_check(lengths: &[usize]) -> bool {
        let b1 = lengths[0];
        let w1 = lengths[1];
        let b2 = lengths[2];
        let w2 = lengths[3];
        let b3 = lengths[4];

        // One pixel per module at the very least
        if b1 + w1 + b2 + w2 + b3 < 7 {
            return false;
        }

        // Centre black should be roughly 3x the outer blacks
        let outer_min = b1.min(b3);
        if b2 < outer_min * 2 || b2 > b1.max(b3) * 5 {
            return false;
        }

        let outer_avg = (b1 + b3 + w1 + w2) as f32 / 4.0;
        let white_ok = |w: usize| (w as f32) >= outer_avg / 2.0 && (w as f32) <= outer_avg * 2.0;
        white_ok(w1) && white_ok(w2)
    }

    /// Module size when every run is within `tolerance` modules of 1:1:3:1:1
    fn check_pattern(lengths: &[usize], tolerance: f32) -> Option<f32> {
        if lengths.len() != 5 {
            return None;
        }

        let total: usize = lengths.iter().sum();
        let unit = total as f32 / 7.0;
        let expected = [1.0, 1.0, 3.0, 1.0, 1.0];

        lengths
            .iter()
            .zip(expected)
            .all(|(&len, e)| (len as f32 / unit - e).abs() <= tolerance)
            .then_some(unit)
    }

    /// Walk outward from (x, y) along `axis`, rebuilding the five runs around
    /// the centre. Returns the re-centred coordinate on that axis and the
    /// total pattern extent.
    fn cross_check(
        matrix: &BitMatrix,
        x: f32,
        y: f32,
        axis: Axis,
        tolerance: f32,
    ) -> Option<(f32, f32)> {
        let cx = x.round() as isize;
        let cy = y.round() as isize;
        let (origin, limit) = match axis {
            Axis::Horizontal => (cx, matrix.width() as isize),
            Axis::Vertical => (cy, matrix.height() as isize),
        };
        let at = |pos: isize| -> Option<bool> {
            if pos < 0 || pos >= limit {
                return None;
            }
            Some(match axis {
                Axis::Horizontal => matrix.get_signed(pos, cy),
                Axis::Vertical => matrix.get_signed(cx, pos),
            })
        };

        if at(origin) != Some(true) {
            return None;
        }

        // [outer dark, light, centre half] in each direction
        let walk = |step: isize| -> [usize; 3] {
            let mut counts = [0usize; 3];
            let mut pos = origin;
            for (slot, color) in [(2, true), (1, false), (0, true)] {
                while at(pos) == Some(color) {
                    counts[slot] += 1;
                    pos += step;
                }
            }
            counts
        };

        let back = walk(-1);
        let fwd = walk(1);
        if back[1] == 0 || fwd[1] == 0 || back[0] == 0 || fwd[0] == 0 {
            return None;
        }

        // Origin is counted in both directions
        let centre_run = back[2] + fwd[2] - 1;
        let lengths = [back[0], back[1], centre_run, fwd[1], fwd[0]];
        Self::check_pattern(&lengths, tolerance)?;

        let centre_start = origin - (back[2] as isize - 1);
        let centre = centre_start as f32 + centre_run as f32 / 2.0;
        let total: usize = lengths.iter().sum();
        Some((centre, total as f32))
    }

    /// Fold hits closer than half a pattern into one running average
    fn merge_candidates(candidates: Vec<RingHit>) -> Vec<RingHit> {
        let mut merged: Vec<RingHit> = Vec::new();

        for candidate in candidates {
            let existing = merged.iter_mut().find(|existing| {
                let dx = candidate.x - existing.x;
                let dy = candidate.y - existing.y;
                let reach = existing.size.max(candidate.size) / 2.0;
                dx * dx + dy * dy < reach * reach
            });

            match existing {
                Some(existing) => {
                    let n = existing.hits as f32;
                    existing.x = (existing.x * n + candidate.x) / (n + 1.0);
                    existing.y = (existing.y * n + candidate.y) / (n + 1.0);
                    existing.size = (existing.size * n + candidate.size) / (n + 1.0);
                    existing.hits += 1;
                }
                None => merged.push(candidate),
            }
        }

        merged
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Greedy anti-clustering: walk candidates in order, keeping one only if it
/// is at least `min_separation` from every kept one; stop at three.
pub fn select_anchors(candidates: &[FinderCandidate], min_separation: f32) -> Vec<FinderCandidate> {
    let mut kept: Vec<FinderCandidate> = Vec::with_capacity(3);
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| k.center.distance(&candidate.center) >= min_separation)
        {
            kept.push(*candidate);
            if kept.len() == 3 {
                break;
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Draw a 7-module finder with its top-left corner at (x0, y0)
    fn draw_finder(matrix: &mut BitMatrix, x0: usize, y0: usize, unit: usize) {
        for my in 0..7 {
            for mx in 0..7 {
                let ring = mx.min(my).min(6 - mx).min(6 - my);
                if ring != 1 {
                    for py in 0..unit {
                        for px in 0..unit {
                            matrix.set(x0 + mx * unit + px, y0 + my * unit + py, true);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_simple_line_pattern() {
        let mut matrix = BitMatrix::new(25, 1);
        let unit = 3;
        let x_start = 2;

        // Black(3) - White(3) - Black(9) - White(3) - Black(3)
        for x in x_start..x_start + unit {
            matrix.set(x, 0, true);
        }
        for x in x_start + 2 * unit..x_start + 5 * unit {
            matrix.set(x, 0, true);
        }
        for x in x_start + 6 * unit..x_start + 7 * unit {
            matrix.set(x, 0, true);
        }

        let found = FinderDetector::scan_row(&matrix, 0, 0.5);
        assert_eq!(found.len(), 1);
        let expected_center = x_start as f32 + 3.5 * unit as f32;
        assert!((found[0].0 - expected_center).abs() < 1.0);
        assert_eq!(found[0].1, 21.0);
    }

    #[test]
    fn test_row_pattern_touching_border() {
        let mut matrix = BitMatrix::new(14, 1);
        for x in [0, 1, 4, 5, 6, 7, 8, 9, 12, 13] {
            matrix.set(x, 0, true);
        }
        assert_eq!(FinderDetector::scan_row(&matrix, 0, 0.5).len(), 1);
    }

    #[test]
    fn test_quick_ratio_check() {
        assert!(FinderDetector::quick_ratio_check(&[3, 3, 9, 3, 3]));
        assert!(FinderDetector::quick_ratio_check(&[1, 1, 3, 1, 1]));
        assert!(!FinderDetector::quick_ratio_check(&[3, 3, 5, 3, 3]));
        assert!(!FinderDetector::quick_ratio_check(&[1, 1, 1, 1, 1]));
    }

    #[test]
    fn test_check_pattern() {
        assert_eq!(FinderDetector::check_pattern(&[4, 4, 12, 4, 4], 0.5), Some(4.0));
        assert!(FinderDetector::check_pattern(&[5, 4, 13, 4, 4], 0.5).is_some());
        assert!(FinderDetector::check_pattern(&[8, 4, 12, 4, 4], 0.5).is_none());
    }

    #[test]
    fn test_detects_three_finders() {
        let mut matrix = BitMatrix::new(200, 200);
        draw_finder(&mut matrix, 10, 10, 5);
        draw_finder(&mut matrix, 155, 10, 5);
        draw_finder(&mut matrix, 10, 155, 5);

        let anchors = FinderDetector::detect(&matrix, &LocatorConfig::default());
        assert_eq!(anchors.len(), 3);
        for expected in [(27.5, 27.5), (172.5, 27.5), (27.5, 172.5)] {
            assert!(
                anchors.iter().any(|a| (a.center.x - expected.0).abs() < 2.0
                    && (a.center.y - expected.1).abs() < 2.0),
                "missing anchor near {expected:?}: {anchors:?}"
            );
        }
        assert!(anchors.iter().all(|a| (a.size - 35.0).abs() < 2.0));
    }

    #[test]
    fn test_rejects_plain_bars() {
        // Vertical stripes pass the row check but fail the cross-check
        let matrix = BitMatrix::from_fn(70, 70, |x, _| {
            let m = (x / 10) % 7;
            m != 1 && m != 5
        });
        assert!(FinderDetector::propose(&matrix, &LocatorConfig::default()).is_empty());
    }

    #[test]
    fn test_density_band_on_blank_and_checkerboard() {
        let config = LocatorConfig {
            strategy: LocatorStrategy::DensityBand,
            ..LocatorConfig::default()
        };
        let blank = BitMatrix::new(100, 100);
        assert!(FinderDetector::propose(&blank, &config).is_empty());

        let checker = BitMatrix::from_fn(40, 40, |x, y| (x + y) % 2 == 0);
        let candidates = FinderDetector::propose(&checker, &config);
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| c.size == 7.0));
    }

    #[test]
    fn test_select_anchors_separation() {
        let candidates = vec![
            FinderCandidate::new(0.0, 0.0, 7.0),
            FinderCandidate::new(10.0, 0.0, 7.0),
            FinderCandidate::new(60.0, 0.0, 7.0),
            FinderCandidate::new(60.0, 30.0, 7.0),
            FinderCandidate::new(0.0, 60.0, 7.0),
            FinderCandidate::new(90.0, 90.0, 7.0),
        ];
        let kept = select_anchors(&candidates, 50.0);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[1].center.x, 60.0);
        assert_eq!(kept[2].center.y, 60.0);
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                assert!(a.center.distance(&b.center) >= 50.0);
            }
        }
    }
}
