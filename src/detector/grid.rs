/// Module grid fitting from the three finder anchors
use crate::config::{
    FINDER_MODULES, FINDER_SPACING_MODULES, MIN_MODULE_SIZE, ModuleSizeRule, VERSION_TOLERANCE,
};
use crate::models::grid::{MAX_VERSION, MIN_VERSION};
use crate::models::{FinderCandidate, GridInfo, version_size};
use tracing::debug;

/// Derives the module grid geometry from anchors
pub struct GridFitter;

impl GridFitter {
    /// Derive module size, module count and version for an image of the
    /// given size
    pub fn fit(
        anchors: &[FinderCandidate],
        width: usize,
        height: usize,
        rule: ModuleSizeRule,
    ) -> GridInfo {
        let ordered = Self::order_roles(anchors, width, height);
        let roles_identified = ordered.is_some();
        let anchors = ordered.map(Vec::from).unwrap_or_else(|| anchors.to_vec());

        let module_size = Self::module_size(&anchors, roles_identified, rule);
        let module_count = Self::module_count(width, height, module_size);
        let version = Self::estimate_version(module_count);

        debug!(
            module_size,
            module_count, version, roles_identified, "grid fitted"
        );

        GridInfo {
            module_size,
            module_count,
            version,
            anchors,
            roles_identified,
        }
    }

    /// Order three anchors as [top-left, top-right, bottom-left] when each
    /// sits in its own quadrant relative to the image centre
    pub fn order_roles(
        anchors: &[FinderCandidate],
        width: usize,
        height: usize,
    ) -> Option<[FinderCandidate; 3]> {
        if anchors.len() != 3 {
            return None;
        }
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        let find = |left: bool, top: bool| {
            let mut matching = anchors
                .iter()
                .filter(|a| (a.center.x < cx) == left && (a.center.y < cy) == top);
            let first = matching.next().copied();
            match matching.next() {
                Some(_) => None,
                None => first,
            }
        };

        Some([find(true, true)?, find(false, true)?, find(true, false)?])
    }

    /// Pixels per module under `rule`, clamped to [`MIN_MODULE_SIZE`]
    pub fn module_size(
        anchors: &[FinderCandidate],
        roles_identified: bool,
        rule: ModuleSizeRule,
    ) -> f32 {
        let raw = match rule {
            ModuleSizeRule::FinderWidth => {
                if anchors.is_empty() {
                    0.0
                } else {
                    let mean = anchors.iter().map(|a| a.size).sum::<f32>() / anchors.len() as f32;
                    mean / FINDER_MODULES
                }
            }
            ModuleSizeRule::AnchorSpacing => {
                Self::anchor_spacing(anchors, roles_identified) / FINDER_SPACING_MODULES
            }
        };

        if raw.is_finite() {
            raw.max(MIN_MODULE_SIZE)
        } else {
            MIN_MODULE_SIZE
        }
    }

    fn anchor_spacing(anchors: &[FinderCandidate], roles_identified: bool) -> f32 {
        if roles_identified && anchors.len() == 3 {
            let horizontal = (anchors[1].center.x - anchors[0].center.x).abs();
            let vertical = (anchors[2].center.y - anchors[0].center.y).abs();
            return (horizontal + vertical) / 2.0;
        }

        let mut total = 0.0;
        let mut pairs = 0;
        for (i, a) in anchors.iter().enumerate() {
            for b in &anchors[i + 1..] {
                total += a.center.distance(&b.center);
                pairs += 1;
            }
        }
        if pairs == 0 { 0.0 } else { total / pairs as f32 }
    }

    /// Modules per side assuming the code spans the shorter image side
    pub fn module_count(width: usize, height: usize, module_size: f32) -> usize {
        let side = width.min(height) as f32;
        let count = (side / module_size.max(f32::EPSILON)).round();
        (count as usize).max(1)
    }

    /// Closest version whose side is within tolerance of `module_count`,
    /// otherwise the formula estimate clamped to 1..=40
    pub fn estimate_version(module_count: usize) -> u8 {
        let mut best: Option<(u8, usize)> = None;
        for v in MIN_VERSION..=MAX_VERSION {
            let diff = version_size(v).abs_diff(module_count);
            if diff <= VERSION_TOLERANCE && best.is_none_or(|(_, d)| diff < d) {
                best = Some((v, diff));
            }
        }
        if let Some((v, _)) = best {
            return v;
        }

        let estimate = ((module_count as f32 - 17.0) / 4.0).round();
        estimate.clamp(MIN_VERSION as f32, MAX_VERSION as f32) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_anchors() -> Vec<FinderCandidate> {
        vec![
            FinderCandidate::new(35.0, 35.0, 30.0),
            FinderCandidate::new(35.0, 465.0, 30.0),
            FinderCandidate::new(465.0, 35.0, 30.0),
        ]
    }

    #[test]
    fn test_order_roles() {
        let ordered = GridFitter::order_roles(&scenario_anchors(), 512, 512).unwrap();
        assert_eq!(ordered[0].center.x, 35.0);
        assert_eq!(ordered[1].center.x, 465.0);
        assert_eq!(ordered[2].center.y, 465.0);

        let same_side = vec![
            FinderCandidate::new(10.0, 10.0, 7.0),
            FinderCandidate::new(20.0, 10.0, 7.0),
            FinderCandidate::new(10.0, 90.0, 7.0),
        ];
        assert!(GridFitter::order_roles(&same_side, 100, 100).is_none());
    }

    #[test]
    fn test_fit_scenario() {
        let grid = GridFitter::fit(&scenario_anchors(), 512, 512, ModuleSizeRule::FinderWidth);
        assert!((grid.module_size - 30.0 / 7.0).abs() < 1e-4);
        assert_eq!(grid.module_count, 119);
        assert_eq!(grid.version, 25);
        assert!(grid.roles_identified);
    }

    #[test]
    fn test_anchor_spacing_rule() {
        // 25 modules at 8 px: finder centres 18 modules apart
        let anchors = vec![
            FinderCandidate::new(28.0, 28.0, 56.0),
            FinderCandidate::new(172.0, 28.0, 56.0),
            FinderCandidate::new(28.0, 172.0, 56.0),
        ];
        let spacing = GridFitter::module_size(&anchors, true, ModuleSizeRule::AnchorSpacing);
        assert!((spacing - 144.0 / 14.0).abs() < 1e-4);
        let width = GridFitter::module_size(&anchors, true, ModuleSizeRule::FinderWidth);
        assert_eq!(width, 8.0);
    }

    #[test]
    fn test_module_size_clamped() {
        let tiny = vec![FinderCandidate::new(0.0, 0.0, 7.0)];
        assert_eq!(
            GridFitter::module_size(&tiny, false, ModuleSizeRule::FinderWidth),
            MIN_MODULE_SIZE
        );
        assert_eq!(
            GridFitter::module_size(&[], false, ModuleSizeRule::AnchorSpacing),
            MIN_MODULE_SIZE
        );
    }

    #[test]
    fn test_estimate_version() {
        assert_eq!(GridFitter::estimate_version(21), 1);
        assert_eq!(GridFitter::estimate_version(26), 2);
        assert_eq!(GridFitter::estimate_version(177), 40);
        assert_eq!(GridFitter::estimate_version(500), 40);
        assert_eq!(GridFitter::estimate_version(3), 1);
    }

    #[test]
    fn test_module_count() {
        assert_eq!(GridFitter::module_count(200, 168, 8.0), 21);
        assert_eq!(GridFitter::module_count(2, 2, 4.0), 1);
    }
}
