use thiserror::Error;

/// Caller-supplied layout options. There are deliberately no defaults here:
/// sizes depend on the renderer's font and unit system.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Height of the label band at the top of every container
    pub header_height: f32,
    /// Gap between a container's border and its children, and between siblings
    pub padding: f32,
    pub leaf_min_width: f32,
    pub leaf_min_height: f32,
    pub leaf_pref_width: f32,
    pub leaf_pref_height: f32,
    /// Lower bound on leaf width / height
    pub leaf_min_aspect_ratio: f32,
    /// Upper bound on leaf width / height
    pub leaf_max_aspect_ratio: f32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("layout option `{field}` must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("leaf aspect ratio range is inverted: min {min} > max {max}")]
    InvertedAspectRange { min: f32, max: f32 },
    #[error("preferred leaf {axis} {pref} is below the minimum {min}")]
    PreferredBelowMinimum {
        axis: &'static str,
        pref: f32,
        min: f32,
    },
}

impl LayoutOptions {
    /// Check every option is positive and the ranges are consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("header_height", self.header_height),
            ("padding", self.padding),
            ("leaf_min_width", self.leaf_min_width),
            ("leaf_min_height", self.leaf_min_height),
            ("leaf_pref_width", self.leaf_pref_width),
            ("leaf_pref_height", self.leaf_pref_height),
            ("leaf_min_aspect_ratio", self.leaf_min_aspect_ratio),
            ("leaf_max_aspect_ratio", self.leaf_max_aspect_ratio),
        ];
        for (field, value) in fields {
            // NaN fails this comparison too
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.leaf_min_aspect_ratio > self.leaf_max_aspect_ratio {
            return Err(ConfigError::InvertedAspectRange {
                min: self.leaf_min_aspect_ratio,
                max: self.leaf_max_aspect_ratio,
            });
        }
        if self.leaf_pref_width < self.leaf_min_width {
            return Err(ConfigError::PreferredBelowMinimum {
                axis: "width",
                pref: self.leaf_pref_width,
                min: self.leaf_min_width,
            });
        }
        if self.leaf_pref_height < self.leaf_min_height {
            return Err(ConfigError::PreferredBelowMinimum {
                axis: "height",
                pref: self.leaf_pref_height,
                min: self.leaf_min_height,
            });
        }
        Ok(())
    }

    /// Smallest rectangle a container can occupy and still show one leaf.
    pub fn min_container_size(&self) -> (f32, f32) {
        (
            self.leaf_min_width + 2.0 * self.padding,
            self.header_height + self.leaf_min_height + 2.0 * self.padding,
        )
    }
}

/// Tuning constants for the packing heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct Heuristics {
    /// Placement score weight on y (fill the top row first)
    pub y_weight: f32,
    /// Placement score weight on x (left before right)
    pub x_weight: f32,
    /// Placement score weight on leftover area (tighter fit)
    pub area_weight: f32,
    /// Edge mismatch absorbed when merging adjacent free rectangles
    pub merge_tolerance: f32,
    /// Maximum merges per pass
    pub merge_iteration_cap: usize,
    /// Vertical gap absorbed when collapsing stacked slivers
    pub aggressive_merge_tolerance: f32,
    /// Fraction of the wider rectangle's width two stacked slivers must share
    pub aggressive_width_overlap: f32,
    /// Free rectangles no taller than this count as slivers
    pub sliver_height: f32,
    /// Split pieces narrower or shorter than this are discarded
    pub min_free_extent: f32,
    /// A container target within this fraction of full width/height snaps to it
    pub snap_fraction: f32,
    /// Cap on leaf width growth relative to the preferred width
    pub leaf_width_expansion: f32,
    /// Cap on leaf height growth relative to the preferred height
    pub leaf_height_expansion: f32,
    /// Sibling count at or below which leaf targets are enlarged
    pub few_siblings: usize,
    pub few_siblings_expansion: f32,
    /// Shrink, as a fraction of the leaf minimum, that triggers space reclamation
    pub reclaim_fraction: f32,
    /// Score penalty per unit of |ln(aspect)| in the adaptive fallback
    pub fallback_aspect_penalty: f32,
    /// Intersection area below which siblings are not considered overlapping
    pub overlap_epsilon: f32,
    /// Nodes narrower or shorter than this render as `None`
    pub min_visible_extent: f32,
    /// Containers at this depth are not descended into
    pub max_depth: u16,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            y_weight: 1000.0,
            x_weight: 10.0,
            area_weight: 0.1,
            merge_tolerance: 3.0,
            merge_iteration_cap: 64,
            aggressive_merge_tolerance: 8.0,
            aggressive_width_overlap: 0.75,
            sliver_height: 12.0,
            min_free_extent: 1.0,
            snap_fraction: 0.2,
            leaf_width_expansion: 1.5,
            leaf_height_expansion: 1.2,
            few_siblings: 3,
            few_siblings_expansion: 1.2,
            reclaim_fraction: 0.8,
            fallback_aspect_penalty: 25.0,
            overlap_epsilon: 0.1,
            min_visible_extent: 2.0,
            max_depth: 64,
        }
    }
}

impl Heuristics {
    /// Position-biased placement score: smaller is better.
    pub fn placement_score(&self, x: f32, y: f32, leftover_area: f32) -> f32 {
        y * self.y_weight + x * self.x_weight + leftover_area * self.area_weight
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn options() -> LayoutOptions {
        LayoutOptions {
            header_height: 20.0,
            padding: 4.0,
            leaf_min_width: 40.0,
            leaf_min_height: 20.0,
            leaf_pref_width: 60.0,
            leaf_pref_height: 30.0,
            leaf_min_aspect_ratio: 0.5,
            leaf_max_aspect_ratio: 4.0,
        }
    }

    #[test]
    fn valid_options_pass() {
        assert_eq!(options().validate(), Ok(()));
    }

    #[test]
    fn rejects_nan_and_zero() {
        let mut opts = options();
        opts.padding = f32::NAN;
        assert!(matches!(
            opts.validate(),
            Err(ConfigError::NotPositive { field: "padding", .. })
        ));

        let mut opts = options();
        opts.header_height = 0.0;
        assert!(matches!(
            opts.validate(),
            Err(ConfigError::NotPositive { field: "header_height", .. })
        ));
    }

    #[test]
    fn rejects_inconsistent_ranges() {
        let mut opts = options();
        opts.leaf_min_aspect_ratio = 5.0;
        assert!(matches!(
            opts.validate(),
            Err(ConfigError::InvertedAspectRange { .. })
        ));

        let mut opts = options();
        opts.leaf_pref_height = 10.0;
        assert!(matches!(
            opts.validate(),
            Err(ConfigError::PreferredBelowMinimum { axis: "height", .. })
        ));
    }

    #[test]
    fn score_prefers_top_then_left() {
        let h = Heuristics::default();
        let top_right = h.placement_score(500.0, 0.0, 10_000.0);
        let lower_left = h.placement_score(0.0, 10.0, 0.0);
        assert!(top_right < lower_left);
        assert!(h.placement_score(0.0, 0.0, 50.0) < h.placement_score(10.0, 0.0, 0.0));
    }
}
