//! Sampling configuration: thresholds that drive partitioning, sampling and
//! relaxation, plus the one-shot preparation-pass thresholds.
//!
//! The derivation formulas and the verify/repair loop below are ported from
//! the original `SampleConfigFactory`, since the distilled spec only names
//! the resulting fields (see spec.md Sec. 6) and not how reasonable defaults
//! are derived from a single support-head diameter.

use crate::geom::scale;

/// One-shot thresholds used while assembling parts from the raw Voronoi
/// Graph, before any sampling happens.
#[derive(Clone, Copy, Debug)]
pub struct PrepareSupportConfig {
    pub discretize_overhang_step: f64,
    pub peninsula_min_width: i64,
    pub peninsula_self_supported_width: i64,
    pub removing_delta: i64,
    pub minimal_bounding_sphere_radius: f64,
}

impl Default for PrepareSupportConfig {
    fn default() -> Self {
        Self {
            discretize_overhang_step: 0.25,
            peninsula_min_width: scale(0.5),
            peninsula_self_supported_width: scale(1.0),
            removing_delta: scale(0.1),
            minimal_bounding_sphere_radius: scale(0.3) as f64,
        }
    }
}

/// Thresholds that drive thin/thick partitioning, sampling, and alignment.
/// All distance fields are in scaled (sub-micron) integer units.
#[derive(Clone, Copy, Debug)]
pub struct SampleConfig {
    pub thin_max_distance: i64,
    pub thick_inner_max_distance: i64,
    pub thick_outline_max_distance: i64,
    pub head_radius: i64,
    pub minimal_distance_from_outline: i64,
    pub maximal_distance_from_outline: i64,
    pub max_length_for_one_support_point: i64,
    pub max_length_for_two_support_points: i64,
    pub max_length_ratio_for_two_support_points: f64,
    pub thin_max_width: i64,
    pub thick_min_width: i64,
    pub min_part_length: i64,
    pub minimal_move: i64,
    pub count_iteration: u32,
    pub max_align_distance: i64,
    pub simplification_tolerance: i64,
}

impl SampleConfig {
    /// Derives a full `SampleConfig` from a single support-head diameter (mm),
    /// the way `SampleConfigFactory::create` does: the head's contact area
    /// is fit to a small set of empirically chosen linear constants, and
    /// every other threshold is scaled off `max_length_for_one_support_point`.
    pub fn for_head_diameter(support_head_diameter_mm: f64) -> Self {
        let head_radius = scale(support_head_diameter_mm / 2.0);
        let head_area = std::f64::consts::PI * (support_head_diameter_mm / 2.0).powi(2);

        let max_length_for_one_support_point = scale(head_area * 2.9 + 1.3);
        let max_length_for_two_support_points =
            (max_length_for_one_support_point as f64 * 3.9) as i64;
        let thin_max_width = (max_length_for_one_support_point as f64 * 2.5) as i64;
        let thick_min_width = (max_length_for_one_support_point as f64 * 2.15) as i64;
        let thin_max_distance = (max_length_for_two_support_points as f64 * 0.8) as i64;
        let thick_inner_max_distance = max_length_for_two_support_points;
        let thick_outline_max_distance =
            (max_length_for_two_support_points as f64 * 0.75) as i64;
        let minimal_distance_from_outline = head_radius;
        let maximal_distance_from_outline = thin_max_distance / 3;
        let min_part_length = thin_max_distance;

        let mut cfg = Self {
            thin_max_distance,
            thick_inner_max_distance,
            thick_outline_max_distance,
            head_radius,
            minimal_distance_from_outline,
            maximal_distance_from_outline,
            max_length_for_one_support_point,
            max_length_for_two_support_points,
            max_length_ratio_for_two_support_points: 0.8,
            thin_max_width,
            thick_min_width,
            min_part_length,
            minimal_move: scale(0.1),
            count_iteration: 30,
            max_align_distance: max_length_for_two_support_points / 2,
            simplification_tolerance: scale(0.01),
        };
        let _ = cfg.verify();
        cfg
    }

    /// Scales the distance-between-supports thresholds by `density`
    /// (clamped to a minimum of 0.1), leaving head/outline-clearance
    /// thresholds untouched. `thick_inner_max_distance` is an area-like
    /// quantity (it bounds a 2D inner region, not a 1D run length) so it
    /// scales with the square root of `1/density` rather than linearly.
    pub fn apply_density(&self, density: f64) -> Self {
        if (density - 1.0).abs() < f32::EPSILON as f64 {
            return *self;
        }
        let density = density.max(0.1);
        let mut result = *self;
        result.thin_max_distance = (self.thin_max_distance as f64 / density) as i64;
        result.thick_inner_max_distance =
            ((self.thick_inner_max_distance as f64).powi(2) / density).sqrt() as i64;
        result.thick_outline_max_distance =
            (self.thick_outline_max_distance as f64 / density) as i64;
        let _ = result.verify();
        result
    }

    /// Repairs internally inconsistent thresholds in place (clamping values
    /// that exceed their bound, swapping inverted min/max pairs, and
    /// nudging equal min/max pairs apart), iterating until stable. Mirrors
    /// `SampleConfigFactory::verify`. Returns `true` if nothing needed
    /// repair.
    pub fn verify(&mut self) -> bool {
        loop {
            let mut ok = true;
            ok &= Self::verify_min_max(
                &mut self.max_length_for_one_support_point,
                &mut self.max_length_for_two_support_points,
            );
            ok &= Self::verify_min_max(&mut self.thick_min_width, &mut self.thin_max_width);
            ok &= Self::verify_max(
                &mut self.max_length_for_one_support_point,
                2 * self.thin_max_distance
                    + 2 * self.head_radius
                    + 2 * self.minimal_distance_from_outline,
            );
            ok &= Self::verify_min(
                &mut self.max_length_for_one_support_point,
                2 * self.head_radius + 2 * self.minimal_distance_from_outline,
            );
            ok &= Self::verify_max(
                &mut self.max_length_for_two_support_points,
                2 * self.thin_max_distance + 4 * self.head_radius + 2 * self.minimal_distance_from_outline,
            );
            ok &= Self::verify_min(
                &mut self.thin_max_width,
                2 * self.head_radius + 2 * self.minimal_distance_from_outline,
            );
            ok &= Self::verify_max(
                &mut self.thin_max_width,
                2 * self.thin_max_distance + 2 * self.head_radius,
            );
            if ok {
                return true;
            }
        }
    }

    fn verify_max(c: &mut i64, max: i64) -> bool {
        if *c > max {
            *c = max;
            false
        } else {
            true
        }
    }

    fn verify_min(c: &mut i64, min: i64) -> bool {
        if *c < min {
            *c = min;
            false
        } else {
            true
        }
    }

    fn verify_min_max(min: &mut i64, max: &mut i64) -> bool {
        if *min > max {
            std::mem::swap(min, max);
            false
        } else if *min == *max {
            *min /= 2;
            false
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_head_diameter_is_internally_consistent() {
        let mut cfg = SampleConfig::for_head_diameter(0.4);
        assert!(cfg.verify());
        assert!(cfg.thick_min_width < cfg.thin_max_width);
        assert!(cfg.max_length_for_one_support_point < cfg.max_length_for_two_support_points);
    }

    #[test]
    fn verify_repairs_inverted_min_max() {
        let mut cfg = SampleConfig::for_head_diameter(0.4);
        std::mem::swap(&mut cfg.thick_min_width, &mut cfg.thin_max_width);
        assert!(cfg.thick_min_width > cfg.thin_max_width);
        cfg.verify();
        assert!(cfg.thick_min_width <= cfg.thin_max_width);
    }

    #[test]
    fn density_scaling_reduces_distance_thresholds() {
        let cfg = SampleConfig::for_head_diameter(0.4);
        let denser = cfg.apply_density(2.0);
        assert!(denser.thin_max_distance < cfg.thin_max_distance);
        assert!(denser.thick_inner_max_distance < cfg.thick_inner_max_distance);
    }
}
