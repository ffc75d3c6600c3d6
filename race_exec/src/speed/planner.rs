//! Braking-distance speed planner.
//!
//! Walks forward along the path accumulating distance and, for every sample
//! past the dead zone, computes the fastest speed from which the vehicle could
//! still brake down to that sample's target speed. The tightest of these over
//! the horizon is the speed ceiling.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::SpeedProfile;
use crate::path::SampledPath;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Planner tunables.
#[derive(Debug, Copy, Clone)]
pub struct SpeedPlanner {
    /// Braking deceleration the vehicle can achieve.
    ///
    /// Units: meters/second^2
    pub deceleration_mss: f64,

    /// Distance ahead within which corners are ignored.
    ///
    /// Units: meters
    pub speed_lookahead_m: f64,

    /// Number of samples ahead that are considered.
    pub horizon_samples: usize,

    /// Absolute cap on the ceiling, `f64::INFINITY` for none.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,
}

/// The result of planning.
#[derive(Debug, Copy, Clone, Serialize, PartialEq)]
pub struct SpeedConstraint {
    /// The speed the vehicle should not exceed right now.
    ///
    /// Units: meters/second
    pub ceiling_ms: f64,

    /// The sample that set the ceiling, `None` if no sample in the horizon was
    /// tighter than `max_speed_ms`.
    pub corner_index: Option<usize>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SpeedPlanner {
    /// Highest speed from which the vehicle can brake to `target_speed_ms`
    /// within `distance_m`.
    pub fn braking_limit(target_speed_ms: f64, deceleration_mss: f64, distance_m: f64) -> f64 {
        (target_speed_ms.powi(2) + 2.0 * deceleration_mss * distance_m).sqrt()
    }

    /// Plan the speed ceiling.
    ///
    /// The walk begins at `first_index`, which is `first_distance_m` away from
    /// the vehicle along the path, and continues for `horizon_samples` samples
    /// (at most once around the path).
    pub fn plan(
        &self,
        path: &SampledPath,
        profile: &SpeedProfile,
        first_index: usize,
        first_distance_m: f64,
    ) -> SpeedConstraint {
        let mut best = SpeedConstraint {
            ceiling_ms: self.max_speed_ms,
            corner_index: None,
        };

        if path.is_empty() {
            return best;
        }

        let horizon = self.horizon_samples.min(path.len());
        let mut distance_m = first_distance_m;

        for step in 0..horizon {
            let index = path.offset_index(first_index, step as isize);
            if step > 0 {
                distance_m += path.step_length_m(index);
            }

            // Dead zone, too close for braking to matter
            if distance_m < self.speed_lookahead_m {
                continue;
            }

            let limit_ms = Self::braking_limit(
                profile.target_speed_ms(index),
                self.deceleration_mss,
                distance_m,
            );

            if limit_ms < best.ceiling_ms {
                best.ceiling_ms = limit_ms;
                best.corner_index = Some(index);
            }
        }

        best
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    /// A straight line of unit spaced samples with a single slow corner.
    fn line_with_corner(corner: usize, corner_speed_ms: f64) -> (SampledPath, SpeedProfile) {
        let n = 20;
        let path = SampledPath::from_segments(
            (0..n).map(|i| vec![Vector2::new(i as f64, 0.0)]).collect(),
        )
        .unwrap();

        // Start from the collinear profile, then pin the corner
        let mut speeds: Vec<f64> = SpeedProfile::from_path(&path, 1.0).as_slice().to_vec();
        speeds[corner] = corner_speed_ms;

        (path, SpeedProfile::from_target_speeds(speeds))
    }

    fn planner(decel: f64, dead_zone: f64) -> SpeedPlanner {
        SpeedPlanner {
            deceleration_mss: decel,
            speed_lookahead_m: dead_zone,
            horizon_samples: 100,
            max_speed_ms: std::f64::INFINITY,
        }
    }

    #[test]
    fn test_braking_limit() {
        assert_relative_eq!(SpeedPlanner::braking_limit(3.0, 2.0, 4.0), 5.0);
        assert_eq!(SpeedPlanner::braking_limit(7.0, 10.0, 0.0), 7.0);
        assert!(SpeedPlanner::braking_limit(std::f64::INFINITY, 1.0, 1.0).is_infinite());
    }

    #[test]
    fn test_binding_corner() {
        let (path, profile) = line_with_corner(10, 4.0);

        let c = planner(2.0, 0.0).plan(&path, &profile, 1, 1.0);

        // Corner at x = 10 is 10 m from x = 0
        assert_eq!(c.corner_index, Some(10));
        assert_relative_eq!(c.ceiling_ms, (16.0f64 + 40.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_dead_zone_skips_near_corner() {
        let (path, profile) = line_with_corner(3, 1.0);

        let c = planner(2.0, 5.0).plan(&path, &profile, 1, 1.0);
        assert_eq!(c.corner_index, None);
        assert!(c.ceiling_ms.is_infinite());
    }

    #[test]
    fn test_horizon_limits_search() {
        let (path, profile) = line_with_corner(15, 1.0);

        let mut short = planner(2.0, 0.0);
        short.horizon_samples = 5;
        assert_eq!(short.plan(&path, &profile, 1, 1.0).corner_index, None);

        let long = planner(2.0, 0.0);
        assert_eq!(long.plan(&path, &profile, 1, 1.0).corner_index, Some(15));
    }

    #[test]
    fn test_max_speed_cap() {
        let (path, profile) = line_with_corner(10, 40.0);

        let mut capped = planner(2.0, 0.0);
        capped.max_speed_ms = 30.0;

        let c = capped.plan(&path, &profile, 1, 1.0);
        assert_eq!(c.ceiling_ms, 30.0);
        assert_eq!(c.corner_index, None);
    }

    #[test]
    fn test_less_braking_lowers_ceiling() {
        let (path, profile) = line_with_corner(12, 3.0);

        let mut prev = std::f64::INFINITY;
        for &decel in [200.0, 50.0, 10.0, 1.0, 0.0].iter() {
            let c = planner(decel, 0.0).plan(&path, &profile, 1, 1.0);
            assert!(c.ceiling_ms <= prev);
            prev = c.ceiling_ms;
        }
        assert_relative_eq!(prev, 3.0);
    }
}
