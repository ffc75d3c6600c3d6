//! Curvature-limited target speeds.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;

use util::maths::cyclic_index;

use crate::path::SampledPath;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Triangles with an area at or below this are treated as straight lines.
pub const COLLINEAR_AREA_M2: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Target cornering speed for every sample of a closed point sequence.
///
/// A target of `f64::INFINITY` means the sample is on a straight and places
/// no limit on speed.
#[derive(Debug, Clone, Serialize)]
pub struct SpeedProfile {
    target_speeds_ms: Vec<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SpeedProfile {
    /// Build the profile for a closed sequence of points, using each point and
    /// its two neighbours to estimate the local turn radius.
    pub fn from_points(points_m: &[Vector2<f64>], corner_slow_down: f64) -> Self {
        let n = points_m.len();

        let target_speeds_ms = (0..n)
            .map(|i| {
                let radius_m = circumradius(
                    &points_m[cyclic_index(i, -1, n)],
                    &points_m[i],
                    &points_m[cyclic_index(i, 1, n)],
                );
                target_speed(radius_m, corner_slow_down)
            })
            .collect();

        Self { target_speeds_ms }
    }

    /// Use externally computed target speeds, one per sample.
    pub fn from_target_speeds(target_speeds_ms: Vec<f64>) -> Self {
        Self { target_speeds_ms }
    }

    /// Build the profile for every sample of the path.
    pub fn from_path(path: &SampledPath, corner_slow_down: f64) -> Self {
        Self::from_points(path.points(), corner_slow_down)
    }

    pub fn len(&self) -> usize {
        self.target_speeds_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target_speeds_ms.is_empty()
    }

    /// Target speed at the sample, wrapping around the path.
    pub fn target_speed_ms(&self, index: usize) -> f64 {
        self.target_speeds_ms[index % self.target_speeds_ms.len()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.target_speeds_ms
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Radius of the circle passing through the three points.
///
/// Collinear or coincident points give `f64::INFINITY`.
pub fn circumradius(p0: &Vector2<f64>, p1: &Vector2<f64>, p2: &Vector2<f64>) -> f64 {
    let a = (p2 - p1).norm();
    let b = (p0 - p2).norm();
    let c = (p0 - p1).norm();

    let area = 0.5 * ((p1 - p0).perp(&(p2 - p0))).abs();

    if area <= COLLINEAR_AREA_M2 {
        return std::f64::INFINITY;
    }

    a * b * c / (4.0 * area)
}

/// Maximum cornering speed for a turn of the given radius.
pub fn target_speed(radius_m: f64, corner_slow_down: f64) -> f64 {
    if radius_m.is_infinite() {
        std::f64::INFINITY
    }
    else {
        corner_slow_down * radius_m
    }
}
