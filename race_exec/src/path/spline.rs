//! Centripetal Catmull-Rom spline segments.
//!
//! Each segment interpolates between its two middle control points, the outer
//! control points only shape the tangents. Knot spacing is the chord length
//! raised to `alpha`: 0 gives the uniform spline, 0.5 the centripetal and 1
//! the chordal spline.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;

use crate::track::Track;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single spline segment, running from `points[1]` to `points[2]`.
#[derive(Debug, Clone)]
pub struct CatmullRomSpline {
    points: [Vector2<f64>; 4],

    knots: [f64; 4],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CatmullRomSpline {
    /// Create a segment between `p1` and `p2`.
    ///
    /// The four points must be pairwise distinct unless `alpha` is zero,
    /// otherwise the knot spacing collapses.
    pub fn new(
        p0: Vector2<f64>,
        p1: Vector2<f64>,
        p2: Vector2<f64>,
        p3: Vector2<f64>,
        alpha: f64,
    ) -> Self {
        let t0 = 0.0;
        let t1 = next_knot(t0, &p0, &p1, alpha);
        let t2 = next_knot(t1, &p1, &p2, alpha);
        let t3 = next_knot(t2, &p2, &p3, alpha);

        Self {
            points: [p0, p1, p2, p3],
            knots: [t0, t1, t2, t3],
        }
    }

    /// Create the segment running from waypoint `segment` to the following
    /// waypoint of the track.
    pub fn from_track(track: &Track, segment: usize, alpha: f64) -> Self {
        Self::new(
            track.waypoint_offset(segment, -1),
            track.waypoint_offset(segment, 0),
            track.waypoint_offset(segment, 1),
            track.waypoint_offset(segment, 2),
            alpha,
        )
    }

    /// Evaluate the segment at `u` in [0, 1].
    ///
    /// `progress(0)` is exactly the start point and `progress(1)` exactly the
    /// end point.
    pub fn progress(&self, u: f64) -> Vector2<f64> {
        if u <= 0.0 {
            return self.points[1];
        }
        if u >= 1.0 {
            return self.points[2];
        }

        let [p0, p1, p2, p3] = self.points;
        let [t0, t1, t2, t3] = self.knots;

        // Remap into the knot interval of the middle points
        let t = t1 + u * (t2 - t1);

        // Barry and Goldman's pyramidal formulation
        let a1 = blend(&p0, &p1, t0, t1, t);
        let a2 = blend(&p1, &p2, t1, t2, t);
        let a3 = blend(&p2, &p3, t2, t3, t);

        let b1 = blend(&a1, &a2, t0, t2, t);
        let b2 = blend(&a2, &a3, t1, t3, t);

        blend(&b1, &b2, t1, t2, t)
    }

    pub fn start_m(&self) -> Vector2<f64> {
        self.points[1]
    }

    pub fn end_m(&self) -> Vector2<f64> {
        self.points[2]
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn next_knot(t_i: f64, p_i: &Vector2<f64>, p_j: &Vector2<f64>, alpha: f64) -> f64 {
    t_i + (p_j - p_i).norm().powf(alpha)
}

/// Linear interpolation between `a` at knot `t_a` and `b` at knot `t_b`.
fn blend(a: &Vector2<f64>, b: &Vector2<f64>, t_a: f64, t_b: f64, t: f64) -> Vector2<f64> {
    a * ((t_b - t) / (t_b - t_a)) + b * ((t - t_a) / (t_b - t_a))
}
