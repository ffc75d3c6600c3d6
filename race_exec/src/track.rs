//! # Track
//!
//! The closed reference track: an ordered, cyclic sequence of waypoints and the
//! track half-width. Waypoint index arithmetic is modulo the number of
//! waypoints everywhere.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::convert::TryFrom;
use std::f64::consts::TAU;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use util::maths::cyclic_index;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Minimum number of waypoints, one full spline window.
pub const MIN_NUM_WAYPOINTS: usize = 4;

/// Waypoints closer together than this are considered coincident.
const COINCIDENT_DIST_M: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A closed race track.
///
/// Deserialising goes through [`Track::new`], so a loaded track is validated
/// the same way as a constructed one.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(try_from = "RawTrack")]
pub struct Track {
    waypoints_m: Vec<Vector2<f64>>,

    width_m: f64,
}

/// Unvalidated track as read from file, converted with `Track::try_from`.
#[derive(Deserialize, Debug)]
pub struct RawTrack {
    waypoints_m: Vec<Vector2<f64>>,

    width_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("A track needs at least 4 waypoints, found {0}")]
    TooFewWaypoints(usize),

    #[error("Waypoints {0} and {1} coincide")]
    CoincidentWaypoints(usize, usize),

    #[error("Waypoint {0} is not finite")]
    NonFiniteWaypoint(usize),

    #[error("Track width must be positive and finite, found {0}")]
    InvalidWidth(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Track {
    /// Create a new track from the given waypoints.
    ///
    /// Every window of four consecutive waypoints must be pairwise distinct,
    /// since each spline segment is built from such a window.
    pub fn new(waypoints_m: Vec<Vector2<f64>>, width_m: f64) -> Result<Self, TrackError> {
        let n = waypoints_m.len();

        if n < MIN_NUM_WAYPOINTS {
            return Err(TrackError::TooFewWaypoints(n));
        }

        if let Some(i) = waypoints_m
            .iter()
            .position(|w| !(w[0].is_finite() && w[1].is_finite()))
        {
            return Err(TrackError::NonFiniteWaypoint(i));
        }

        if !(width_m.is_finite() && width_m > 0.0) {
            return Err(TrackError::InvalidWidth(width_m));
        }

        for i in 0..n {
            for offset in 1..MIN_NUM_WAYPOINTS {
                let j = cyclic_index(i, offset as isize, n);
                if (waypoints_m[i] - waypoints_m[j]).norm() <= COINCIDENT_DIST_M {
                    return Err(TrackError::CoincidentWaypoints(i, j));
                }
            }
        }

        Ok(Self {
            waypoints_m,
            width_m,
        })
    }

    /// Build an anticlockwise elliptical track with `num_waypoints` waypoints
    /// equally spaced in angle, starting on the +X axis.
    pub fn ellipse(
        centre_m: Vector2<f64>,
        semi_x_m: f64,
        semi_y_m: f64,
        num_waypoints: usize,
        width_m: f64,
    ) -> Result<Self, TrackError> {
        let waypoints = (0..num_waypoints)
            .map(|i| {
                let theta = TAU * i as f64 / num_waypoints as f64;
                centre_m + Vector2::new(semi_x_m * theta.cos(), semi_y_m * theta.sin())
            })
            .collect();

        Self::new(waypoints, width_m)
    }

    /// Build an anticlockwise circular track.
    pub fn circle(
        centre_m: Vector2<f64>,
        radius_m: f64,
        num_waypoints: usize,
        width_m: f64,
    ) -> Result<Self, TrackError> {
        Self::ellipse(centre_m, radius_m, radius_m, num_waypoints, width_m)
    }

    /// Return the same track with waypoint `start` relabelled as waypoint 0.
    pub fn relabelled(&self, start: usize) -> Self {
        let n = self.waypoints_m.len();
        Self {
            waypoints_m: (0..n)
                .map(|i| self.waypoints_m[cyclic_index(start, i as isize, n)])
                .collect(),
            width_m: self.width_m,
        }
    }

    pub fn waypoints(&self) -> &[Vector2<f64>] {
        &self.waypoints_m
    }

    pub fn num_waypoints(&self) -> usize {
        self.waypoints_m.len()
    }

    /// Get the waypoint at the given index, wrapping around the track.
    pub fn waypoint(&self, index: usize) -> Vector2<f64> {
        self.waypoints_m[index % self.waypoints_m.len()]
    }

    /// Get the waypoint `offset` places from `index`, wrapping in either direction.
    pub fn waypoint_offset(&self, index: usize, offset: isize) -> Vector2<f64> {
        self.waypoints_m[cyclic_index(index, offset, self.waypoints_m.len())]
    }

    pub fn width_m(&self) -> f64 {
        self.width_m
    }

    /// Length of the closed waypoint polyline.
    pub fn polyline_length_m(&self) -> f64 {
        (0..self.num_waypoints())
            .map(|i| (self.waypoint_offset(i, 1) - self.waypoints_m[i]).norm())
            .sum()
    }
}

impl TryFrom<RawTrack> for Track {
    type Error = TrackError;

    fn try_from(raw: RawTrack) -> Result<Self, Self::Error> {
        Self::new(raw.waypoints_m, raw.width_m)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn square() -> Vec<Vector2<f64>> {
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(10.0, 10.0),
            Vector2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_track_validation() {
        assert!(Track::new(square(), 1.0).is_ok());

        let mut three = square();
        three.pop();
        assert!(matches!(
            Track::new(three, 1.0),
            Err(TrackError::TooFewWaypoints(3))
        ));

        let mut dup = square();
        dup[2] = dup[1];
        assert!(matches!(
            Track::new(dup, 1.0),
            Err(TrackError::CoincidentWaypoints(1, 2))
        ));

        // Coincident across the wrap within a four point window
        let mut wrap = square();
        wrap[3] = wrap[0];
        assert!(matches!(
            Track::new(wrap, 1.0),
            Err(TrackError::CoincidentWaypoints(0, 3))
        ));

        let mut nan = square();
        nan[1][0] = std::f64::NAN;
        assert!(matches!(
            Track::new(nan, 1.0),
            Err(TrackError::NonFiniteWaypoint(1))
        ));

        assert!(matches!(
            Track::new(square(), 0.0),
            Err(TrackError::InvalidWidth(_))
        ));
    }

    #[test]
    fn test_deserialise_validates() {
        let track: Track = serde_json::from_str(
            r#"{"waypoints_m": [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]], "width_m": 2.0}"#,
        )
        .unwrap();
        assert_eq!(track.num_waypoints(), 4);

        let too_few = serde_json::from_str::<Track>(
            r#"{"waypoints_m": [[0.0, 0.0], [100.0, 0.0]], "width_m": 5.0}"#,
        );
        assert!(too_few.is_err());

        let bad_width = serde_json::from_str::<Track>(
            r#"{"waypoints_m": [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]], "width_m": -5.0}"#,
        );
        assert!(bad_width.is_err());

        // Round trip through the serialised form
        let json = serde_json::to_string(&track).unwrap();
        let back: Track = serde_json::from_str(&json).unwrap();
        assert_eq!(back.waypoints(), track.waypoints());
    }

    #[test]
    fn test_waypoint_wrapping() {
        let track = Track::new(square(), 1.0).unwrap();

        assert_eq!(track.waypoint(5), Vector2::new(10.0, 0.0));
        assert_eq!(track.waypoint_offset(0, -1), Vector2::new(0.0, 10.0));
        assert_eq!(track.waypoint_offset(3, 2), Vector2::new(10.0, 0.0));
        assert_eq!(track.polyline_length_m(), 40.0);
    }

    #[test]
    fn test_relabelled() {
        let track = Track::new(square(), 1.0).unwrap();
        let moved = track.relabelled(2);

        assert_eq!(moved.waypoint(0), track.waypoint(2));
        assert_eq!(moved.waypoint(3), track.waypoint(1));
        assert_eq!(moved.width_m(), track.width_m());
    }

    #[test]
    fn test_circle() {
        let track = Track::circle(Vector2::new(0.0, 0.0), 200.0, 36, 20.0).unwrap();

        assert_eq!(track.num_waypoints(), 36);
        for w in track.waypoints() {
            assert!((w.norm() - 200.0).abs() < 1e-9);
        }
        // Anticlockwise, so the second waypoint is above the first
        assert!(track.waypoint(1)[1] > 0.0);
    }
}
