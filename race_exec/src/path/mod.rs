//! # Path
//!
//! This module defines the reference path followed by the controller. The path
//! is built once from the track waypoints, either by interpolating each
//! waypoint segment with a centripetal Catmull-Rom spline and sampling it
//! densely, or by using the waypoints directly as a polyline.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod sampled;
pub mod spline;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use sampled::*;
pub use spline::CatmullRomSpline;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the reference path is built from the track waypoints.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathMode {
    /// Interpolate each waypoint segment with a spline and sample it.
    Spline,

    /// Use the waypoints themselves, one sample per segment.
    Polyline,
}

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Attempted to create a path with no segments")]
    NoSegments,

    #[error("Segment {0} of the path has no samples")]
    EmptySegment(usize),
}

impl Default for PathMode {
    fn default() -> Self {
        PathMode::Spline
    }
}
