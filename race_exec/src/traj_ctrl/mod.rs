//! # Trajectory control module
//!
//! Trajectory control keeps the vehicle on the racing line and at a speed it
//! can hold through the corners ahead.
//!
//! When the track is supplied the waypoints are turned into a dense reference
//! path (see [`crate::path`]) and every sample is given a target cornering
//! speed from the local turn radius (see [`crate::speed`]). Then, every tick:
//!
//!  1. The vehicle is located on the path by searching the samples of the
//!     segment leading to the next waypoint for the nearest one.
//!  1. The pursuit target is the first sample further ahead than the
//!     lookahead distance from that nearest sample.
//!  1. The steering law turns the target, seen from the vehicle, into an
//!     angular velocity demand.
//!  1. The speed planner looks over the samples ahead for the corner that
//!     most limits the current speed given the available braking, and the
//!     throttle is full on below that ceiling and full brake above it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod geometry;
pub mod locator;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::{SteeringInput, SteeringStrategy};
pub use geometry::TrackGeometry;
pub use params::*;
pub use state::*;
