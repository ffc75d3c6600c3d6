//! # Race library.
//!
//! This library allows other crates in the workspace, the benchmarks and the
//! integration tests to access items defined inside the race crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Localisation types - poses and frame transforms
pub mod loc;

/// Reference path - spline interpolation and sampling of the waypoints
pub mod path;

/// Speed profile and braking-distance speed planning
pub mod speed;

/// Telemetry sinks for per-tick controller data
pub mod telemetry;

/// Track definition - the closed loop of waypoints
pub mod track;

/// Trajectory control module - keeps the car on the racing line
pub mod traj_ctrl;
