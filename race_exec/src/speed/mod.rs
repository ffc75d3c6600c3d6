//! # Speed module
//!
//! Cornering speed limits along the reference path, and the braking-distance
//! planner that turns them into an instantaneous speed ceiling.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod planner;
pub mod profile;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use planner::*;
pub use profile::*;
