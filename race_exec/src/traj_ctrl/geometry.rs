//! Track-derived caches shared by every controller on the same track.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::Serialize;

use super::{Params, TrajCtrlError};
use crate::{path::SampledPath, speed::SpeedProfile, track::Track};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The reference path and speed profile of a track.
///
/// Built once and immutable afterwards, so it can be wrapped in an `Arc` and
/// shared between controllers and threads.
#[derive(Debug, Clone, Serialize)]
pub struct TrackGeometry {
    track: Track,

    path: SampledPath,

    profile: SpeedProfile,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrackGeometry {
    /// Build the path and speed profile for the track.
    pub fn build(track: Track, params: &Params) -> Self {
        let path = SampledPath::from_track(
            &track,
            params.path_mode,
            params.alpha,
            params.min_segment_length,
        );
        let profile = SpeedProfile::from_path(&path, params.corner_slow_down);

        info!(
            "Built {:?} path: {} waypoints ({:.1} m), {} samples ({:.1} m)",
            params.path_mode,
            track.num_waypoints(),
            track.polyline_length_m(),
            path.len(),
            path.length_m()
        );

        Self {
            track,
            path,
            profile,
        }
    }

    /// Assemble geometry from an existing path and profile.
    ///
    /// The path must have one segment per waypoint and the profile one target
    /// speed per sample.
    pub fn from_parts(
        track: Track,
        path: SampledPath,
        profile: SpeedProfile,
    ) -> Result<Self, TrajCtrlError> {
        if path.num_segments() != track.num_waypoints() || profile.len() != path.len() {
            return Err(TrajCtrlError::GeometryMismatch {
                num_waypoints: track.num_waypoints(),
                num_segments: path.num_segments(),
                num_samples: path.len(),
                num_speeds: profile.len(),
            });
        }

        Ok(Self {
            track,
            path,
            profile,
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn path(&self) -> &SampledPath {
        &self.path
    }

    pub fn profile(&self) -> &SpeedProfile {
        &self.profile
    }
}
