//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;

use log::{debug, trace};
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::{
    controllers::{self, pure_pursuit_curvature},
    locator, AngVelReference, Params, SpeedReference, SteeringInput, SteeringStrategy,
    TrackGeometry,
};
use crate::{
    loc::Pose,
    speed::SpeedPlanner,
    telemetry::{NullSink, TelemetryFrame, TelemetrySink},
    track::Track,
};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory controller for a single vehicle.
pub struct TrajCtrl {
    params: Params,

    /// Path and speed profile, possibly shared with other controllers
    geometry: Arc<TrackGeometry>,

    planner: SpeedPlanner,

    /// The selected steering law, which may carry state between ticks
    steering: Box<dyn SteeringStrategy>,

    telemetry: Box<dyn TelemetrySink>,

    /// Number of completed ticks
    tick: u64,
}

/// Data needed to initialise TrajCtrl.
pub struct InitData {
    /// Parameter file path relative to the software root's `params` dir
    pub params_path: String,

    pub track: Track,
}

/// Input to a single tick.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct TickInput {
    /// Index of the waypoint the vehicle is heading towards
    pub next_waypoint: usize,

    pub pose: Pose,

    /// Units: meters/second
    pub velocity_ms: Vector2<f64>,
}

/// The control command for one tick.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq)]
pub struct Command {
    /// Either -1 (full brake) or +1 (full throttle)
    pub throttle: f64,

    /// Angular velocity demand
    ///
    /// Units: radians/second
    pub steering: f64,
}

/// Monitoring quantities from a tick.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Path sample nearest the vehicle
    pub nearest_index: usize,
    pub nearest_m: Vector2<f64>,

    /// Pursuit target
    pub lookahead_index: usize,
    pub lookahead_m: Vector2<f64>,

    /// The sample that limited the speed ceiling, if any
    pub corner_index: Option<usize>,
    pub corner_m: Option<Vector2<f64>>,

    /// Units: meters/second
    pub speed_ms: f64,

    /// Units: meters/second
    pub speed_ceiling_ms: f64,

    /// Pure pursuit curvature to the target
    ///
    /// Units: 1/meters
    pub curvature_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during trajectory control.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error(
        "Geometry mismatch: {num_waypoints} waypoints, {num_segments} segments, \
         {num_samples} samples and {num_speeds} target speeds"
    )]
    GeometryMismatch {
        num_waypoints: usize,
        num_segments: usize,
        num_samples: usize,
        num_speeds: usize,
    },

    #[error("Waypoint index {index} is out of range for a track of {num_waypoints} waypoints")]
    InvalidWaypointIndex { index: usize, num_waypoints: usize },

    /// No point on the path is far enough from the nearest point, the
    /// lookahead is larger than the track.
    #[error("No path point is more than {lookahead_m} m from point {nearest_index}")]
    LookaheadNotFound { lookahead_m: f64, nearest_index: usize },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TrajCtrl {
    type InitData = InitData;
    type InitError = TrajCtrlError;

    type InputData = TickInput;
    type OutputData = Command;
    type StatusReport = StatusReport;
    type ProcError = TrajCtrlError;

    /// Initialise the TrajCtrl module.
    ///
    /// The parameters are loaded from file and the reference path and speed
    /// profile are saved into the session.
    fn init(init_data: Self::InitData, session: &Session) -> Result<Self, Self::InitError> {
        let params: Params = params::load(&init_data.params_path)?;

        let ctrl = Self::new(init_data.track, params)?;

        session.save("traj_ctrl/sampled_path.json", ctrl.geometry.path().clone());
        session.save("traj_ctrl/speed_profile.json", ctrl.geometry.profile().clone());

        Ok(ctrl)
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.compute_command(
            input_data.next_waypoint,
            &input_data.pose,
            &input_data.velocity_ms,
        )
    }
}

impl TrajCtrl {
    /// Create a controller for the given track, building its geometry.
    pub fn new(track: Track, params: Params) -> Result<Self, TrajCtrlError> {
        params.validate().map_err(TrajCtrlError::InvalidParams)?;

        let geometry = Arc::new(TrackGeometry::build(track, &params));

        Self::with_geometry(geometry, params)
    }

    /// Create a controller using already built geometry.
    ///
    /// Only the steering, speed and lookahead parameters are used, the path
    /// parameters are assumed to match those the geometry was built with.
    pub fn with_geometry(geometry: Arc<TrackGeometry>, params: Params) -> Result<Self, TrajCtrlError> {
        params.validate().map_err(TrajCtrlError::InvalidParams)?;

        let planner = SpeedPlanner {
            deceleration_mss: params.deceleration,
            speed_lookahead_m: params.speed_lookahead,
            horizon_samples: params.speed_horizon_samples,
            max_speed_ms: params.max_speed.unwrap_or(std::f64::INFINITY),
        };

        let steering = controllers::from_params(&params.steering);

        debug!(
            "TrajCtrl using {:?} steering with a {} m lookahead",
            params.steering, params.lookahead
        );

        Ok(Self {
            params,
            geometry,
            planner,
            steering,
            telemetry: Box::new(NullSink),
            tick: 0,
        })
    }

    /// Publish a telemetry frame to `sink` on every tick.
    pub fn with_telemetry(mut self, sink: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = sink;
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn geometry(&self) -> &Arc<TrackGeometry> {
        &self.geometry
    }

    /// Number of ticks processed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Compute the control command for the current vehicle state.
    ///
    /// Processing involves:
    ///  1. Finding the path sample nearest the vehicle within the segment
    ///     leading to `next_waypoint`.
    ///  1. Finding the pursuit target `lookahead` ahead of that sample.
    ///  1. Planning the speed ceiling and choosing the throttle.
    ///  1. Running the steering law.
    pub fn compute_command(
        &mut self,
        next_waypoint: usize,
        pose: &Pose,
        velocity_ms: &Vector2<f64>,
    ) -> Result<(Command, StatusReport), TrajCtrlError> {
        let num_waypoints = self.geometry.track().num_waypoints();
        if next_waypoint >= num_waypoints {
            return Err(TrajCtrlError::InvalidWaypointIndex {
                index: next_waypoint,
                num_waypoints,
            });
        }

        let path = self.geometry.path();
        let profile = self.geometry.profile();

        // Locate the vehicle and the target
        let nearest_index = locator::nearest_point(path, next_waypoint, &pose.position_m);
        let lookahead_index = locator::find_lookahead(
            path,
            nearest_index,
            self.params.lookahead,
            self.params.lookahead_inclusive,
        )
        .ok_or(TrajCtrlError::LookaheadNotFound {
            lookahead_m: self.params.lookahead,
            nearest_index,
        })?;

        let target_m = path.point(lookahead_index);
        let curvature_m = pure_pursuit_curvature(&pose.to_local(&target_m));

        // Speed planning
        let (first_index, first_distance_m) = match self.params.speed_reference {
            SpeedReference::NearestPoint => {
                let first = path.next_index(nearest_index);
                (first, path.step_length_m(first))
            }
            SpeedReference::NextWaypoint => {
                let first = path.segment_start(next_waypoint);
                (first, (path.point(first) - pose.position_m).norm())
            }
        };
        let constraint = self.planner.plan(path, profile, first_index, first_distance_m);

        let speed_ms = velocity_ms.norm();
        let throttle = if speed_ms > constraint.ceiling_ms {
            -1.0
        }
        else {
            1.0
        };

        // Steering
        let reference_speed_ms = match self.params.ang_vel_reference {
            AngVelReference::CurrentSpeed => speed_ms,
            AngVelReference::PlannedSpeed if constraint.ceiling_ms.is_finite() => {
                constraint.ceiling_ms
            }
            AngVelReference::PlannedSpeed => speed_ms,
            AngVelReference::Fixed { speed } => speed,
        };

        let steering = self.params.steering_gain
            * self.steering.steer(&SteeringInput {
                pose,
                velocity_ms,
                target_m: &target_m,
                reference_speed_ms,
            });

        let command = Command {
            throttle,
            steering: if steering.is_finite() { steering } else { 0.0 },
        };

        let report = StatusReport {
            nearest_index,
            nearest_m: path.point(nearest_index),
            lookahead_index,
            lookahead_m: target_m,
            corner_index: constraint.corner_index,
            corner_m: constraint.corner_index.map(|i| path.point(i)),
            speed_ms,
            speed_ceiling_ms: constraint.ceiling_ms,
            curvature_m,
        };

        trace!(
            "TrajCtrl tick {}: nearest {}, target {}, v {:.2}/{:.2} m/s, cmd {:?}",
            self.tick,
            nearest_index,
            lookahead_index,
            speed_ms,
            constraint.ceiling_ms,
            command
        );

        let input = TickInput {
            next_waypoint,
            pose: *pose,
            velocity_ms: *velocity_ms,
        };
        self.telemetry
            .publish(&TelemetryFrame::new(self.tick, &input, &command, &report));
        self.tick += 1;

        Ok((command, report))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn circle_ctrl(params: Params) -> TrajCtrl {
        let track = Track::circle(Vector2::zeros(), 200.0, 36, 20.0).unwrap();
        TrajCtrl::new(track, params).unwrap()
    }

    /// Pose on the circle at waypoint `i`, facing along the direction of travel.
    fn pose_at(i: usize) -> Pose {
        let theta = i as f64 * std::f64::consts::TAU / 36.0;
        Pose::new(
            Vector2::new(200.0 * theta.cos(), 200.0 * theta.sin()),
            theta + std::f64::consts::FRAC_PI_2,
        )
    }

    #[test]
    fn test_out_of_range_waypoint() {
        let mut ctrl = circle_ctrl(Params::default());

        match ctrl.compute_command(36, &pose_at(0), &Vector2::zeros()) {
            Err(TrajCtrlError::InvalidWaypointIndex {
                index: 36,
                num_waypoints: 36,
            }) => (),
            r => panic!("Unexpected result {:?}", r.map(|(c, _)| c)),
        }
    }

    #[test]
    fn test_invalid_params() {
        let track = Track::circle(Vector2::zeros(), 200.0, 36, 20.0).unwrap();
        let params = Params {
            deceleration: -1.0,
            ..Params::default()
        };

        assert!(matches!(
            TrajCtrl::new(track, params),
            Err(TrajCtrlError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_turns_left_on_anticlockwise_circle() {
        let mut ctrl = circle_ctrl(Params::default());

        let (cmd, report) = ctrl
            .compute_command(1, &pose_at(0), &Vector2::new(0.0, 10.0))
            .unwrap();

        assert!(report.curvature_m > 0.0);
        assert!(cmd.steering > 0.0);
        assert_eq!(cmd.throttle, 1.0);
        assert_eq!(ctrl.tick(), 1);
    }

    #[test]
    fn test_brakes_above_ceiling() {
        let mut ctrl = circle_ctrl(Params::default());

        let (cmd, report) = ctrl
            .compute_command(1, &pose_at(0), &Vector2::new(0.0, 10_000.0))
            .unwrap();

        assert!(report.speed_ceiling_ms < 10_000.0);
        assert_eq!(cmd.throttle, -1.0);
    }

    #[test]
    fn test_fixed_reference_speed() {
        let mut ctrl = circle_ctrl(Params {
            ang_vel_reference: AngVelReference::Fixed { speed: 10.0 },
            steering_gain: 2.0,
            ..Params::default()
        });

        let (cmd, report) = ctrl
            .compute_command(1, &pose_at(0), &Vector2::zeros())
            .unwrap();

        assert_relative_eq!(cmd.steering, 20.0 * report.curvature_m, epsilon = 1e-12);
    }

    #[test]
    fn test_lookahead_not_found() {
        let mut ctrl = circle_ctrl(Params {
            lookahead: 1000.0,
            ..Params::default()
        });

        assert!(matches!(
            ctrl.compute_command(1, &pose_at(0), &Vector2::zeros()),
            Err(TrajCtrlError::LookaheadNotFound { .. })
        ));
        assert_eq!(ctrl.tick(), 0);
    }
}
