//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::path::PathMode;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {

    // ---- PATH ----

    /// How the reference path is built from the waypoints.
    pub path_mode: PathMode,

    /// Spline knot exponent, 0 is uniform, 0.5 centripetal and 1 chordal.
    pub alpha: f64,

    /// Spline segments are sampled until all gaps are shorter than this.
    ///
    /// Units: meters
    pub min_segment_length: f64,

    // ---- SPEED ----

    /// Target cornering speed per meter of turn radius.
    ///
    /// Units: 1/seconds
    pub corner_slow_down: f64,

    /// Achievable braking deceleration.
    ///
    /// Units: meters/second^2
    pub deceleration: f64,

    /// Corners closer than this distance along the path are ignored.
    ///
    /// Units: meters
    pub speed_lookahead: f64,

    /// Number of path samples ahead considered when planning speed.
    pub speed_horizon_samples: usize,

    /// Optional absolute speed limit.
    ///
    /// Units: meters/second
    pub max_speed: Option<f64>,

    /// Where speed planning starts from.
    pub speed_reference: SpeedReference,

    // ---- STEERING ----

    /// Distance from the nearest path point to the pursuit target.
    ///
    /// Units: meters
    pub lookahead: f64,

    /// If true a sample exactly `lookahead` away qualifies as the target,
    /// otherwise the target must be strictly further away.
    pub lookahead_inclusive: bool,

    /// Speed used to turn path curvature into an angular velocity.
    pub ang_vel_reference: AngVelReference,

    /// Multiplier applied to the steering command.
    pub steering_gain: f64,

    /// The steering law and its gains.
    pub steering: SteeringParams,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The point on the path speed planning is measured from.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpeedReference {
    /// Plan from the path point nearest the vehicle.
    NearestPoint,

    /// Plan from the first sample of the next waypoint, measuring the
    /// straight-line distance from the vehicle to it.
    NextWaypoint,
}

/// The speed an angular velocity demand is scaled by.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum AngVelReference {
    /// The vehicle's current speed.
    CurrentSpeed,

    /// The planned speed ceiling, or the current speed while the ceiling is
    /// unbounded.
    PlannedSpeed,

    /// A fixed speed.
    Fixed {
        /// Units: meters/second
        speed: f64,
    },
}

/// Steering law selection.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum SteeringParams {
    /// Pure pursuit towards the lookahead point.
    PurePursuit,

    /// PD control on the heading error to the lookahead point.
    Pid {
        /// Proportional gain
        p: f64,
        /// Derivative gain (per tick)
        d: f64,
    },

    /// Vector pursuit towards the lookahead point.
    VectorPursuit {
        /// Weighting between translation and rotation
        k: f64,
    },

    /// Full lock towards the lookahead point.
    BangBang,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            path_mode: PathMode::Spline,
            alpha: 1.0,
            min_segment_length: 20.0,
            corner_slow_down: 2.0,
            deceleration: 100.0,
            speed_lookahead: 100.0,
            speed_horizon_samples: 100,
            max_speed: None,
            speed_reference: SpeedReference::NearestPoint,
            lookahead: 55.0,
            lookahead_inclusive: false,
            ang_vel_reference: AngVelReference::CurrentSpeed,
            steering_gain: 1.0,
            steering: SteeringParams::PurePursuit,
        }
    }
}

impl Params {
    /// Check the parameters, returning a description of the first problem
    /// found.
    pub fn validate(&self) -> Result<(), String> {
        fn finite(name: &str, value: f64) -> Result<(), String> {
            if value.is_finite() {
                Ok(())
            }
            else {
                Err(format!("{} must be finite, found {}", name, value))
            }
        }

        finite("alpha", self.alpha)?;
        finite("min_segment_length", self.min_segment_length)?;
        finite("corner_slow_down", self.corner_slow_down)?;
        finite("deceleration", self.deceleration)?;
        finite("speed_lookahead", self.speed_lookahead)?;
        finite("lookahead", self.lookahead)?;
        finite("steering_gain", self.steering_gain)?;

        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(format!("alpha must be in [0, 1], found {}", self.alpha));
        }
        if self.min_segment_length <= 0.0 {
            return Err(format!(
                "min_segment_length must be positive, found {}",
                self.min_segment_length
            ));
        }
        if self.corner_slow_down <= 0.0 {
            return Err(format!(
                "corner_slow_down must be positive, found {}",
                self.corner_slow_down
            ));
        }
        if self.deceleration < 0.0 {
            return Err(format!(
                "deceleration must not be negative, found {}",
                self.deceleration
            ));
        }
        if self.speed_horizon_samples == 0 {
            return Err("speed_horizon_samples must be at least 1".into());
        }
        if let Some(max) = self.max_speed {
            if !(max > 0.0) {
                return Err(format!("max_speed must be positive, found {}", max));
            }
        }
        if let AngVelReference::Fixed { speed } = self.ang_vel_reference {
            finite("ang_vel_reference.speed", speed)?;
        }
        match self.steering {
            SteeringParams::Pid { p, d } => {
                finite("steering.p", p)?;
                finite("steering.d", d)?;
            }
            SteeringParams::VectorPursuit { k } => finite("steering.k", k)?,
            SteeringParams::PurePursuit | SteeringParams::BangBang => (),
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert_eq!(Params::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_toml() {
        let params: Params = toml::from_str(
            r#"
            path_mode = "Polyline"
            deceleration = 122.4
            lookahead_inclusive = true

            [ang_vel_reference]
            type = "Fixed"
            speed = 100.0

            [steering]
            type = "Pid"
            p = 4.64
            d = 11.36
            "#,
        )
        .unwrap();

        assert_eq!(params.path_mode, PathMode::Polyline);
        assert_eq!(params.deceleration, 122.4);
        assert!(params.lookahead_inclusive);
        assert_eq!(params.ang_vel_reference, AngVelReference::Fixed { speed: 100.0 });
        assert_eq!(params.steering, SteeringParams::Pid { p: 4.64, d: 11.36 });

        // Unspecified fields keep their defaults
        assert_eq!(params.lookahead, Params::default().lookahead);
        assert_eq!(params.speed_reference, SpeedReference::NearestPoint);
    }

    #[test]
    fn test_validation_failures() {
        let mut p = Params::default();
        p.alpha = 1.5;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.min_segment_length = 0.0;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.speed_horizon_samples = 0;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.deceleration = std::f64::NAN;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.max_speed = Some(-1.0);
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.steering = SteeringParams::VectorPursuit { k: std::f64::INFINITY };
        assert!(p.validate().is_err());
    }
}
