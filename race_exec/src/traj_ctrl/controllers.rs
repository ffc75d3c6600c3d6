//! # Steering controllers
//!
//! This module provides the steering laws used by TrajCtrl. Each law turns the
//! lookahead target into a steering (angular velocity) demand and is selected
//! at construction through [`SteeringParams`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;

// Internal
use super::SteeringParams;
use crate::loc::Pose;
use util::maths::normalise_angle;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this speed the velocity vector no longer gives a reliable bearing.
const STATIONARY_SPEED_MS: f64 = 1e-6;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A steering law.
pub trait SteeringStrategy: Send {
    /// Compute the steering demand for this tick.
    fn steer(&mut self, input: &SteeringInput) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Everything a steering law may use.
#[derive(Debug, Copy, Clone)]
pub struct SteeringInput<'a> {
    /// Current vehicle pose
    pub pose: &'a Pose,

    /// Current vehicle velocity in the world frame
    pub velocity_ms: &'a Vector2<f64>,

    /// Pursuit target in the world frame
    pub target_m: &'a Vector2<f64>,

    /// Speed used to scale curvature into angular velocity
    pub reference_speed_ms: f64,
}

/// Pure pursuit: angular velocity is the curvature of the arc through the
/// target multiplied by the reference speed.
#[derive(Debug, Default, Clone)]
pub struct PurePursuit;

/// Proportional-derivative control on the heading error between the direction
/// of travel and the bearing to the target.
#[derive(Debug, Clone)]
pub struct Pid {
    /// Proportional gain
    k_p: f64,

    /// Derivative gain
    k_d: f64,

    /// Error from the previous tick
    prev_error: f64,
}

/// Vector pursuit (screw theory) towards the target, assuming the desired
/// heading at the target equals the vehicle heading.
#[derive(Debug, Clone)]
pub struct VectorPursuit {
    k: f64,
}

/// Full lock towards whichever side the target is on.
#[derive(Debug, Default, Clone)]
pub struct BangBang;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteeringStrategy for PurePursuit {
    fn steer(&mut self, input: &SteeringInput) -> f64 {
        let local = input.pose.to_local(input.target_m);
        pure_pursuit_curvature(&local) * input.reference_speed_ms
    }
}

impl Pid {
    pub fn new(k_p: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_d,
            prev_error: 0.0,
        }
    }

    /// The error used on the previous tick.
    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }
}

impl SteeringStrategy for Pid {
    fn steer(&mut self, input: &SteeringInput) -> f64 {
        let to_target = input.target_m - input.pose.position_m;
        let reference_rad = to_target[1].atan2(to_target[0]);

        // Use the direction of travel, or the heading if stopped
        let measured_rad = if input.velocity_ms.norm() > STATIONARY_SPEED_MS {
            input.velocity_ms[1].atan2(input.velocity_ms[0])
        }
        else {
            input.pose.heading_rad
        };

        let error = normalise_angle(reference_rad - measured_rad);
        let out = self.k_p * error + self.k_d * (error - self.prev_error);

        self.prev_error = error;

        out
    }
}

impl VectorPursuit {
    pub fn new(k: f64) -> Self {
        Self { k }
    }

    /// Turning radius towards the target in the vehicle frame, infinite when
    /// no turn is needed or the geometry is degenerate.
    pub fn turning_radius_m(&self, local: &Vector2<f64>) -> f64 {
        let target_heading_rad = 0.0;
        let x = local[0];
        let y = local[1];
        let d_sq = local.norm_squared();

        if y == 0.0 || d_sq == 0.0 {
            return std::f64::INFINITY;
        }

        let phi_1 = (2.0 * y.powi(2) - d_sq).atan2(2.0 * x * y);
        let phi_2 = d_sq.atan2(2.0 * y);
        let phi = normalise_angle(phi_1 - phi_2);

        let denom = (self.k - 1.0) * phi + target_heading_rad;
        if denom == 0.0 {
            return std::f64::INFINITY;
        }

        let radius_m = (self.k * phi / denom * d_sq / (2.0 * y)).abs();
        if radius_m.is_nan() {
            std::f64::INFINITY
        }
        else {
            radius_m
        }
    }
}

impl SteeringStrategy for VectorPursuit {
    fn steer(&mut self, input: &SteeringInput) -> f64 {
        let local = input.pose.to_local(input.target_m);
        let radius_m = self.turning_radius_m(&local);

        // Radius is unsigned, turn towards the side the target is on
        local[1].signum() * input.reference_speed_ms / radius_m
    }
}

impl SteeringStrategy for BangBang {
    fn steer(&mut self, input: &SteeringInput) -> f64 {
        let local = input.pose.to_local(input.target_m);
        let bearing_rad = local[1].atan2(local[0]);

        if bearing_rad > 0.0 {
            1.0
        }
        else if bearing_rad < 0.0 {
            -1.0
        }
        else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the steering law selected by the parameters.
pub fn from_params(params: &SteeringParams) -> Box<dyn SteeringStrategy> {
    match *params {
        SteeringParams::PurePursuit => Box::new(PurePursuit),
        SteeringParams::Pid { p, d } => Box::new(Pid::new(p, d)),
        SteeringParams::VectorPursuit { k } => Box::new(VectorPursuit::new(k)),
        SteeringParams::BangBang => Box::new(BangBang),
    }
}

/// Curvature of the arc from the vehicle, tangent to its heading, through the
/// target given in the vehicle frame: `2 y / d^2`.
///
/// A target on the vehicle gives zero curvature.
pub fn pure_pursuit_curvature(local: &Vector2<f64>) -> f64 {
    let d_sq = local.norm_squared();

    if d_sq == 0.0 {
        0.0
    }
    else {
        2.0 * local[1] / d_sq
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn input<'a>(
        pose: &'a Pose,
        velocity_ms: &'a Vector2<f64>,
        target_m: &'a Vector2<f64>,
        reference_speed_ms: f64,
    ) -> SteeringInput<'a> {
        SteeringInput {
            pose,
            velocity_ms,
            target_m,
            reference_speed_ms,
        }
    }

    #[test]
    fn test_pure_pursuit_curvature() {
        assert_eq!(pure_pursuit_curvature(&Vector2::new(0.0, 0.0)), 0.0);
        assert_eq!(pure_pursuit_curvature(&Vector2::new(10.0, 0.0)), 0.0);

        // Target on a circle of radius 5 through the origin, centred on +Y
        assert_relative_eq!(pure_pursuit_curvature(&Vector2::new(5.0, 5.0)), 0.2);
        assert_relative_eq!(pure_pursuit_curvature(&Vector2::new(5.0, -5.0)), -0.2);
    }

    #[test]
    fn test_pure_pursuit_steer() {
        let pose = Pose::new(Vector2::new(1.0, 1.0), FRAC_PI_2);
        let vel = Vector2::new(0.0, 10.0);
        // Ahead and to the right of a vehicle facing +Y
        let target = Vector2::new(6.0, 6.0);

        let w = PurePursuit.steer(&input(&pose, &vel, &target, 10.0));
        assert_relative_eq!(w, -2.0, epsilon = 1e-9);

        // Stationary with a current speed reference gives no turn
        let w = PurePursuit.steer(&input(&pose, &vel, &target, 0.0));
        assert_eq!(w, 0.0);
    }

    #[test]
    fn test_pid() {
        let mut pid = Pid::new(2.0, 0.5);
        let pose = Pose::new(Vector2::new(0.0, 0.0), 0.0);
        let vel = Vector2::new(10.0, 0.0);
        let target = Vector2::new(10.0, 10.0);

        // First tick, error pi/4 with zero previous error
        let e = std::f64::consts::FRAC_PI_4;
        let out = pid.steer(&input(&pose, &vel, &target, 0.0));
        assert_relative_eq!(out, 2.0 * e + 0.5 * e, epsilon = 1e-12);
        assert_relative_eq!(pid.prev_error(), e, epsilon = 1e-12);

        // Second tick with the same error has no derivative term
        let out = pid.steer(&input(&pose, &vel, &target, 0.0));
        assert_relative_eq!(out, 2.0 * e, epsilon = 1e-12);

        // Stationary vehicle falls back on its heading
        let mut pid = Pid::new(1.0, 0.0);
        let still = Vector2::new(0.0, 0.0);
        let facing_up = Pose::new(Vector2::new(0.0, 0.0), FRAC_PI_2);
        let out = pid.steer(&input(&facing_up, &still, &target, 0.0));
        assert_relative_eq!(out, -e, epsilon = 1e-12);
    }

    #[test]
    fn test_vector_pursuit() {
        let vp = VectorPursuit::new(2.0);

        assert!(vp.turning_radius_m(&Vector2::new(10.0, 0.0)).is_infinite());
        assert!(vp.turning_radius_m(&Vector2::new(0.0, 0.0)).is_infinite());

        // With zero target heading the radius is k / (k - 1) times the pure
        // pursuit radius.
        let local = Vector2::new(8.0, 4.0);
        let pp_radius = 1.0 / pure_pursuit_curvature(&local);
        assert_relative_eq!(vp.turning_radius_m(&local), 2.0 * pp_radius, epsilon = 1e-9);

        let pose = Pose::default();
        let vel = Vector2::new(5.0, 0.0);
        let left = Vector2::new(8.0, 4.0);
        let right = Vector2::new(8.0, -4.0);
        let mut vp = VectorPursuit::new(2.0);
        assert!(vp.steer(&input(&pose, &vel, &left, 5.0)) > 0.0);
        assert!(vp.steer(&input(&pose, &vel, &right, 5.0)) < 0.0);

        // k = 1 degenerates to no turn rather than a division fault
        let mut unit = VectorPursuit::new(1.0);
        assert_eq!(unit.steer(&input(&pose, &vel, &left, 5.0)), 0.0);
    }

    #[test]
    fn test_bang_bang() {
        let pose = Pose::default();
        let vel = Vector2::new(0.0, 0.0);

        assert_eq!(BangBang.steer(&input(&pose, &vel, &Vector2::new(1.0, 1.0), 0.0)), 1.0);
        assert_eq!(BangBang.steer(&input(&pose, &vel, &Vector2::new(1.0, -1.0), 0.0)), -1.0);
        assert_eq!(BangBang.steer(&input(&pose, &vel, &Vector2::new(1.0, 0.0), 0.0)), 0.0);
    }

    #[test]
    fn test_from_params() {
        let mut law = from_params(&SteeringParams::BangBang);
        let pose = Pose::default();
        let vel = Vector2::new(0.0, 0.0);
        assert_eq!(law.steer(&input(&pose, &vel, &Vector2::new(1.0, 1.0), 0.0)), 1.0);
    }
}
