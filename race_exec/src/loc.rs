//! # Localisation types
//!
//! The pose of the vehicle in the world (track) frame. The vehicle body frame
//! has +X pointing forward and +Y pointing to the left of the vehicle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::ops::Mul;

use nalgebra::{Isometry2, Point2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and heading in the world frame) of the vehicle.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Pose {
    /// The position in the world frame
    pub position_m: Vector2<f64>,

    /// The heading of the vehicle, the angle between the world +X axis and the
    /// vehicle's forward axis, positive anticlockwise.
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(position_m: Vector2<f64>, heading_rad: f64) -> Self {
        Self {
            position_m,
            heading_rad,
        }
    }

    /// The rigid transform taking vehicle-frame points into the world frame.
    pub fn isometry(&self) -> Isometry2<f64> {
        Isometry2::new(self.position_m, self.heading_rad)
    }

    /// Return the inverse pose, i.e. the world frame expressed in the vehicle
    /// frame.
    pub fn inverse(&self) -> Self {
        let inv = self.isometry().inverse();
        Self {
            position_m: inv.translation.vector,
            heading_rad: inv.rotation.angle(),
        }
    }

    /// Transform a vehicle-frame point into the world frame.
    pub fn transform_point(&self, point_m: &Vector2<f64>) -> Vector2<f64> {
        (self.isometry() * Point2::from(*point_m)).coords
    }

    /// Express a world-frame point in the vehicle frame.
    ///
    /// Equivalent to `pose.inverse() * point_m`.
    pub fn to_local(&self, point_m: &Vector2<f64>) -> Vector2<f64> {
        self.isometry()
            .inverse_transform_point(&Point2::from(*point_m))
            .coords
    }

    /// Unit vector pointing along the vehicle's forward axis in the world frame.
    pub fn forward(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }
}

impl Mul<Vector2<f64>> for Pose {
    type Output = Vector2<f64>;

    fn mul(self, rhs: Vector2<f64>) -> Self::Output {
        self.transform_point(&rhs)
    }
}
