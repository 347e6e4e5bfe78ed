//! Core shared types for `drive_core` (host-agnostic).
// drive_core/types.rs
use std::fmt;

use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::{Isometry, Point, Real, Vector};
use serde::{Deserialize, Serialize};

/// Conversion factor between m/s and km/h.
pub const KMH_PER_MS: Real = 3.6;

/// The model is hard-wired to two axles of two wheels each.
pub const NUMBER_OF_WHEELS: usize = 4;

// ============================================
// Chassis frame
// ============================================
// Body-local axes: +Y up, +Z forward, +X left (right-handed).
// Yaw angles (steer, wheel yaw) are positive when turning right,
// i.e. clockwise seen from above.

#[inline] pub fn local_up() -> Vector<Real> { Vector::y() }
#[inline] pub fn local_down() -> Vector<Real> { -Vector::y() }
#[inline] pub fn local_forward() -> Vector<Real> { Vector::z() }
#[inline] pub fn local_left() -> Vector<Real> { Vector::x() }

/// World up used for ground validation and flight stabilization.
#[inline] pub fn world_up() -> Vector<Real> { Vector::y() }

/// Local rotation of a wheel steered by `yaw` radians (positive = right).
#[inline]
pub fn yaw_rotation(yaw: Real) -> UnitQuaternion<Real> {
    UnitQuaternion::from_axis_angle(&Vector::y_axis(), -yaw)
}

/// Sign that maps 0 to 0 (unlike `f32::signum`, which maps +0.0 to 1.0).
#[inline]
pub fn sign(x: Real) -> Real {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[inline]
pub fn lerp(a: Real, b: Real, t: Real) -> Real {
    a + (b - a) * t
}

/// Normalize or return zero for degenerate vectors.
#[inline]
pub fn normalize_or_zero(v: Vector<Real>) -> Vector<Real> {
    v.try_normalize(1e-6).unwrap_or_else(Vector::zeros)
}

// ============================================
// Wheel identification
// ============================================

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum AxlePosition { Front, Rear }

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum WheelSide { Left, Right }

impl WheelSide {
    pub fn is_left(&self) -> bool {
        matches!(self, WheelSide::Left)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum WheelId { FL, FR, RL, RR }

impl WheelId {
    pub const ALL: [WheelId; NUMBER_OF_WHEELS] = [WheelId::FL, WheelId::FR, WheelId::RL, WheelId::RR];

    pub fn new(axle: AxlePosition, side: WheelSide) -> Self {
        match (axle, side) {
            (AxlePosition::Front, WheelSide::Left) => WheelId::FL,
            (AxlePosition::Front, WheelSide::Right) => WheelId::FR,
            (AxlePosition::Rear, WheelSide::Left) => WheelId::RL,
            (AxlePosition::Rear, WheelSide::Right) => WheelId::RR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WheelId::FL => "FL",
            WheelId::FR => "FR",
            WheelId::RL => "RL",
            WheelId::RR => "RR",
        }
    }

    pub fn is_front(&self) -> bool {
        matches!(self, WheelId::FL | WheelId::FR)
    }

    pub fn side(&self) -> WheelSide {
        match self {
            WheelId::FL | WheelId::RL => WheelSide::Left,
            WheelId::FR | WheelId::RR => WheelSide::Right,
        }
    }
}

impl fmt::Display for WheelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// ----- host services ------------------------
// ============================================

/// A ground trace that hit something.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    pub position: Point<Real>,
    pub normal: Vector<Real>,
    /// Distance from the ray origin (world units).
    pub distance: Real,
}

/// Services the vehicle core needs from the host rigid-body world.
///
/// Implementations must exclude the chassis' own colliders from `cast_ray`.
/// Forces and torques accumulate until the host integrates the step.
pub trait ChassisHost {
    /// Ray from `from` to `to`; `None` when nothing was hit.
    fn cast_ray(&self, from: Point<Real>, to: Point<Real>) -> Option<TraceHit>;

    fn mass(&self) -> Real;
    fn pose(&self) -> Isometry<Real>;
    fn linear_velocity(&self) -> Vector<Real>;
    fn angular_velocity(&self) -> Vector<Real>;
    fn set_angular_velocity(&mut self, angvel: Vector<Real>);

    /// World-space velocity of a point rigidly attached to the chassis.
    fn velocity_at_point(&self, point: &Point<Real>) -> Vector<Real>;

    fn apply_force(&mut self, force: Vector<Real>);
    fn apply_force_at_point(&mut self, force: Vector<Real>, point: Point<Real>);
    fn apply_torque(&mut self, torque: Vector<Real>);

    #[inline]
    fn point_to_world(&self, local: &Point<Real>) -> Point<Real> {
        self.pose() * local
    }

    #[inline]
    fn normal_to_world(&self, local: &Vector<Real>) -> Vector<Real> {
        self.pose().rotation * local
    }

    /// Signed speed along the chassis forward axis (m/s).
    fn forward_speed(&self) -> Real {
        let forward = self.normal_to_world(&local_forward());
        self.linear_velocity().dot(&forward)
    }
}

// ============================================
// ----- driver intent ------------------------
// ============================================

/// Already-resolved player intent for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverIntent {
    pub throttle: Real,  // -1..1
    pub steer: Real,     // -1..1, positive = right
    pub handbrake: bool,
}

impl DriverIntent {
    pub fn clamped(self) -> Self {
        Self {
            throttle: self.throttle.clamp(-1.0, 1.0),
            steer: self.steer.clamp(-1.0, 1.0),
            handbrake: self.handbrake,
        }
    }
}
