// ==============================================================================
// steering.rs — STEER ANGLE + ACKERMANN GEOMETRY (FRONT AXLE)
// ==============================================================================
// Responsibilities:
// - Integrate driver steer input into the front axle steer angle
//   (rate curve per tick, speed-dependent limit, auto-centering)
// - Derive per-wheel yaw with Ackermann geometry
// - Handbrake coefficients shared with friction and drivetrain
// ------------------------------------------------------------------------------
// Sign convention: positive steer / yaw = turn right (clockwise from above).
// For a positive steer angle the right wheel is the inner wheel:
//
//   R     = axle_separation / tan(steer)
//   left  = atan(axle_separation / (R + track/2))   (outer)
//   right = atan(axle_separation / (R - track/2))   (inner)
//
// Steering curves are read with speed in km/h. While the handbrake is held the
// speed is scaled down by the steering handbrake coefficient, so the car reads
// as slower and gets more lock. The limit lookup applies that scale twice.
// ==============================================================================

use rapier3d::prelude::{Isometry, Real};

use crate::drive_core::axle::AxleConfig;
use crate::drive_core::config::SteeringTuning;
use crate::drive_core::curve::Curve;
use crate::drive_core::types::{lerp, sign, KMH_PER_MS};

/// Inputs below this magnitude count as "no steering" and let the wheel center.
pub const STEER_INPUT_DEADZONE: Real = 0.001;

// ------------------------------------------------------------
// Handbrake coefficients
// ------------------------------------------------------------

/// Quintic smoothstep, `x^3 (x (6x - 15) + 10)`.
#[inline]
pub fn smootherstep(x: Real) -> Real {
    x * x * x * (x * (x * 6.0 - 15.0) + 10.0)
}

/// 0 = released, 1 = fully engaged. Saturates at 1 while the timer is full.
pub fn hand_brake_coefficient(timer: Real, hand_brake_slippery_time: Real) -> Real {
    let x = (timer / hand_brake_slippery_time.max(0.1)).clamp(0.0, 1.0);
    smootherstep(x)
}

/// 1.0 released, 0.4 fully engaged.
pub fn steering_hand_brake_coefficient(hand_brake_k: Real) -> Real {
    (0.4 + (1.0 - hand_brake_k) * 0.6).clamp(0.0, 1.0)
}

/// 1.0 released, 0.8 fully engaged.
pub fn acceleration_hand_brake_coefficient(hand_brake_k: Real) -> Real {
    (0.8 + (1.0 - hand_brake_k) * 0.2).clamp(0.0, 1.0)
}

// ------------------------------------------------------------
// Steer angle
// ------------------------------------------------------------

/// Steer limit (degrees) at an already handbrake-scaled speed.
fn steer_angle_limit_degrees(limit: &impl Curve, speed_kmh: Real, steering_k: Real) -> Real {
    limit.evaluate(speed_kmh * steering_k)
}

/// Next front steer angle in degrees.
///
/// `speed_ms` is the signed forward speed; only its magnitude matters.
pub fn update_steer_angle(
    tuning: &SteeringTuning,
    current_degrees: Real,
    steer_input: Real,
    speed_ms: Real,
    hand_brake_k: Real,
    dt: Real,
) -> Real {
    let speed_kmh = speed_ms.abs() * KMH_PER_MS;

    if steer_input.abs() > STEER_INPUT_DEADZONE {
        let steering_k = steering_hand_brake_coefficient(hand_brake_k);
        let scaled_kmh = speed_kmh * steering_k;

        // degrees per tick at full input
        let rate = tuning.steering_speed.evaluate(scaled_kmh);
        let proposed = current_degrees + steer_input * rate;

        let limit = steer_angle_limit_degrees(&tuning.steer_angle_limit, scaled_kmh, steering_k);
        proposed.abs().min(limit) * sign(proposed)
    } else {
        let reset = tuning.steering_reset_speed.evaluate(speed_kmh);
        let return_per_second = lerp(0.0, reset, (speed_kmh / 2.0).clamp(0.0, 1.0));

        let remaining = (current_degrees.abs() - return_per_second * dt).max(0.0);
        remaining * sign(current_degrees)
    }
}

// ------------------------------------------------------------
// Ackermann
// ------------------------------------------------------------

/// `(left, right)` wheel yaw in radians for a front steer angle in degrees.
pub fn ackermann_yaw(steer_degrees: Real, axle_separation: Real, track_width: Real) -> (Real, Real) {
    if steer_degrees == 0.0 || axle_separation <= 0.0 {
        let yaw = steer_degrees.to_radians();
        return (yaw, yaw);
    }

    let turning_radius = axle_separation / steer_degrees.to_radians().tan();
    let half_track = track_width * 0.5;

    let left = (axle_separation / (turning_radius + half_track)).atan();
    let right = (axle_separation / (turning_radius - half_track)).atan();
    (left, right)
}

/// Write wheel yaws for both axles.
///
/// Axle separation and track width are measured between world-space points so
/// they follow the chassis transform. The rear axle uses its own steer angle
/// with no geometric correction.
pub fn apply_ackermann(front: &mut AxleConfig, rear: &mut AxleConfig, pose: &Isometry<Real>) {
    let rear_yaw = rear.steer_angle_degrees.to_radians();
    rear.wheel_left.steer_yaw = rear_yaw;
    rear.wheel_right.steer_yaw = rear_yaw;

    let axle_separation = (pose * front.local_center() - pose * rear.local_center()).norm();
    let (fl, fr) = front.world_attach_points(pose);
    let track_width = (fl - fr).norm();

    let (left, right) = ackermann_yaw(front.steer_angle_degrees, axle_separation, track_width);
    front.wheel_left.steer_yaw = left;
    front.wheel_right.steer_yaw = right;
}
